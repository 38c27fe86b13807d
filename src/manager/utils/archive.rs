//! Gzip tar packing and unpacking.

use crate::manager::error::{Error, ErrorExt, Result};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tar::HeaderMode;
use walkdir::WalkDir;

/// Packs the contents of `src_dir` into a gzip tar at `dest`.
///
/// Entries are relative to `src_dir` and visited in sorted order with
/// deterministic headers, so identical trees give identical archives.
/// Symlinks are stored as links, not followed.
pub async fn pack_dir(src_dir: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating archive directory", parent)?;
    }

    let tar_gz = tokio::fs::File::create(dest)
        .await
        .fs_context("creating tar.gz file", dest)?;
    let std_file = tar_gz.into_std().await;
    let src_dir = src_dir.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let enc = GzEncoder::new(std_file, Compression::default());
        let mut tar = tar::Builder::new(enc);
        tar.follow_symlinks(false);

        for entry in WalkDir::new(&src_dir).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();

            if path == src_dir {
                continue;
            }

            let rel_path = path.strip_prefix(&src_dir)?;
            let metadata = std::fs::symlink_metadata(path)?;

            let mut header = tar::Header::new_gnu();
            header.set_metadata_in_mode(&metadata, HeaderMode::Deterministic);

            if entry.path_is_symlink() {
                let target = std::fs::read_link(path)?;
                header.set_size(0);
                tar.append_link(&mut header, rel_path, &target)?;
            } else if entry.file_type().is_dir() {
                tar.append_data(&mut header, rel_path, &mut io::empty())?;
            } else {
                let mut file = std::fs::File::open(path)?;
                tar.append_data(&mut header, rel_path, &mut file)?;
            }
        }

        let enc = tar.into_inner()?;
        let mut finished = enc.finish()?;
        finished.flush()?;
        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("Join error: {}", e)))?
}

/// Unpacks the gzip tar at `archive` into `dest_dir`.
///
/// Entries whose paths would land outside `dest_dir` are rejected.
pub async fn unpack_tar_gz(archive: &Path, dest_dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dest_dir)
        .await
        .fs_context("creating extraction directory", dest_dir)?;

    let file = std::fs::File::open(archive).fs_context("opening archive", archive)?;
    let archive_path = archive.to_path_buf();
    let dest_dir = dest_dir.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive.set_preserve_permissions(true);

        for entry in archive.entries()? {
            let mut entry = entry?;
            let entry_path = entry.path()?.into_owned();

            if !entry.unpack_in(&dest_dir)? {
                return Err(Error::GenericError(format!(
                    "archive {} contains entry escaping the destination: {}",
                    archive_path.display(),
                    entry_path.display()
                )));
            }
        }
        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("Join error: {}", e)))?
}

/// Returns the only child of `dir` when it is a directory and has no siblings.
///
/// Release tarballs usually wrap everything in `<name>-<version>/`; callers
/// use this to descend into that wrapper.
pub fn single_subdir(dir: &Path) -> Result<Option<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)
        .fs_context("reading directory", dir)?
        .collect::<io::Result<Vec<_>>>()
        .fs_context("reading directory entry", dir)?;

    if entries.len() != 1 {
        return Ok(None);
    }
    let only = entries.remove(0).path();
    Ok(only.is_dir().then_some(only))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_pack_is_deterministic() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        std::fs::create_dir_all(src.join("lib")).unwrap();
        std::fs::write(src.join("Makefile"), "all:\n").unwrap();
        std::fs::write(src.join("lib/util.c"), "int x;\n").unwrap();

        let first = temp.path().join("a.tar.gz");
        let second = temp.path().join("b.tar.gz");
        pack_dir(&src, &first).await.unwrap();
        pack_dir(&src, &second).await.unwrap();

        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_survive_as_links() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("real.txt"), "data").unwrap();
        std::os::unix::fs::symlink("real.txt", src.join("link.txt")).unwrap();

        let archive = temp.path().join("out.tar.gz");
        pack_dir(&src, &archive).await.unwrap();
        let out = temp.path().join("out");
        unpack_tar_gz(&archive, &out).await.unwrap();

        let link = out.join("link.txt");
        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_link(&link).unwrap(), PathBuf::from("real.txt"));
    }

    #[test]
    fn test_single_subdir() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("foo-1.0")).unwrap();
        assert_eq!(
            single_subdir(temp.path()).unwrap(),
            Some(temp.path().join("foo-1.0"))
        );

        std::fs::write(temp.path().join("foo_1.0.dsc"), "").unwrap();
        assert_eq!(single_subdir(temp.path()).unwrap(), None);
    }
}
