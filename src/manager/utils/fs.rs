//! File system utilities for the install pipeline.
//!
//! Provides idempotent directory creation/removal, merge-copying of trees
//! with symlink preservation, and atomic file writes that keep symlinked
//! targets in place.

use crate::manager::error::{Error, ErrorExt, Result};
use std::{io, path::Path};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }

    // create_dir_all is already idempotent - succeeds even if dir exists
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(Error::Fs {
            context: "removing directory",
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Removes a file if it exists.
pub async fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Fs {
            context: "removing file",
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Recursively copies a directory into `to`, merging with whatever is already there.
///
/// Existing files at the same relative path are overwritten; unrelated
/// existing files are left alone. Symlinks are recreated rather than followed.
pub async fn merge_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::NotFound {
            what: "directory".into(),
            path: from.to_path_buf(),
        });
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&to).fs_context("creating destination directory", &to)?;

        for entry in walkdir::WalkDir::new(&from).follow_links(false) {
            let entry = entry?;
            let rel_path = entry.path().strip_prefix(&from)?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())
                    .fs_context("reading symlink", entry.path())?;
                // A stale link or file at the destination would make symlink() fail
                if std::fs::symlink_metadata(&dest_path).is_ok() {
                    if dest_path.is_dir() && !dest_path.is_symlink() {
                        std::fs::remove_dir_all(&dest_path)
                            .fs_context("replacing directory with symlink", &dest_path)?;
                    } else {
                        std::fs::remove_file(&dest_path)
                            .fs_context("replacing existing symlink", &dest_path)?;
                    }
                }
                let linked = if entry.path().is_dir() {
                    symlink_dir(&target, &dest_path)
                } else {
                    symlink_file(&target, &dest_path)
                };
                linked.fs_context("creating symlink", &dest_path)?;
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
            } else {
                std::fs::copy(entry.path(), &dest_path).fs_context("copying file", entry.path())?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("Directory copy task panicked: {}", e)))?
}

/// Writes `contents` to `path` via a uniquely named sibling temp file and rename.
///
/// Readers never observe a partially written file. When `path` is a
/// symlink the file it points at is replaced and the link stays in place;
/// an existing file's permissions carry over to the new content.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let target = match fs::canonicalize(path).await {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(e).fs_context("resolving write target", path),
    };

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .await
            .fs_context("creating parent directory", parent)?;
    }

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = target.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4().simple()));

    let result = async {
        fs::write(&temp_path, contents)
            .await
            .fs_context("writing temp file", &temp_path)?;
        if let Ok(metadata) = fs::metadata(&target).await {
            fs::set_permissions(&temp_path, metadata.permissions())
                .await
                .fs_context("copying permissions to temp file", &temp_path)?;
        }
        fs::rename(&temp_path, &target)
            .await
            .fs_context("renaming temp file into place", &target)
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&temp_path).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_dir_all_erase_removes_stale_content() {
        let temp = TempDir::new().expect("temp dir");
        let dir = temp.path().join("build");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale.o"), b"old").unwrap();

        create_dir_all(&dir, true).await.expect("recreate");

        assert!(dir.is_dir());
        assert!(!dir.join("stale.o").exists());
    }

    #[tokio::test]
    async fn test_merge_dir_overwrites_and_keeps_unrelated() {
        let temp = TempDir::new().expect("temp dir");
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        std::fs::create_dir_all(src.join("bin")).unwrap();
        std::fs::create_dir_all(dst.join("bin")).unwrap();
        std::fs::write(src.join("bin/tool"), b"new").unwrap();
        std::fs::write(dst.join("bin/tool"), b"old").unwrap();
        std::fs::write(dst.join("bin/other"), b"keep").unwrap();

        merge_dir(&src, &dst).await.expect("merge");

        assert_eq!(std::fs::read(dst.join("bin/tool")).unwrap(), b"new");
        assert_eq!(std::fs::read(dst.join("bin/other")).unwrap(), b"keep");
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_content() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("nested/record.json");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("record.json")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_atomic_follows_symlink_and_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("temp dir");
        let real = temp.path().join("dotfiles/bashrc");
        std::fs::create_dir_all(real.parent().unwrap()).unwrap();
        std::fs::write(&real, b"old\n").unwrap();
        std::fs::set_permissions(&real, std::fs::Permissions::from_mode(0o600)).unwrap();
        let link = temp.path().join(".bashrc");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        write_atomic(&link, b"new\n").await.unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read(&real).unwrap(), b"new\n");
        let mode = std::fs::metadata(&real).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
