//! Source normalization into a single archive.
//!
//! Whatever shape the acquired source has, it is packed into
//! `bundles/<name>.tar.gz` and re-extracted into a clean `build/<name>`
//! directory. Builders only ever see the re-extracted tree.

use crate::manager::{
    error::{Error, Result},
    utils::{archive, checksum, fs},
    workspace::Workspace,
};
use std::path::{Path, PathBuf};

/// Normalized on-disk source for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBundle {
    /// Archive at `bundles/<name>.tar.gz`
    pub archive_path: PathBuf,
    /// Fresh extraction at `build/<name>`
    pub extracted_dir: PathBuf,
    /// Hex SHA-256 of the archive
    pub checksum: String,
}

/// Packs sources into archives and re-extracts them for building.
#[derive(Debug, Clone)]
pub struct BundleNormalizer {
    workspace: Workspace,
}

impl BundleNormalizer {
    /// Normalizer writing into `workspace`.
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    /// Archives the contents of `source_dir` to `bundles/<name>.tar.gz`.
    pub async fn normalize(&self, source_dir: &Path, name: &str) -> Result<PathBuf> {
        if !source_dir.is_dir() {
            return Err(Error::NotFound {
                what: "source directory".to_string(),
                path: source_dir.to_path_buf(),
            });
        }

        let archive_path = self.workspace.bundles_dir().join(format!("{}.tar.gz", name));
        log::info!("Normalizing {} into {}", source_dir.display(), archive_path.display());

        archive::pack_dir(source_dir, &archive_path).await?;
        Ok(archive_path)
    }

    /// Extracts `archive_path` into `build/<name>`, deleting any previous
    /// extraction first.
    pub async fn re_extract(&self, archive_path: &Path, name: &str) -> Result<PathBuf> {
        let extracted_dir = self.workspace.build_dir().join(name);
        log::debug!("Re-extracting {} into {}", archive_path.display(), extracted_dir.display());

        fs::create_dir_all(&extracted_dir, true).await?;
        archive::unpack_tar_gz(archive_path, &extracted_dir).await?;
        Ok(extracted_dir)
    }

    /// Runs [`normalize`](Self::normalize) then [`re_extract`](Self::re_extract).
    pub async fn bundle(&self, source_dir: &Path, name: &str) -> Result<SourceBundle> {
        let archive_path = self.normalize(source_dir, name).await?;
        let checksum = checksum::sha256_file(&archive_path).await?;
        let extracted_dir = self.re_extract(&archive_path, name).await?;

        log::info!("Bundled {} (sha256 {})", name, checksum);
        Ok(SourceBundle {
            archive_path,
            extracted_dir,
            checksum,
        })
    }
}
