//! Install record sidecars (`<install_root>/<name>_config.json`).

use crate::manager::{
    error::{Context, Error, ErrorExt, Result},
    utils::fs,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Timestamp format of [`InstallRecord::install_time`].
pub const INSTALL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Suffix of install record file names.
pub const RECORD_SUFFIX: &str = "_config.json";

/// What was installed, where and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRecord {
    /// Package name
    pub package_name: String,
    /// Local time of the install, `YYYY-MM-DD HH:MM:SS`
    pub install_time: String,
    /// Host OS family
    pub platform: String,
    /// Install root the package was copied into
    pub install_path: PathBuf,
}

impl InstallRecord {
    /// Record stamped with the current local time.
    pub fn new(package_name: impl Into<String>, platform: impl Into<String>, install_path: impl Into<PathBuf>) -> Self {
        Self {
            package_name: package_name.into(),
            install_time: chrono::Local::now().format(INSTALL_TIME_FORMAT).to_string(),
            platform: platform.into(),
            install_path: install_path.into(),
        }
    }

    /// Sidecar path for `name` under `root`.
    pub fn sidecar_path(root: &Path, name: &str) -> PathBuf {
        root.join(format!("{}{}", name, RECORD_SUFFIX))
    }

    /// Atomically writes the sidecar under `root`, replacing any previous one.
    pub async fn write(&self, root: &Path) -> Result<PathBuf> {
        let path = Self::sidecar_path(root, &self.package_name);
        let json = serde_json::to_vec_pretty(self)?;
        fs::write_atomic(&path, &json).await?;
        log::debug!("Wrote install record {}", path.display());
        Ok(path)
    }

    /// Reads a sidecar file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .fs_context("reading install record", path)?;
        serde_json::from_str(&text)
            .map_err(Error::from)
            .with_context(|| format!("parsing install record {}", path.display()))
    }
}
