//! Managed workspace layout.
//!
//! Every package name owns one entry in each stage directory:
//!
//! ```text
//! <root>/
//!   sources/<name>/          acquired source tree
//!   bundles/<name>.tar.gz    normalized archive
//!   build/<name>/            clean re-extraction handed to builders
//!   locks/<name>.lock        advisory lock file
//!   locks/shared/            locks on resources every package touches
//!   envs/<env>/              named install environments
//! ```

use std::path::{Path, PathBuf};

/// Paths of the per-user managed workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Workspace rooted at `root`. Nothing is created until a stage needs it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default workspace root, `~/.kodegen/packages`.
    pub fn default_root() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".kodegen")
            .join("packages")
    }

    /// Workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where acquired sources land.
    pub fn sources_dir(&self) -> PathBuf {
        self.root.join("sources")
    }

    /// Where normalized archives are written.
    pub fn bundles_dir(&self) -> PathBuf {
        self.root.join("bundles")
    }

    /// Where archives are re-extracted for building.
    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Where per-package lock files live.
    pub fn locks_dir(&self) -> PathBuf {
        self.root.join("locks")
    }

    /// Locks on resources shared by all packages, such as the shell profile.
    pub fn shared_locks_dir(&self) -> PathBuf {
        self.locks_dir().join("shared")
    }

    /// Parent of all named install environments.
    pub fn envs_dir(&self) -> PathBuf {
        self.root.join("envs")
    }
}
