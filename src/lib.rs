//! # Kodegen Install
//!
//! Source package installer for developer machines.
//!
//! Packages are fetched from the host's native source tool or a tarball URL,
//! normalized into a deterministic archive, checked by a pluggable
//! suitability policy, then built natively, built for iOS, or translated
//! into another language before being installed into a managed root.
//!
//! ## Usage
//!
//! ```bash
//! kodegen_install install zlib --url https://zlib.net/zlib-1.3.1.tar.gz
//! kodegen_install install demo --url ./demo --target translate --language javascript
//! kodegen_install install app --url ./app --target mobile --env ios
//! kodegen_install records --env ios
//! kodegen_install platform
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod error;
pub mod manager;

pub use cli::Args;
pub use error::{CliError, InstallError, Result};
pub use manager::{InstallReport, PackageManager, PackageRequest, PlatformProfile};

use std::path::PathBuf;

/// Configuration for install operations
#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Managed workspace root (sources, bundles, build, locks, envs)
    pub workspace_root: PathBuf,
    /// Install root used when no install environment is given
    pub install_root: Option<PathBuf>,
    /// Native build command (default: `make`)
    pub build_command: Option<String>,
    /// Reject unrecognized targets instead of building natively
    pub strict_target: bool,
    /// Add the install root to PATH in the shell profile (Linux)
    pub shell_update: bool,
    /// Shell profile to edit (default: `~/.bashrc`)
    pub shell_profile: Option<PathBuf>,
    /// Prefer the host's native package-source tool over URLs
    pub native_source: bool,
    /// Assistant API key; analysis and translation are skipped without it
    pub api_key: Option<String>,
}

impl InstallConfig {
    /// Whether an assistant API key is present.
    pub fn assistant_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            workspace_root: manager::Workspace::default_root(),
            install_root: None,
            build_command: None,
            strict_target: false,
            shell_update: true,
            shell_profile: None,
            native_source: true,
            api_key: None,
        }
    }
}
