//! Host platform description.
//!
//! A [`PlatformProfile`] is detected once per process and never mutated. Its
//! `config` map comes from an optional JSON file holding one section per OS
//! family:
//!
//! ```json
//! {
//!   "Linux":  { "build_command": "make -j8", "shell_profile": "~/.zshrc" },
//!   "Darwin": { "mobile_destination": "generic/platform=iOS Simulator" }
//! }
//! ```

use crate::manager::error::{Context, Error, ErrorExt, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Config key overriding the native build command.
pub const KEY_BUILD_COMMAND: &str = "build_command";
/// Config key overriding the default install root.
pub const KEY_INSTALL_ROOT: &str = "install_root";
/// Config key overriding the shell startup file.
pub const KEY_SHELL_PROFILE: &str = "shell_profile";
/// Config key overriding the xcodebuild destination.
pub const KEY_MOBILE_DESTINATION: &str = "mobile_destination";

/// Operating system family of the host.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OsFamily {
    /// Linux distributions.
    Linux,
    /// macOS.
    Darwin,
    /// Windows.
    Windows,
    /// Anything else (BSDs, etc.).
    Other,
}

impl OsFamily {
    /// Family of the running host.
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            OsFamily::Linux
        } else if cfg!(target_os = "macos") {
            OsFamily::Darwin
        } else if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else {
            OsFamily::Other
        }
    }

    /// Name used in config sections and install records.
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Linux => "Linux",
            OsFamily::Darwin => "Darwin",
            OsFamily::Windows => "Windows",
            OsFamily::Other => "Other",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only description of the host.
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    os_family: OsFamily,
    release: String,
    version: String,
    machine: String,
    home_dir: PathBuf,
    config: HashMap<String, String>,
}

impl PlatformProfile {
    /// Detects the running host and loads its config section.
    ///
    /// `config_path` defaults to `~/.kodegen/platform.json`; a missing file
    /// yields an empty config.
    pub fn detect(config_path: Option<&Path>) -> Result<Self> {
        let os_family = OsFamily::current();
        let home_dir = dirs::home_dir().context("could not determine home directory")?;

        let config_path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };
        let config = match config_path {
            Some(path) => load_config(&path, os_family)?,
            None => HashMap::new(),
        };

        let profile = Self {
            os_family,
            release: sysinfo::System::kernel_version().unwrap_or_default(),
            version: sysinfo::System::os_version().unwrap_or_default(),
            machine: std::env::consts::ARCH.to_string(),
            home_dir,
            config,
        };

        log::debug!(
            "Detected platform {} {} ({}) with {} config key(s)",
            profile.os_family,
            profile.release,
            profile.machine,
            profile.config.len()
        );

        Ok(profile)
    }

    /// Builds a profile from explicit parts.
    pub fn new(os_family: OsFamily, home_dir: PathBuf, config: HashMap<String, String>) -> Self {
        Self {
            os_family,
            release: String::new(),
            version: String::new(),
            machine: std::env::consts::ARCH.to_string(),
            home_dir,
            config,
        }
    }

    /// Host OS family.
    pub fn os_family(&self) -> OsFamily {
        self.os_family
    }

    /// Kernel release string.
    pub fn release(&self) -> &str {
        &self.release
    }

    /// OS version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// CPU architecture.
    pub fn machine(&self) -> &str {
        &self.machine
    }

    /// Current user's home directory.
    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    /// All config entries for this OS family.
    pub fn config(&self) -> &HashMap<String, String> {
        &self.config
    }

    /// Looks up one config entry.
    pub fn config_value(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// Looks up a config entry as a path, expanding a leading `~/`.
    pub fn config_path(&self, key: &str) -> Option<PathBuf> {
        self.config_value(key).map(|value| match value.strip_prefix("~/") {
            Some(rest) => self.home_dir.join(rest),
            None => PathBuf::from(value),
        })
    }
}

/// Default location of the platform config file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".kodegen").join("platform.json"))
}

/// Loads the section for `os_family` from a platform config file.
///
/// Non-string JSON values are stored in their JSON text form.
pub fn load_config(path: &Path, os_family: OsFamily) -> Result<HashMap<String, String>> {
    if !path.exists() {
        log::debug!("No platform config at {}", path.display());
        return Ok(HashMap::new());
    }

    let text = std::fs::read_to_string(path).fs_context("reading platform config", path)?;
    let mut sections: HashMap<String, HashMap<String, serde_json::Value>> =
        serde_json::from_str(&text)
            .map_err(Error::from)
            .with_context(|| format!("parsing platform config {}", path.display()))?;

    let section = sections.remove(os_family.as_str()).unwrap_or_default();
    Ok(section
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}
