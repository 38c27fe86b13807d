//! Installation into a managed root.
//!
//! # Install roots
//!
//! | Condition | Root |
//! |-----------|------|
//! | install environment `E` given | `<workspace>/envs/E` |
//! | explicit override | the override |
//! | Linux | `/usr/local/lib/kodegen` |
//! | macOS | `/usr/local/kodegen` |
//! | Windows | `%ProgramFiles%\kodegen` |
//!
//! Installing merges the built tree into the root, updates the shell
//! profile when one is configured, and writes the install record last.

pub mod record;
pub mod shell;

pub use record::InstallRecord;
pub use shell::ShellProfile;

use crate::manager::{
    error::{ErrorExt, Result},
    platform::OsFamily,
    request::validate_component,
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Per-OS default install root.
pub fn default_install_root(os_family: OsFamily) -> PathBuf {
    match os_family {
        OsFamily::Linux => PathBuf::from("/usr/local/lib/kodegen"),
        OsFamily::Darwin | OsFamily::Other => PathBuf::from("/usr/local/kodegen"),
        OsFamily::Windows => std::env::var_os("ProgramFiles")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\Program Files"))
            .join("kodegen"),
    }
}

/// Copies built packages into their install root and records them.
#[derive(Debug, Clone)]
pub struct Installer {
    os_family: OsFamily,
    envs_dir: PathBuf,
    root_override: Option<PathBuf>,
    shell_profile: Option<ShellProfile>,
}

impl Installer {
    /// Installer for `os_family`; named environments live under `envs_dir`.
    pub fn new(os_family: OsFamily, envs_dir: impl Into<PathBuf>) -> Self {
        Self {
            os_family,
            envs_dir: envs_dir.into(),
            root_override: None,
            shell_profile: None,
        }
    }

    /// Replaces the per-OS default root.
    pub fn with_root_override(mut self, root: Option<PathBuf>) -> Self {
        self.root_override = root;
        self
    }

    /// Shell profile to extend with each install's path, if any.
    pub fn with_shell_profile(mut self, profile: Option<ShellProfile>) -> Self {
        self.shell_profile = profile;
        self
    }

    /// Root that installs for `install_env` go to.
    pub fn resolve_root(&self, install_env: Option<&str>) -> Result<PathBuf> {
        if let Some(env) = install_env {
            validate_component("install environment", env)?;
            return Ok(self.envs_dir.join(env));
        }

        Ok(self
            .root_override
            .clone()
            .unwrap_or_else(|| default_install_root(self.os_family)))
    }

    /// Installs the tree at `extracted_dir` as package `name`.
    pub async fn install(&self, extracted_dir: &Path, name: &str, install_env: Option<&str>) -> Result<InstallRecord> {
        let root = self.resolve_root(install_env)?;
        log::info!("Installing {} into {}", name, root.display());

        fs::create_dir_all(&root, false).await?;
        fs::merge_dir(extracted_dir, &root).await?;

        if let Some(profile) = &self.shell_profile {
            profile.ensure_path_export(name, &root).await?;
        }

        let record = InstallRecord::new(name, self.os_family.as_str(), &root);
        record.write(&root).await?;
        Ok(record)
    }

    /// Reads the record for `name` under the root for `install_env`.
    pub async fn load_record(&self, name: &str, install_env: Option<&str>) -> Result<InstallRecord> {
        let root = self.resolve_root(install_env)?;
        InstallRecord::load(&InstallRecord::sidecar_path(&root, name)).await
    }

    /// All records under the root for `install_env`, sorted by package name.
    pub async fn list_records(&self, install_env: Option<&str>) -> Result<Vec<InstallRecord>> {
        let root = self.resolve_root(install_env)?;
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&root)
            .await
            .fs_context("reading install root", &root)?;
        let mut records = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .fs_context("reading install root entry", &root)?
        {
            let path = entry.path();
            let is_record = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(record::RECORD_SUFFIX));
            if !is_record || !path.is_file() {
                continue;
            }

            match InstallRecord::load(&path).await {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping unreadable install record {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| a.package_name.cmp(&b.package_name));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_root_precedence() {
        let installer = Installer::new(OsFamily::Linux, "/ws/envs");
        assert_eq!(
            installer.resolve_root(Some("dev")).unwrap(),
            PathBuf::from("/ws/envs/dev")
        );
        assert_eq!(
            installer.resolve_root(None).unwrap(),
            PathBuf::from("/usr/local/lib/kodegen")
        );

        let installer = installer.with_root_override(Some(PathBuf::from("/opt/k")));
        assert_eq!(installer.resolve_root(None).unwrap(), PathBuf::from("/opt/k"));
        assert!(installer.resolve_root(Some("../escape")).is_err());
    }

    #[tokio::test]
    async fn test_install_merges_and_records() {
        let temp = TempDir::new().unwrap();
        let built = temp.path().join("build/foo");
        std::fs::create_dir_all(built.join("bin")).unwrap();
        std::fs::write(built.join("bin/foo"), "new").unwrap();

        let envs = temp.path().join("envs");
        std::fs::create_dir_all(envs.join("dev/bin")).unwrap();
        std::fs::write(envs.join("dev/bin/other"), "keep").unwrap();

        let profile = ShellProfile::bashrc(temp.path());
        let installer = Installer::new(OsFamily::Linux, &envs).with_shell_profile(Some(profile.clone()));
        let record = installer.install(&built, "foo", Some("dev")).await.unwrap();

        assert_eq!(record.install_path, envs.join("dev"));
        assert_eq!(record.platform, "Linux");
        assert_eq!(std::fs::read_to_string(envs.join("dev/bin/foo")).unwrap(), "new");
        assert_eq!(std::fs::read_to_string(envs.join("dev/bin/other")).unwrap(), "keep");
        assert!(envs.join("dev/foo_config.json").is_file());
        assert!(std::fs::read_to_string(profile.path()).unwrap().contains("# kodegen-install: foo"));

        let loaded = installer.load_record("foo", Some("dev")).await.unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_list_records_sorted() {
        let temp = TempDir::new().unwrap();
        let built = temp.path().join("built");
        std::fs::create_dir_all(&built).unwrap();

        let installer = Installer::new(OsFamily::Linux, temp.path().join("envs"));
        installer.install(&built, "zeta", Some("e")).await.unwrap();
        installer.install(&built, "alpha", Some("e")).await.unwrap();

        let names: Vec<_> = installer
            .list_records(Some("e"))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.package_name)
            .collect();
        assert_eq!(names, ["alpha", "zeta"]);
        assert!(installer.list_records(Some("missing")).await.unwrap().is_empty());
    }
}
