//! Shell startup file integration.
//!
//! Every package edits the same profile, so edits are serialized across
//! package names: an in-process mutex shared by clones of a
//! [`ShellProfile`], plus a `flock` under the workspace locks directory when
//! one is configured.

use crate::manager::{
    error::{ErrorExt, Result},
    lock::FileLock,
    utils::fs,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Prefix of the marker comment guarding each package's export line.
const MARKER_PREFIX: &str = "# kodegen-install:";

/// Stem of the profile lock file.
const PROFILE_LOCK: &str = "shell-profile";

/// A shell startup file such as `~/.bashrc`.
#[derive(Debug, Clone)]
pub struct ShellProfile {
    path: PathBuf,
    lock_dir: Option<PathBuf>,
    edit: Arc<tokio::sync::Mutex<()>>,
}

impl ShellProfile {
    /// Profile at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_dir: None,
            edit: Arc::default(),
        }
    }

    /// `~/.bashrc` under `home`.
    pub fn bashrc(home: &Path) -> Self {
        Self::new(home.join(".bashrc"))
    }

    /// Also takes `<dir>/shell-profile.lock` around each edit, so other
    /// processes sharing `dir` are excluded too.
    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(dir.into());
        self
    }

    /// File being edited.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Makes sure the profile prepends `install_path` to `PATH` for `name`.
    ///
    /// The export line follows a marker comment naming the package, so
    /// reinstalls rewrite that line instead of appending another one.
    /// Returns whether the file changed.
    pub async fn ensure_path_export(&self, name: &str, install_path: &Path) -> Result<bool> {
        let _edit = self.edit.lock().await;
        let _file = match &self.lock_dir {
            Some(dir) => Some(FileLock::acquire(dir, PROFILE_LOCK, "shell profile").await?),
            None => None,
        };

        let marker = format!("{} {}", MARKER_PREFIX, name);
        let export = format!("export PATH=\"{}:$PATH\"", install_path.display());

        let existing = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e).fs_context("reading shell profile", &self.path),
        };

        let mut lines: Vec<String> = existing.lines().map(str::to_string).collect();
        match lines.iter().position(|line| line.trim_end() == marker) {
            Some(idx) => {
                if lines.get(idx + 1).map(String::as_str) == Some(export.as_str()) {
                    return Ok(false);
                }
                let next_is_export = lines
                    .get(idx + 1)
                    .is_some_and(|line| line.starts_with("export PATH="));
                if next_is_export {
                    lines[idx + 1] = export;
                } else {
                    lines.insert(idx + 1, export);
                }
            }
            None => {
                if lines.last().is_some_and(|line| !line.trim().is_empty()) {
                    lines.push(String::new());
                }
                lines.push(marker);
                lines.push(export);
            }
        }

        let mut updated = lines.join("\n");
        updated.push('\n');
        fs::write_atomic(&self.path, updated.as_bytes()).await?;
        log::info!("Updated PATH for {} in {}", name, self.path.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_appends_once() {
        let temp = TempDir::new().unwrap();
        let profile = ShellProfile::bashrc(temp.path());
        std::fs::write(profile.path(), "alias ll='ls -l'\n").unwrap();

        assert!(profile.ensure_path_export("foo", Path::new("/opt/k")).await.unwrap());
        assert!(!profile.ensure_path_export("foo", Path::new("/opt/k")).await.unwrap());

        let text = std::fs::read_to_string(profile.path()).unwrap();
        assert!(text.starts_with("alias ll='ls -l'\n"));
        assert_eq!(text.matches("# kodegen-install: foo").count(), 1);
        assert_eq!(text.matches("export PATH=\"/opt/k:$PATH\"").count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_packages_all_get_exports() {
        let temp = TempDir::new().unwrap();
        let profile = ShellProfile::bashrc(temp.path()).with_lock_dir(temp.path().join("locks"));
        std::fs::write(profile.path(), "alias ll='ls -l'\n").unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let profile = profile.clone();
                tokio::spawn(async move {
                    let path = PathBuf::from(format!("/opt/pkg{}", i));
                    profile.ensure_path_export(&format!("pkg{}", i), &path).await
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }

        let text = std::fs::read_to_string(profile.path()).unwrap();
        assert_eq!(text.matches(MARKER_PREFIX).count(), 8);
        for i in 0..8 {
            assert!(text.contains(&format!("# kodegen-install: pkg{}\nexport PATH=\"/opt/pkg{}:$PATH\"", i, i)));
        }
        assert!(text.starts_with("alias ll='ls -l'\n"));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_separate_handles_share_file_lock() {
        let temp = TempDir::new().unwrap();
        let locks = temp.path().join("locks");

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                // Independent handles: only the flock serializes them.
                let profile = ShellProfile::bashrc(temp.path()).with_lock_dir(&locks);
                tokio::spawn(async move {
                    let path = PathBuf::from(format!("/opt/pkg{}", i));
                    profile.ensure_path_export(&format!("pkg{}", i), &path).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let text = std::fs::read_to_string(temp.path().join(".bashrc")).unwrap();
        assert_eq!(text.matches(MARKER_PREFIX).count(), 8);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_profile_updates_real_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dotfile = temp.path().join("dotfiles/bashrc");
        std::fs::create_dir_all(dotfile.parent().unwrap()).unwrap();
        std::fs::write(&dotfile, "export EDITOR=vi\n").unwrap();
        std::fs::set_permissions(&dotfile, std::fs::Permissions::from_mode(0o600)).unwrap();
        std::os::unix::fs::symlink(&dotfile, temp.path().join(".bashrc")).unwrap();

        let profile = ShellProfile::bashrc(temp.path());
        assert!(profile.ensure_path_export("foo", Path::new("/opt/k")).await.unwrap());

        let link = std::fs::symlink_metadata(profile.path()).unwrap();
        assert!(link.file_type().is_symlink());
        let text = std::fs::read_to_string(&dotfile).unwrap();
        assert!(text.contains("# kodegen-install: foo\nexport PATH=\"/opt/k:$PATH\""));
        let mode = std::fs::metadata(&dotfile).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[tokio::test]
    async fn test_rewrites_changed_path() {
        let temp = TempDir::new().unwrap();
        let profile = ShellProfile::bashrc(temp.path());

        profile.ensure_path_export("foo", Path::new("/opt/old")).await.unwrap();
        profile.ensure_path_export("bar", Path::new("/opt/bar")).await.unwrap();
        profile.ensure_path_export("foo", Path::new("/opt/new")).await.unwrap();

        let text = std::fs::read_to_string(profile.path()).unwrap();
        assert!(!text.contains("/opt/old"));
        assert!(text.contains("# kodegen-install: foo\nexport PATH=\"/opt/new:$PATH\""));
        assert!(text.contains("# kodegen-install: bar\nexport PATH=\"/opt/bar:$PATH\""));
    }
}
