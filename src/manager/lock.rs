//! Per-package-name execution locks.
//!
//! Two installs of the same package race on deleting and recreating the
//! package's workspace directories. [`PackageLocks`] serializes them: an
//! in-process async mutex keyed by name, plus an advisory `flock` on
//! `locks/<name>.lock` so separate processes are serialized too (unix only).
//!
//! [`FileLock`] is the cross-process half on its own, for shared resources
//! such as the shell profile that every package touches.

use crate::manager::error::{Error, ErrorExt, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

/// How long to wait for another process holding the same package lock.
const LOCK_TIMEOUT: Duration = Duration::from_secs(600);

/// Poll interval while another process holds the lock.
const LOCK_POLL: Duration = Duration::from_millis(100);

/// Name-keyed lock table shared by every pipeline run in this process.
#[derive(Debug, Clone, Default)]
pub struct PackageLocks {
    table: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

/// Held for the duration of one package's pipeline run.
pub struct PackageGuard {
    _local: OwnedMutexGuard<()>,
    _file: FileLock,
}

/// Exclusive advisory lock on `<locks_dir>/<stem>.lock`, released on drop.
pub struct FileLock {
    #[cfg(unix)]
    _file: nix::fcntl::Flock<std::fs::File>,
}

impl FileLock {
    /// Waits up to the lock timeout for `<locks_dir>/<stem>.lock`.
    ///
    /// `holder` names the contended resource in [`Error::Locked`].
    pub async fn acquire(locks_dir: &Path, stem: &str, holder: &str) -> Result<Self> {
        tokio::fs::create_dir_all(locks_dir)
            .await
            .fs_context("creating locks directory", locks_dir)?;
        let lock_path = locks_dir.join(format!("{}.lock", stem));

        #[cfg(unix)]
        let file = acquire_file_lock(&lock_path, holder).await?;
        #[cfg(not(unix))]
        let _ = (lock_path, holder);

        Ok(Self {
            #[cfg(unix)]
            _file: file,
        })
    }
}

impl PackageLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other run holds `name`, then returns its guard.
    pub async fn acquire(&self, name: &str, locks_dir: &Path) -> Result<PackageGuard> {
        let mutex = {
            let mut table = self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            table.entry(name.to_string()).or_default().clone()
        };

        let local = mutex.lock_owned().await;
        log::debug!("Acquired in-process lock for {}", name);

        let file = FileLock::acquire(locks_dir, name, name).await?;

        Ok(PackageGuard {
            _local: local,
            _file: file,
        })
    }
}

#[cfg(unix)]
async fn acquire_file_lock(lock_path: &Path, holder: &str) -> Result<nix::fcntl::Flock<std::fs::File>> {
    use nix::fcntl::{Flock, FlockArg};

    let deadline = tokio::time::Instant::now() + LOCK_TIMEOUT;

    loop {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)
            .fs_context("opening lock file", lock_path)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => {
                log::debug!("Acquired file lock {}", lock_path.display());
                return Ok(lock);
            }
            Err((_, errno)) if errno == nix::errno::Errno::EWOULDBLOCK => {
                if tokio::time::Instant::now() >= deadline {
                    return Err(Error::Locked {
                        package: holder.to_string(),
                    });
                }
                tokio::time::sleep(LOCK_POLL).await;
            }
            Err((_, errno)) => {
                return Err(Error::GenericError(format!(
                    "flock error on {}: {}",
                    lock_path.display(),
                    errno
                )));
            }
        }
    }
}
