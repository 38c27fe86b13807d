//! Native build through the host toolchain.

use super::BuildOutcome;
use crate::manager::{error::Result, utils::process};
use std::path::{Path, PathBuf};

/// File names that mark a directory as buildable, in lookup order.
pub const BUILD_DESCRIPTORS: &[&str] = &["Makefile", "makefile", "GNUmakefile"];

/// First build descriptor present in `dir`.
pub fn find_descriptor(dir: &Path) -> Option<PathBuf> {
    BUILD_DESCRIPTORS
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Runs `command` in `dir` when it has a build descriptor.
///
/// Without a descriptor nothing is executed and the build is
/// [`BuildOutcome::Skipped`].
pub async fn build(dir: &Path, command: &str) -> Result<BuildOutcome> {
    let Some(descriptor) = find_descriptor(dir) else {
        log::info!("No build descriptor in {}, skipping native build", dir.display());
        return Ok(BuildOutcome::Skipped {
            reason: "no build descriptor".to_string(),
        });
    };

    log::debug!("Using build descriptor {}", descriptor.display());
    let output = process::run_shell(dir, command).await?;
    log::debug!("{}", output.stdout.trim_end());

    Ok(BuildOutcome::Built {
        command: command.to_string(),
    })
}
