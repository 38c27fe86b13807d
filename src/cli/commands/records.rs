//! Records command implementation.
//!
//! Lists the install record sidecars under an install root.

use crate::InstallConfig;
use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;
use crate::manager::{PackageManager, PlatformProfile};
use std::path::PathBuf;

/// Execute records command
pub(super) async fn execute_records(
    args: &Args,
    env: Option<&str>,
    install_root: Option<PathBuf>,
    config: &RuntimeConfig,
) -> Result<()> {
    let output = config.output();
    let profile = PlatformProfile::detect(args.platform_config.as_deref())?;

    let install_config = InstallConfig {
        workspace_root: args.workspace_root(),
        install_root,
        native_source: false,
        shell_update: false,
        ..InstallConfig::default()
    };
    let manager = PackageManager::new(&install_config, profile)?;

    let root = manager.installer().resolve_root(env)?;
    let records = manager.records(env).await?;

    let _ = output.section(&format!("Install records in {}", root.display()));
    if records.is_empty() {
        let _ = output.indent("(none)");
        return Ok(());
    }

    for record in records {
        let _ = output.field(
            &record.package_name,
            &format!("{} on {} ({})", record.install_time, record.platform, record.install_path.display()),
        );
    }

    Ok(())
}
