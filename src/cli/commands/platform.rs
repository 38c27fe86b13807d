//! Platform command implementation.

use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;
use crate::manager::{PlatformProfile, platform::default_config_path};
use std::collections::BTreeMap;

/// Execute platform command
pub(super) async fn execute_platform(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let output = config.output();
    let profile = PlatformProfile::detect(args.platform_config.as_deref())?;

    let _ = output.section("Platform");
    let _ = output.field("OS family", profile.os_family().as_str());
    let _ = output.field("Release", profile.release());
    let _ = output.field("Version", profile.version());
    let _ = output.field("Machine", profile.machine());
    let _ = output.field("Home", &profile.home_dir().display().to_string());

    let config_path = args.platform_config.clone().or_else(default_config_path);
    if let Some(path) = config_path {
        let _ = output.field("Config file", &path.display().to_string());
    }

    if profile.config().is_empty() {
        let _ = output.indent("(no config entries)");
    } else {
        let _ = output.section("Config");
        let sorted: BTreeMap<_, _> = profile.config().iter().collect();
        for (key, value) in sorted {
            let _ = output.field(key, value);
        }
    }

    Ok(())
}
