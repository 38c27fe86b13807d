//! Install command implementation.
//!
//! Runs the full pipeline for one package, reporting each stage as it starts.
//! Questions for the user (override a rejection, retry a failure) are asked
//! here, between runs, never while a run holds its package lock.

use crate::cli::{Args, InstallArgs, OutputManager, RuntimeConfig, prompt};
use crate::error::{InstallError, Result};
use crate::manager::{
    AllowAll, Error, InstallReport, PackageManager, PackageRequest, PlatformProfile, Stage,
};
use std::sync::Arc;

/// Execute install command
pub(super) async fn execute_install(args: &Args, install: &InstallArgs, config: &RuntimeConfig) -> Result<i32> {
    let output = config.output();
    let profile = PlatformProfile::detect(args.platform_config.as_deref())?;
    let install_config = args.install_config(install);

    if !install_config.assistant_configured() {
        let _ = output.verbose("GEMINI_API_KEY not set: suitability analysis and translation are not configured");
    }

    let (verbose, quiet) = (config.is_verbose(), config.is_quiet());
    let mut manager = PackageManager::new(&install_config, profile)?
        .with_observer(Arc::new(move |stage: Stage| {
            let _ = OutputManager::new(verbose, quiet).progress(&stage.to_string());
        }));

    let request = PackageRequest {
        name: install.name.clone(),
        source_url: install.url.clone(),
        target_platform: install.target.clone(),
        language: install.language.clone(),
        install_env: install.env.clone(),
    };

    let _ = output.verbose(&format!("Workspace: {}", manager.workspace().root().display()));

    loop {
        match manager.install_package(&request).await {
            Ok(report) => {
                print_report(output, &report);
                return Ok(0);
            }
            Err(e) => {
                if let Some(alternatives) = rejected_alternatives(&e) {
                    let accepted = install.yes
                        || prompt::confirm_override(&request.name, &request.target_platform, alternatives).await;
                    if !accepted {
                        return Err(e.into());
                    }

                    let _ = output.warn(&format!("Overriding suitability rejection of {}", request.name));
                    manager = manager.with_policy(Arc::new(AllowAll));
                    continue;
                }

                let e = InstallError::from(e);
                if !(install.retry && e.is_recoverable()) {
                    return Err(e);
                }

                let _ = output.warn(&format!("{}", e));
                if !prompt::ask_retry().await {
                    return Err(e);
                }
                let _ = output.info(&format!("Retrying install of {}", request.name));
            }
        }
    }
}

fn print_report(output: &OutputManager, report: &InstallReport) {
    let _ = output.section(&format!("Installed {}", report.record.package_name));
    let _ = output.field("Target", &report.target.to_string());
    let _ = output.field("Bundle", &report.bundle.archive_path.display().to_string());
    let _ = output.field("SHA-256", &report.bundle.checksum);
    let _ = output.field("Analysis", &report.analysis.to_string());
    let _ = output.field("Build", &report.build.to_string());
    let _ = output.field("Install root", &report.record.install_path.display().to_string());
    let _ = output.field("Installed at", &report.record.install_time);
    let _ = output.success(&format!("{} installed", report.record.package_name));
}

/// Alternatives text when `error` is a suitability rejection.
fn rejected_alternatives(error: &Error) -> Option<Option<&str>> {
    match error.root() {
        Error::AnalysisRejected { alternatives, .. } => Some(alternatives.as_deref()),
        _ => None,
    }
}
