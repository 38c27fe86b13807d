//! Command execution functions.
//!
//! Every command reports its own progress; failures are printed here with
//! recovery suggestions and mapped to exit code 1.

mod install;
mod platform;
mod records;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use install::execute_install;
use platform::execute_platform;
use records::execute_records;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        // Create output for validation errors (never quiet)
        let output = super::OutputManager::new(false, false);
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(1);
    }

    let config = RuntimeConfig::from(&args);

    let result = match &args.command {
        Command::Install(install) => execute_install(&args, install, &config).await,
        Command::Platform => execute_platform(&args, &config).await.map(|()| 0),
        Command::Records { env, install_root } => {
            execute_records(&args, env.as_deref(), install_root.clone(), &config)
                .await
                .map(|()| 0)
        }
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            config.output().error(&format!(
                "Command '{}' failed: {}",
                args.command.name(),
                e
            ));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() && !config.is_quiet() {
                let output = config.output();
                let _ = output.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    let _ = output.println(&format!("  • {}", suggestion));
                }
            }

            Ok(1)
        }
    }
}
