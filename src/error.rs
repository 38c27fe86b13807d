//! Top-level error types for kodegen_install.
//!
//! Pipeline failures arrive as [`crate::manager::Error`] and are wrapped here
//! together with CLI errors, so the binary can print one message plus
//! actionable recovery suggestions.

use crate::manager::Error as ManagerError;
use thiserror::Error;

/// Result type alias for kodegen_install operations
pub type Result<T> = std::result::Result<T, InstallError>;

/// Main error type for all kodegen_install operations
#[derive(Error, Debug)]
pub enum InstallError {
    /// Install pipeline errors
    #[error("Install error: {0}")]
    Manager(#[from] ManagerError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// User chose to stop after a failure
    #[error("Aborted by user")]
    Aborted,

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl InstallError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        let InstallError::Manager(error) = self else {
            return vec!["Check the error message above for specific details".to_string()];
        };

        match error.root() {
            ManagerError::NotFound { what, .. } if what.starts_with("source URL") => vec![
                "Pass a source tarball with --url <URL>".to_string(),
                "Install the native source tool (apt-get) or drop --no-native-source".to_string(),
            ],
            ManagerError::NotFound { what, path } => vec![format!(
                "Make sure the package provides the {} (looked in {})",
                what,
                path.display()
            )],
            ManagerError::Network { url, .. } => vec![
                format!("Check that {} is reachable and serves a .tar.gz", url),
                "Retry with --retry to be prompted after transient failures".to_string(),
            ],
            ManagerError::ToolInvocation { command, .. } => vec![
                format!("Run `{}` manually in the build directory to inspect the failure", command),
                "Override the build command with --build-command".to_string(),
            ],
            ManagerError::UnsupportedTarget { .. } => vec![
                "Use --target native, mobile (macOS only) or translate --language <LANG>".to_string(),
                "Drop --strict-target to fall back to a native build".to_string(),
            ],
            ManagerError::AnalysisRejected { alternatives, .. } => {
                let mut suggestions = Vec::new();
                if let Some(alternatives) = alternatives {
                    suggestions.push(format!("Consider: {}", alternatives));
                }
                suggestions.push("Rerun with --yes to override the suitability check".to_string());
                suggestions
            }
            ManagerError::Locked { package } => vec![format!(
                "Wait for the running install of {} to finish, then retry",
                package
            )],
            ManagerError::Fs { path, .. } => vec![format!(
                "Check permissions on {} or choose another root with --install-root",
                path.display()
            )],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            InstallError::Manager(error) => !matches!(
                error.root(),
                ManagerError::UnsupportedTarget { .. } | ManagerError::AnalysisRejected { .. }
            ),
            InstallError::Cli(CliError::Aborted) => false,
            _ => true,
        }
    }
}
