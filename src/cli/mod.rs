//! Command line interface for kodegen_install.
//!
//! Parses arguments, wires the interactive adapters around the install
//! pipeline and reports results.

mod args;
pub mod commands;
mod output;
pub mod prompt;

pub use args::{Args, Command, InstallArgs, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
