//! Subprocess execution for native tools and build commands.

use crate::manager::error::{Error, Result};
use std::path::Path;
use tokio::process::Command;

/// Captured result of a successful subprocess run.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Command line, for logging
    pub command: String,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

/// Quotes a path for interpolation into a shell command string.
#[cfg(not(windows))]
pub fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

/// Quotes a path for interpolation into a shell command string.
#[cfg(windows)]
pub fn shell_quote(path: &Path) -> String {
    format!("\"{}\"", path.to_string_lossy())
}

/// Builds the `cd <dir> && <command>` line handed to the shell.
pub fn shell_line(dir: &Path, command: &str) -> String {
    if cfg!(windows) {
        format!("cd /d {} && {}", shell_quote(dir), command)
    } else {
        format!("cd {} && {}", shell_quote(dir), command)
    }
}

/// Runs `command` through the platform shell with `dir` as working directory.
///
/// Nonzero exit is reported as [`Error::ToolInvocation`] carrying stderr.
pub async fn run_shell(dir: &Path, command: &str) -> Result<CommandOutput> {
    let line = shell_line(dir, command);

    let mut cmd = if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(&line);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&line);
        cmd
    };

    log::debug!("Running: {}", line);
    let output = cmd.output().await.map_err(|error| Error::CommandFailed {
        command: line.clone(),
        error,
    })?;

    finish(line, output)
}

/// Runs `program` with `args` in `dir` without going through a shell.
pub async fn run_program<S: AsRef<str>>(program: &Path, args: &[S], dir: &Path) -> Result<CommandOutput> {
    let display = std::iter::once(program.display().to_string())
        .chain(args.iter().map(|a| a.as_ref().to_string()))
        .collect::<Vec<_>>()
        .join(" ");

    log::debug!("Running in {}: {}", dir.display(), display);
    let output = Command::new(program)
        .args(args.iter().map(|a| a.as_ref()))
        .current_dir(dir)
        .output()
        .await
        .map_err(|error| Error::CommandFailed {
            command: display.clone(),
            error,
        })?;

    finish(display, output)
}

fn finish(command: String, output: std::process::Output) -> Result<CommandOutput> {
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        return Err(Error::ToolInvocation {
            command,
            status: output.status.code(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(CommandOutput {
        command,
        stdout,
        stderr,
    })
}
