//! Command line argument parsing and validation.

use crate::InstallConfig;
use crate::manager::Workspace;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fetch, build and install source packages
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_install",
    version,
    about = "Fetch, build and install source packages",
    long_about = "Fetch package sources, normalize them into a bundle, then build natively,
build for iOS, or translate them, and install the result into a managed root.

Usage:
  kodegen_install install zlib --url https://zlib.net/zlib-1.3.1.tar.gz
  kodegen_install install demo --url ./demo --target translate --language javascript
  kodegen_install records --env dev
  kodegen_install platform"
)]
pub struct Args {
    /// Show detailed progress
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Platform config file (default: ~/.kodegen/platform.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub platform_config: Option<PathBuf>,

    /// Managed workspace root (default: ~/.kodegen/packages)
    #[arg(long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Assistant API key enabling suitability analysis and translation
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch, build and install a package
    Install(InstallArgs),

    /// Show the detected platform profile and its config
    Platform,

    /// List install records
    Records {
        /// Install environment to list
        #[arg(long, value_name = "ENV")]
        env: Option<String>,

        /// Install root to list when no environment is given
        #[arg(long, value_name = "DIR")]
        install_root: Option<PathBuf>,
    },
}

impl Command {
    /// Subcommand name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Install(_) => "install",
            Command::Platform => "platform",
            Command::Records { .. } => "records",
        }
    }
}

/// Arguments of `install`
#[derive(clap::Args, Debug, Clone)]
pub struct InstallArgs {
    /// Package name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Source tarball URL, file:// URL or local path
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Build target: native, mobile or translate
    #[arg(long, default_value = "native")]
    pub target: String,

    /// Output language for --target translate
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Install into a named environment under the workspace
    #[arg(long, value_name = "ENV")]
    pub env: Option<String>,

    /// Fail on unrecognized targets instead of building natively
    #[arg(long)]
    pub strict_target: bool,

    /// Do not add the install root to PATH in the shell profile
    #[arg(long)]
    pub no_shell_update: bool,

    /// Never use the native package-source tool
    #[arg(long)]
    pub no_native_source: bool,

    /// Command run for native builds (default: make)
    #[arg(long, value_name = "CMD")]
    pub build_command: Option<String>,

    /// Install root used when no environment is given
    #[arg(long, value_name = "DIR")]
    pub install_root: Option<PathBuf>,

    /// Accept packages the suitability check rejects
    #[arg(short, long)]
    pub yes: bool,

    /// Offer to retry after a recoverable failure
    #[arg(long)]
    pub retry: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Command::Install(install) = &self.command {
            if install.name.trim().is_empty() {
                return Err("Package name is required".to_string());
            }
            if install.target.eq_ignore_ascii_case("translate")
                && install.language.as_deref().is_none_or(|l| l.trim().is_empty())
            {
                return Err("--target translate requires --language".to_string());
            }
        }
        Ok(())
    }

    /// Builds the pipeline configuration for `install`.
    pub fn install_config(&self, install: &InstallArgs) -> InstallConfig {
        InstallConfig {
            workspace_root: self.workspace_root(),
            install_root: install.install_root.clone(),
            build_command: install.build_command.clone(),
            strict_target: install.strict_target,
            shell_update: !install.no_shell_update,
            shell_profile: None,
            native_source: !install.no_native_source,
            api_key: self.api_key.clone(),
        }
    }

    /// Workspace root from `--workspace` or the default.
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace.clone().unwrap_or_else(Workspace::default_root)
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, quiet),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.output.is_verbose()
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.verbose, args.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_flags_map_to_config() {
        let args = Args::try_parse_from([
            "kodegen_install",
            "--workspace",
            "/tmp/ws",
            "install",
            "foo",
            "--no-shell-update",
            "--no-native-source",
            "--build-command",
            "make -j4",
        ])
        .unwrap();

        let Command::Install(install) = &args.command else {
            panic!("expected install");
        };
        let config = args.install_config(install);
        assert_eq!(config.workspace_root, PathBuf::from("/tmp/ws"));
        assert!(!config.shell_update);
        assert!(!config.native_source);
        assert_eq!(config.build_command.as_deref(), Some("make -j4"));
        assert_eq!(install.target, "native");
    }

    #[test]
    fn test_translate_requires_language() {
        let args = Args::try_parse_from(["kodegen_install", "install", "bar", "--target", "translate"]).unwrap();
        assert!(args.validate().is_err());

        let args = Args::try_parse_from([
            "kodegen_install",
            "install",
            "bar",
            "--target",
            "translate",
            "--language",
            "python",
        ])
        .unwrap();
        assert!(args.validate().is_ok());
    }
}
