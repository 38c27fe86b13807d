//! Build backends and target dispatch.
//!
//! # Targets
//!
//! | Target string | Backend | Module |
//! |---------------|---------|--------|
//! | `native`, `linux`, `macos`, `darwin`, `windows`, `desktop` | [`BuildTarget::Native`] | [`native`] |
//! | `mobile`, `ios` | [`BuildTarget::Mobile`] | [`mobile`] |
//! | `translate` (with a language) | [`BuildTarget::Translate`] | [`translate`] |
//!
//! Unrecognized target strings fall back to the native backend with a
//! warning. In strict mode they are rejected instead.

pub mod mobile;
pub mod native;
pub mod translate;

use crate::bail;
use crate::manager::{
    error::{Error, Result},
    platform::OsFamily,
    request::validate_component,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use translate::{TemplateTranslator, Translator};

/// Default command run by the native backend.
pub const DEFAULT_BUILD_COMMAND: &str = "make";

/// Default xcodebuild destination for mobile builds.
pub const DEFAULT_MOBILE_DESTINATION: &str = "generic/platform=iOS";

/// Which backend handles a package.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum BuildTarget {
    /// Host toolchain build.
    Native,
    /// iOS build through xcodebuild.
    Mobile,
    /// Source translation into the named language.
    Translate(String),
}

impl BuildTarget {
    /// Maps a caller-supplied target string onto exactly one backend.
    ///
    /// `language` is required for `translate`. With `strict` set, unknown
    /// targets are an [`Error::UnsupportedTarget`] instead of falling back
    /// to [`BuildTarget::Native`].
    pub fn resolve(target: &str, language: Option<&str>, strict: bool) -> Result<Self> {
        match target.trim().to_ascii_lowercase().as_str() {
            "native" | "linux" | "macos" | "darwin" | "windows" | "desktop" => Ok(BuildTarget::Native),
            "mobile" | "ios" => Ok(BuildTarget::Mobile),
            "translate" => match language.map(str::trim).filter(|l| !l.is_empty()) {
                Some(language) => {
                    validate_component("translation language", language)?;
                    Ok(BuildTarget::Translate(language.to_ascii_lowercase()))
                }
                None => bail!("target 'translate' requires a language"),
            },
            other if strict => Err(Error::UnsupportedTarget {
                target: other.to_string(),
                platform: OsFamily::current().to_string(),
            }),
            other => {
                log::warn!("Unrecognized target '{}', falling back to native build", other);
                Ok(BuildTarget::Native)
            }
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildTarget::Native => write!(f, "native"),
            BuildTarget::Mobile => write!(f, "mobile"),
            BuildTarget::Translate(language) => write!(f, "translate:{}", language),
        }
    }
}

/// Successful result of the build stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A build command ran and exited 0.
    Built {
        /// Command line that ran
        command: String,
    },
    /// Translated source was written.
    Translated {
        /// Path of the generated file
        output: PathBuf,
    },
    /// Nothing to do; not an error.
    Skipped {
        /// Why the backend did not run
        reason: String,
    },
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildOutcome::Built { command } => write!(f, "built with `{}`", command),
            BuildOutcome::Translated { output } => write!(f, "translated to {}", output.display()),
            BuildOutcome::Skipped { reason } => write!(f, "skipped ({})", reason),
        }
    }
}

/// Routes a package to its build backend.
#[derive(Clone)]
pub struct BuildDispatcher {
    os_family: OsFamily,
    build_command: String,
    mobile_destination: String,
    translator: Arc<dyn Translator>,
    assistant_configured: bool,
}

impl fmt::Debug for BuildDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildDispatcher")
            .field("os_family", &self.os_family)
            .field("build_command", &self.build_command)
            .field("mobile_destination", &self.mobile_destination)
            .field("assistant_configured", &self.assistant_configured)
            .finish_non_exhaustive()
    }
}

impl BuildDispatcher {
    /// Dispatcher for `os_family` with default commands and the template translator.
    pub fn new(os_family: OsFamily) -> Self {
        Self {
            os_family,
            build_command: DEFAULT_BUILD_COMMAND.to_string(),
            mobile_destination: DEFAULT_MOBILE_DESTINATION.to_string(),
            translator: Arc::new(TemplateTranslator),
            assistant_configured: false,
        }
    }

    /// Overrides the native build command.
    pub fn with_build_command(mut self, command: impl Into<String>) -> Self {
        self.build_command = command.into();
        self
    }

    /// Overrides the xcodebuild destination.
    pub fn with_mobile_destination(mut self, destination: impl Into<String>) -> Self {
        self.mobile_destination = destination.into();
        self
    }

    /// Replaces the translation collaborator.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    /// Marks the assistant as configured (API key present).
    pub fn with_assistant(mut self, configured: bool) -> Self {
        self.assistant_configured = configured;
        self
    }

    /// Native build command in effect.
    pub fn build_command(&self) -> &str {
        &self.build_command
    }

    /// Builds the package at `extracted_dir` with the backend for `target`.
    pub async fn build(&self, extracted_dir: &Path, name: &str, target: &BuildTarget) -> Result<BuildOutcome> {
        log::info!("Building {} for {} target", name, target);

        match target {
            BuildTarget::Native => native::build(extracted_dir, &self.build_command).await,
            BuildTarget::Mobile => {
                if self.os_family != OsFamily::Darwin {
                    return Err(Error::UnsupportedTarget {
                        target: target.to_string(),
                        platform: self.os_family.to_string(),
                    });
                }
                mobile::build(extracted_dir, name, &self.mobile_destination).await
            }
            BuildTarget::Translate(language) => {
                if !self.assistant_configured {
                    log::info!("Translation assistant not configured, skipping");
                    return Ok(BuildOutcome::Skipped {
                        reason: "not configured".to_string(),
                    });
                }
                translate::translate(self.translator.as_ref(), extracted_dir, name, language).await
            }
        }
    }
}
