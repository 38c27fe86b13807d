//! Error types for package manager operations.
//!
//! Provides the pipeline error taxonomy with contextual error chaining,
//! filesystem-specific errors carrying the offending path, and a `bail!`
//! macro for early returns.
//!
//! # Taxonomy
//!
//! | Variant | Raised by |
//! |---------|-----------|
//! | [`Error::Network`] | source download failures |
//! | [`Error::ToolInvocation`] | nonzero exit of a native tool or build command |
//! | [`Error::NotFound`] | expected file or directory absent |
//! | [`Error::UnsupportedTarget`] | target not buildable on this host |
//! | [`Error::AnalysisRejected`] | suitability gate declined the package |
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_install::manager::{Context, ErrorExt, Result};
//! use std::path::Path;
//!
//! fn read_descriptor(path: &Path) -> Result<String> {
//!     let text = std::fs::read_to_string(path).fs_context("reading build descriptor", path)?;
//!     text.lines()
//!         .next()
//!         .map(str::to_string)
//!         .context("build descriptor is empty")
//! }
//! ```

use std::{
    fmt::Display,
    io,
    path::{self, PathBuf},
};
use thiserror::Error as DeriveError;

/// Errors returned by the package manager pipeline.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Context describing the operation (e.g., "creating install root")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// Child process could not be spawned at all.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Command that failed to execute
        command: String,
        /// The underlying error
        error: io::Error,
    },

    /// Source download failed.
    #[error("network error fetching {url}: {reason}")]
    Network {
        /// URL being fetched
        url: String,
        /// Reason for the failure
        reason: String,
    },

    /// External tool exited with a nonzero status.
    #[error("{command} exited with {}: {stderr}", exit_label(.status))]
    ToolInvocation {
        /// Command line that was run
        command: String,
        /// Exit code, `None` when terminated by a signal
        status: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// An expected file or directory does not exist.
    #[error("{what} not found at {path}")]
    NotFound {
        /// What was being looked for
        what: String,
        /// Where it was expected
        path: PathBuf,
    },

    /// Build target cannot be served on this host.
    #[error("target {target} is not supported on {platform}")]
    UnsupportedTarget {
        /// Requested target
        target: String,
        /// Host OS family
        platform: String,
    },

    /// Suitability gate declined the package.
    #[error("package {package} rejected by suitability analysis{}", alternatives_suffix(.alternatives))]
    AnalysisRejected {
        /// Package name
        package: String,
        /// Suggested alternative libraries, free text
        alternatives: Option<String>,
    },

    /// Package lock could not be acquired in time.
    #[error("package {package} is locked by another install")]
    Locked {
        /// Package name
        package: String,
    },

    /// Generic I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Error walking a source tree.
    #[error("{0}")]
    WalkdirError(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error("{0}")]
    StripError(#[from] path::StripPrefixError),

    /// JSON serialization/deserialization error.
    #[error("{0}")]
    JsonError(#[from] serde_json::error::Error),

    /// HTTP client error.
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("{0}")]
    UrlParse(#[from] url::ParseError),

    /// Regular expression error.
    #[error("{0}")]
    RegexError(#[from] regex::Error),

    /// Handlebars template rendering error.
    #[error("{0}")]
    HandleBarsError(#[from] handlebars::RenderError),

    /// Handlebars template parsing error.
    #[error("{0}")]
    Template(#[from] handlebars::TemplateError),

    /// Generic error with custom message.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Returns the innermost error, skipping [`Error::Context`] wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context(_, inner) => inner.root(),
            other => other,
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.root(),
            Error::Network { .. } | Error::HttpError(_) | Error::Locked { .. }
        )
    }
}

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

fn alternatives_suffix(alternatives: &Option<String>) -> String {
    match alternatives {
        Some(text) => format!(": {text}"),
        None => String::new(),
    }
}

/// Convenient type alias for Result.
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for adding context to errors.
///
/// Similar to `anyhow::Context` but integrated with the pipeline's Error type.
/// Works with both `Result<T, E>` and `Option<T>`.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying artifact".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Macro for early return with error.
///
/// Converts the message into a [`Error::GenericError`] and returns immediately.
///
/// ```ignore
/// bail!("operation failed");
/// bail!("invalid value: {}", value);
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::manager::Error::GenericError($msg.into()))
    };
    ($err:expr $(,)?) => {
        return Err($crate::manager::Error::GenericError($err.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::manager::Error::GenericError(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_skips_context_layers() {
        let err: Result<()> = Err(Error::NotFound {
            what: "build descriptor".into(),
            path: PathBuf::from("/tmp/foo"),
        });
        let err = err.context("building foo").context("installing foo").unwrap_err();

        assert!(matches!(err.root(), Error::NotFound { .. }));
        assert!(err.to_string().starts_with("installing foo: building foo:"));
    }

    #[test]
    fn test_tool_invocation_message_includes_stderr() {
        let err = Error::ToolInvocation {
            command: "make".into(),
            status: Some(2),
            stderr: "no rule to make target".into(),
        };
        assert_eq!(err.to_string(), "make exited with 2: no rule to make target");
    }

    #[test]
    fn test_transient_classification() {
        let network = Error::Network {
            url: "https://example.com/a.tar.gz".into(),
            reason: "timed out".into(),
        };
        assert!(network.is_transient());

        let rejected = Error::AnalysisRejected {
            package: "foo".into(),
            alternatives: None,
        };
        assert!(!rejected.is_transient());
    }
}
