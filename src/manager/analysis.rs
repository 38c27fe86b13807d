//! Suitability gate run between normalization and building.
//!
//! The decision itself belongs to an injected [`SuitabilityPolicy`]; this
//! module only gathers the input, applies the verdict and reports whether
//! the gate ran at all.

use crate::manager::{
    build::{BuildTarget, translate::find_canonical_source},
    error::{Error, ErrorExt, Result},
};
use regex::Regex;
use std::path::Path;
use std::sync::Arc;

/// Outcome of a suitability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the pipeline may continue
    pub allowed: bool,
    /// Suggested alternatives, free text
    pub alternatives: Option<String>,
}

impl Verdict {
    /// Lets the package through.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            alternatives: None,
        }
    }

    /// Stops the package, optionally naming alternatives.
    pub fn reject(alternatives: Option<String>) -> Self {
        Self {
            allowed: false,
            alternatives,
        }
    }
}

/// Decides whether a package is suitable for its requested target.
///
/// Implementations must not block on user input; interactive overrides
/// belong to the CLI layer.
pub trait SuitabilityPolicy: Send + Sync {
    /// Evaluates `source_text` of `package_name` for `target`.
    fn evaluate(&self, source_text: &str, package_name: &str, target: &BuildTarget) -> Verdict;
}

impl<F> SuitabilityPolicy for F
where
    F: Fn(&str, &str, &BuildTarget) -> Verdict + Send + Sync,
{
    fn evaluate(&self, source_text: &str, package_name: &str, target: &BuildTarget) -> Verdict {
        self(source_text, package_name, target)
    }
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl SuitabilityPolicy for AllowAll {
    fn evaluate(&self, _source_text: &str, _package_name: &str, _target: &BuildTarget) -> Verdict {
        Verdict::allow()
    }
}

/// Pattern-based policy.
///
/// Native builds are always allowed. Mobile builds reject system-level code
/// (process control, raw syscalls, OS headers). Translations additionally
/// reject network code.
#[derive(Debug, Clone)]
pub struct HeuristicPolicy {
    network: Regex,
    system: Regex,
}

impl HeuristicPolicy {
    /// Compiles the built-in patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            network: Regex::new(
                r"\b(socket|connect|getaddrinfo|curl_easy_\w+|urllib|requests\.\w+|XMLHttpRequest|fetch)\b|https?://",
            )?,
            system: Regex::new(
                r"\b(fork|execv?p?e?|ioctl|mmap|ptrace|syscall|setuid|os\.system|subprocess)\b|#include\s*<(sys/[\w/]+|linux/[\w/]+|unistd)\.h>",
            )?,
        })
    }

    fn findings(&self, pattern: &Regex, text: &str) -> Vec<String> {
        let mut found: Vec<String> = pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
        found.sort();
        found.dedup();
        found
    }
}

impl SuitabilityPolicy for HeuristicPolicy {
    fn evaluate(&self, source_text: &str, package_name: &str, target: &BuildTarget) -> Verdict {
        let mut flagged = match target {
            BuildTarget::Native => return Verdict::allow(),
            BuildTarget::Mobile => self.findings(&self.system, source_text),
            BuildTarget::Translate(_) => {
                let mut found = self.findings(&self.system, source_text);
                found.extend(self.findings(&self.network, source_text));
                found
            }
        };

        if flagged.is_empty() {
            return Verdict::allow();
        }

        flagged.sort();
        flagged.dedup();
        Verdict::reject(Some(format!(
            "{} uses {} which does not carry over to the {} target; \
             look for a portable library covering the same functionality",
            package_name,
            flagged.join(", "),
            target
        )))
    }
}

/// Whether the gate ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStatus {
    /// No assistant credentials; gate skipped
    NotConfigured,
    /// Nothing to analyze; gate skipped
    NoSource,
    /// Policy accepted the package
    Allowed,
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisStatus::NotConfigured => write!(f, "not configured"),
            AnalysisStatus::NoSource => write!(f, "skipped (no canonical source)"),
            AnalysisStatus::Allowed => write!(f, "allowed"),
        }
    }
}

/// Runs the injected policy against an extracted source tree.
#[derive(Clone)]
pub struct SuitabilityAnalyzer {
    policy: Arc<dyn SuitabilityPolicy>,
    configured: bool,
}

impl std::fmt::Debug for SuitabilityAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuitabilityAnalyzer")
            .field("configured", &self.configured)
            .finish_non_exhaustive()
    }
}

impl SuitabilityAnalyzer {
    /// Analyzer applying `policy`; `configured` is false when the
    /// assistant has no credentials.
    pub fn new(policy: Arc<dyn SuitabilityPolicy>, configured: bool) -> Self {
        Self { policy, configured }
    }

    /// Evaluates the package at `extracted_dir`.
    ///
    /// A rejection is returned as [`Error::AnalysisRejected`].
    pub async fn analyze(&self, extracted_dir: &Path, name: &str, target: &BuildTarget) -> Result<AnalysisStatus> {
        if !self.configured {
            log::info!("Suitability analysis not configured, skipping");
            return Ok(AnalysisStatus::NotConfigured);
        }

        let Some(source) = find_canonical_source(extracted_dir) else {
            log::debug!("No canonical source in {}, skipping analysis", extracted_dir.display());
            return Ok(AnalysisStatus::NoSource);
        };

        let bytes = tokio::fs::read(&source)
            .await
            .fs_context("reading source for analysis", &source)?;
        let source_text = String::from_utf8_lossy(&bytes);

        let verdict = self.policy.evaluate(&source_text, name, target);

        if verdict.allowed {
            log::info!("Suitability analysis allowed {}", name);
            Ok(AnalysisStatus::Allowed)
        } else {
            log::warn!("Suitability analysis rejected {}", name);
            Err(Error::AnalysisRejected {
                package: name.to_string(),
                alternatives: verdict.alternatives,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_heuristic_native_always_allowed() {
        let policy = HeuristicPolicy::new().unwrap();
        let verdict = policy.evaluate("int main() { fork(); }", "foo", &BuildTarget::Native);
        assert!(verdict.allowed);
    }

    #[test]
    fn test_heuristic_mobile_rejects_system_code() {
        let policy = HeuristicPolicy::new().unwrap();
        let src = "#include <unistd.h>\nint main() { return fork(); }\n";
        let verdict = policy.evaluate(src, "foo", &BuildTarget::Mobile);

        assert!(!verdict.allowed);
        let alternatives = verdict.alternatives.unwrap();
        assert!(alternatives.contains("fork"));
    }

    #[test]
    fn test_heuristic_translate_rejects_network_code() {
        let policy = HeuristicPolicy::new().unwrap();
        let target = BuildTarget::Translate("python".into());
        let src = "int s = socket(AF_INET, SOCK_STREAM, 0);";

        assert!(!policy.evaluate(src, "foo", &target).allowed);
        assert!(policy.evaluate(src, "foo", &BuildTarget::Mobile).allowed);
    }

    #[tokio::test]
    async fn test_not_configured_skips_policy() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("main.c"), "int main;").unwrap();
        let analyzer = SuitabilityAnalyzer::new(
            Arc::new(|_: &str, _: &str, _: &BuildTarget| Verdict::reject(None)),
            false,
        );

        let status = analyzer
            .analyze(temp.path(), "foo", &BuildTarget::Native)
            .await
            .unwrap();
        assert_eq!(status, AnalysisStatus::NotConfigured);
    }

    #[tokio::test]
    async fn test_rejection_carries_alternatives() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("main.c"), "int main;").unwrap();
        let analyzer = SuitabilityAnalyzer::new(
            Arc::new(|_: &str, package: &str, _: &BuildTarget| {
                Verdict::reject(Some(format!("use lib{}-portable", package)))
            }),
            true,
        );

        let err = analyzer
            .analyze(temp.path(), "foo", &BuildTarget::Native)
            .await
            .unwrap_err();
        match err {
            Error::AnalysisRejected { package, alternatives } => {
                assert_eq!(package, "foo");
                assert_eq!(alternatives.as_deref(), Some("use libfoo-portable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_source_skips_policy() {
        let temp = TempDir::new().unwrap();
        let analyzer = SuitabilityAnalyzer::new(Arc::new(AllowAll), true);
        let status = analyzer
            .analyze(temp.path(), "foo", &BuildTarget::Mobile)
            .await
            .unwrap();
        assert_eq!(status, AnalysisStatus::NoSource);
    }
}
