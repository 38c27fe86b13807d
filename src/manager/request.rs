//! Caller-supplied package install requests.

use crate::bail;
use crate::manager::error::Result;

/// One package install, as requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    /// Package name; also names every workspace entry for this package
    pub name: String,
    /// Remote `.tar.gz` URL, `file://` URL or local path
    pub source_url: Option<String>,
    /// Target platform string (`native`, `mobile`, `translate`, ...)
    pub target_platform: String,
    /// Output language when translating
    pub language: Option<String>,
    /// Named install environment under the managed root
    pub install_env: Option<String>,
}

impl PackageRequest {
    /// Native build request with no explicit source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_url: None,
            target_platform: "native".to_string(),
            language: None,
            install_env: None,
        }
    }

    /// Sets the source URL.
    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Sets the target platform string.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target_platform = target.into();
        self
    }

    /// Sets the translation language.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the install environment.
    pub fn install_env(mut self, env: impl Into<String>) -> Self {
        self.install_env = Some(env.into());
        self
    }

    /// Rejects names that would escape their workspace directories.
    pub fn validate(&self) -> Result<()> {
        validate_component("package name", &self.name)?;
        if let Some(env) = &self.install_env {
            validate_component("install environment", env)?;
        }
        Ok(())
    }
}

/// Ensures `value` is usable as a single path component.
pub(crate) fn validate_component(what: &str, value: &str) -> Result<()> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.contains('\0');

    if invalid {
        bail!("invalid {}: {:?}", what, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_to_native() {
        let request = PackageRequest::new("foo");
        assert_eq!(request.target_platform, "native");
        assert!(request.source_url.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_rejects_path_like_names() {
        assert!(PackageRequest::new("../etc").validate().is_err());
        assert!(PackageRequest::new("a/b").validate().is_err());
        assert!(PackageRequest::new("").validate().is_err());
        assert!(
            PackageRequest::new("foo")
                .install_env("..")
                .validate()
                .is_err()
        );
    }
}
