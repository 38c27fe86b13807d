//! Source translation backend.
//!
//! The translation itself is delegated to a [`Translator`]. Only its
//! input/output contract matters here: source text in, target-language text
//! out, written next to the source as `<name>.<language>`.

use super::BuildOutcome;
use crate::manager::{
    error::{Error, ErrorExt, Result},
    request::validate_component,
};
use std::path::{Path, PathBuf};

/// Candidate entry-point files, in lookup order.
pub const CANONICAL_SOURCES: &[&str] = &["main.c", "main.cpp", "main.py", "main.js"];

/// First canonical source file present in `dir`.
pub fn find_canonical_source(dir: &Path) -> Option<PathBuf> {
    CANONICAL_SOURCES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Converts source text into another language.
pub trait Translator: Send + Sync {
    /// Translates `source_text` into `language`.
    fn translate(&self, source_text: &str, language: &str) -> String;
}

/// Offline translator that wraps the original lines in an entry point.
///
/// `javascript` and `python` are supported; anything else gets a stub
/// comment instead of failing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateTranslator;

impl Translator for TemplateTranslator {
    fn translate(&self, source_text: &str, language: &str) -> String {
        match language {
            "javascript" => format!("function main() {{\n{}}}\n", indent(source_text)),
            "python" => {
                let body = indent(source_text);
                if body.is_empty() {
                    "def main():\n    pass\n".to_string()
                } else {
                    format!("def main():\n{}", body)
                }
            }
            other => format!("// {} translation placeholder\n", other),
        }
    }
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("    {}\n", line)).collect()
}

/// Translates the canonical source in `dir` and writes `<dir>/<name>.<language>`.
pub async fn translate(
    translator: &dyn Translator,
    dir: &Path,
    name: &str,
    language: &str,
) -> Result<BuildOutcome> {
    validate_component("translation language", language)?;
    let source = find_canonical_source(dir).ok_or_else(|| Error::NotFound {
        what: format!("canonical source ({})", CANONICAL_SOURCES.join(", ")),
        path: dir.to_path_buf(),
    })?;

    let bytes = tokio::fs::read(&source)
        .await
        .fs_context("reading source for translation", &source)?;
    let translated = translator.translate(&String::from_utf8_lossy(&bytes), language);

    let output = dir.join(format!("{}.{}", name, language));
    tokio::fs::write(&output, translated)
        .await
        .fs_context("writing translated source", &output)?;

    log::info!("Translated {} to {}", source.display(), output.display());
    Ok(BuildOutcome::Translated { output })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_javascript_wraps_lines() {
        let out = TemplateTranslator.translate("int x = 1;\nreturn x;", "javascript");
        assert_eq!(out, "function main() {\n    int x = 1;\n    return x;\n}\n");
    }

    #[test]
    fn test_unsupported_language_gets_stub() {
        let out = TemplateTranslator.translate("int x;", "cobol");
        assert!(out.starts_with("// cobol"));
    }

    #[tokio::test]
    async fn test_canonical_source_order() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("main.js"), "x").unwrap();
        std::fs::write(temp.path().join("main.cpp"), "y").unwrap();
        assert_eq!(find_canonical_source(temp.path()), Some(temp.path().join("main.cpp")));
    }

    #[tokio::test]
    async fn test_missing_source_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = translate(&TemplateTranslator, temp.path(), "bar", "python")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_path_like_language_writes_nothing() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("main.c"), "int main;\n").unwrap();

        for language in ["../escape", "a/b", ".."] {
            assert!(translate(&TemplateTranslator, temp.path(), "bar", language).await.is_err());
        }
        let entries = std::fs::read_dir(temp.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_writes_named_output() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("main.c"), "puts(\"hi\");\n").unwrap();

        let outcome = translate(&TemplateTranslator, temp.path(), "bar", "javascript")
            .await
            .unwrap();
        let output = temp.path().join("bar.javascript");
        assert_eq!(outcome, BuildOutcome::Translated { output: output.clone() });
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "function main() {\n    puts(\"hi\");\n}\n"
        );
    }
}
