//! Validation engine.
//!
//! Runs the rule catalogue against one document and classifies the result.
//! A frontmatter parse failure short-circuits: the report carries a single
//! Error diagnostic and no further checks run for that document.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::frontmatter;
use crate::rules::{Context, Diagnostic, Rule, Severity};

/// Per-document verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Zero warnings and zero errors.
    FullyValid,
    /// At least one warning, no errors.
    ValidWithWarnings,
    /// At least one error.
    Invalid,
}

/// The validation result for a single document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileReport {
    /// The document that was validated.
    pub file: String,
    /// Overall verdict.
    pub classification: Classification,
    /// Everything the rules found, in catalogue order.
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    /// Returns `true` if the document has no errors.
    pub fn is_valid(&self) -> bool {
        self.classification != Classification::Invalid
    }
}

/// Classify a diagnostic list.
///
/// Info diagnostics never affect the verdict, so a document with only
/// informational findings still earns its single pass verdict.
fn classify(diagnostics: &[Diagnostic]) -> Classification {
    let worst = diagnostics.iter().map(|d| d.severity).max();
    match worst {
        Some(Severity::Error) => Classification::Invalid,
        Some(Severity::Warning) => Classification::ValidWithWarnings,
        _ => Classification::FullyValid,
    }
}

/// Validate one document.
///
/// Checking is order-insensitive; the catalogue order is only kept so the
/// output reads consistently run to run.
#[tracing::instrument(skip(raw, rules, ctx), fields(path))]
pub fn validate(path: &str, raw: &str, rules: &[Rule], ctx: &Context) -> FileReport {
    let doc = match frontmatter::parse(path, raw) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(path, error = %e, "frontmatter parse failed");
            return FileReport {
                file: path.to_string(),
                classification: Classification::Invalid,
                diagnostics: vec![Diagnostic::error(
                    "frontmatter",
                    format!("failed to parse frontmatter: {e}"),
                )],
            };
        }
    };

    let diagnostics: Vec<Diagnostic> = rules
        .iter()
        .flat_map(|rule| (rule.check)(&doc, ctx))
        .collect();
    let classification = classify(&diagnostics);

    FileReport {
        file: path.to_string(),
        classification,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rules::catalogue;

    fn validate_raw(raw: &str) -> FileReport {
        let rules = catalogue();
        let ctx = Context::new(&Config::default());
        validate("test.md", raw, &rules, &ctx)
    }

    #[test]
    fn clean_document_is_fully_valid() {
        let report =
            validate_raw("---\ndescription: Summarize the open pull requests\n---\nList them.\n");
        assert_eq!(report.classification, Classification::FullyValid);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn info_only_document_is_fully_valid() {
        let report = validate_raw(
            "---\ndescription: Show the current branch state\nallowed-tools: Bash(git status:*)\n---\nStatus: !`git status`, see @README.md\n",
        );
        assert_eq!(report.classification, Classification::FullyValid);
        assert!(report
            .diagnostics
            .iter()
            .all(|d| d.severity == Severity::Info));
    }

    #[test]
    fn warnings_classify_as_valid_with_warnings() {
        let report = validate_raw(
            "---\ndescription: Summarize the open pull requests\nmodel: mystery\n---\nbody\n",
        );
        assert_eq!(report.classification, Classification::ValidWithWarnings);
        assert!(report.is_valid());
    }

    #[test]
    fn errors_classify_as_invalid() {
        let report = validate_raw("---\ndescription: Summarize the open pull requests\n---\n\n");
        assert_eq!(report.classification, Classification::Invalid);
        assert!(!report.is_valid());
    }

    #[test]
    fn parse_failure_yields_exactly_one_error() {
        let report = validate_raw("---\ndescription: oops\nno closing marker\n");
        assert_eq!(report.classification, Classification::Invalid);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn no_frontmatter_is_only_a_warning() {
        let report = validate_raw("A body without any metadata.\n");
        assert_eq!(report.classification, Classification::ValidWithWarnings);
    }
}
