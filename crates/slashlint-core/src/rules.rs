//! Validation rule catalogue.
//!
//! Every check the validator runs against a parsed [`Document`] lives here
//! as an independent, pure function paired with a stable rule id. The
//! catalogue is an explicit ordered list built once at startup — no global
//! registry. Checking is order-insensitive; the auto-fixer relies on the
//! catalogue order because some fixes are preconditions for others.

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{Config, KNOWN_FIELDS};
use crate::detect;
use crate::document::{Document, Frontmatter, MetaValue};

/// Severity of a diagnostic.
///
/// `Pass` is never produced by a rule; the classification layer issues the
/// single per-document pass verdict.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Document-level verdict for a clean document.
    Pass,
    /// Informational note; never affects the verdict.
    Info,
    /// Style or discoverability issue; does not block usage.
    Warning,
    /// Violation that makes the document invalid.
    Error,
}

/// A single finding produced by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Diagnostic {
    /// Severity classification.
    pub severity: Severity,
    /// Stable id of the rule that produced this finding.
    pub rule: String,
    /// Human-readable description.
    pub message: String,
    /// 1-indexed line number, when the finding anchors to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Diagnostic {
    fn new(severity: Severity, rule: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            rule: rule.to_string(),
            message: message.into(),
            line: None,
        }
    }

    /// An `Error` diagnostic.
    pub fn error(rule: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, rule, message)
    }

    /// A `Warning` diagnostic.
    pub fn warning(rule: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, rule, message)
    }

    /// An `Info` diagnostic.
    pub fn info(rule: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, rule, message)
    }
}

/// Shared, pre-compiled state the checks need.
///
/// Built once per run from [`Config`]; rules receive it by reference so
/// pattern compilation is not repeated per document.
pub struct Context {
    tool_matchers: Vec<Regex>,
    models: Vec<String>,
    description_min: usize,
    description_max: usize,
}

impl Context {
    /// Compile a context from configuration.
    ///
    /// Invalid tool patterns are skipped with a tracing warning.
    pub fn new(config: &Config) -> Self {
        let tool_matchers = config
            .tool_patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(pattern, error = %e, "skipping invalid tool pattern");
                    None
                }
            })
            .collect();
        Self {
            tool_matchers,
            models: config.models.clone(),
            description_min: config.description_min_len,
            description_max: config.description_max_len,
        }
    }

    fn tool_is_known(&self, tool: &str) -> bool {
        self.tool_matchers.iter().any(|re| re.is_match(tool))
    }
}

/// A fix action: mutates the working copy, returns a description of what
/// was applied, or `None` when the fix does not apply to this document.
pub type FixFn = fn(&mut Option<Frontmatter>, &mut String) -> Option<String>;

/// A validation rule: a stable id, a pure check, and an optional fix.
pub struct Rule {
    /// Stable rule name, used in diagnostics and fix records.
    pub id: &'static str,
    /// Pure check; must not mutate the document.
    pub check: fn(&Document, &Context) -> Vec<Diagnostic>,
    /// Deterministic repair for this rule's violation, if one exists.
    pub fix: Option<FixFn>,
}

/// Build the rule catalogue.
///
/// Order matters for the fixer: sequence coercions come before the
/// synthesis fixes so later steps see normalized fields.
pub fn catalogue() -> Vec<Rule> {
    vec![
        Rule {
            id: "frontmatter",
            check: check_frontmatter_present,
            fix: None,
        },
        Rule {
            id: "known-fields",
            check: check_known_fields,
            fix: None,
        },
        Rule {
            id: "description",
            check: check_description,
            fix: Some(crate::fix::coerce_description),
        },
        Rule {
            id: "argument-hint",
            check: check_argument_hint,
            fix: Some(crate::fix::coerce_argument_hint),
        },
        Rule {
            id: "allowed-tools",
            check: check_allowed_tools,
            fix: None,
        },
        Rule {
            id: "model",
            check: check_model,
            fix: None,
        },
        Rule {
            id: "disable-model-invocation",
            check: check_disable_model_invocation,
            fix: None,
        },
        Rule {
            id: "body",
            check: check_body,
            fix: None,
        },
        Rule {
            id: "argument-style",
            check: check_argument_style,
            fix: None,
        },
        Rule {
            id: "argument-hint-missing",
            check: check_argument_hint_missing,
            fix: Some(crate::fix::synthesize_argument_hint),
        },
        Rule {
            id: "argument-hint-dangling",
            check: check_argument_hint_dangling,
            fix: None,
        },
        Rule {
            id: "shell-permission",
            check: check_shell_permission,
            fix: Some(crate::fix::synthesize_shell_permission),
        },
        Rule {
            id: "file-references",
            check: check_file_references,
            fix: None,
        },
        Rule {
            id: "thinking-mode",
            check: check_thinking_mode,
            fix: None,
        },
    ]
}

/// Returns `true` if `allowed-tools` names the shell-execution capability.
///
/// Matches on the joined field text, so `Bash(git add:*)` counts.
pub(crate) fn declares_bash(frontmatter: Option<&Frontmatter>) -> bool {
    let Some(value) = frontmatter.and_then(|fm| fm.get("allowed-tools")) else {
        return false;
    };
    match value {
        MetaValue::Str(s) => s.contains("Bash"),
        MetaValue::Seq(items) => items.iter().any(|item| item.contains("Bash")),
        MetaValue::Bool(_) => false,
    }
}

fn check_frontmatter_present(doc: &Document, _ctx: &Context) -> Vec<Diagnostic> {
    if doc.frontmatter.is_none() {
        vec![Diagnostic::warning(
            "frontmatter",
            "no frontmatter found; consider adding a 'description' field",
        )]
    } else {
        Vec::new()
    }
}

fn check_known_fields(doc: &Document, _ctx: &Context) -> Vec<Diagnostic> {
    let Some(fm) = &doc.frontmatter else {
        return Vec::new();
    };
    let unknown: Vec<&str> = fm
        .names()
        .filter(|name| !KNOWN_FIELDS.contains(name))
        .collect();
    if unknown.is_empty() {
        Vec::new()
    } else {
        vec![Diagnostic::warning(
            "known-fields",
            format!("unknown frontmatter fields: {}", unknown.join(", ")),
        )]
    }
}

fn check_description(doc: &Document, ctx: &Context) -> Vec<Diagnostic> {
    let Some(fm) = &doc.frontmatter else {
        return Vec::new();
    };
    let Some(value) = fm.get("description") else {
        return vec![Diagnostic::warning(
            "description",
            "missing 'description' field (recommended for /help listing)",
        )];
    };
    match value {
        MetaValue::Str(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                vec![Diagnostic::error("description", "'description' is empty")]
            } else if trimmed.chars().count() < ctx.description_min {
                vec![Diagnostic::warning(
                    "description",
                    format!(
                        "'description' is very short (<{} chars); add detail",
                        ctx.description_min
                    ),
                )]
            } else if trimmed.chars().count() > ctx.description_max {
                vec![Diagnostic::warning(
                    "description",
                    format!(
                        "'description' is very long (>{} chars); consider shortening",
                        ctx.description_max
                    ),
                )]
            } else {
                Vec::new()
            }
        }
        MetaValue::Seq(_) => vec![Diagnostic::warning(
            "description",
            "'description' is a sequence; it should be a single string",
        )],
        MetaValue::Bool(_) => vec![Diagnostic::error(
            "description",
            "'description' must be a string",
        )],
    }
}

fn check_argument_hint(doc: &Document, _ctx: &Context) -> Vec<Diagnostic> {
    let Some(value) = doc
        .frontmatter
        .as_ref()
        .and_then(|fm| fm.get("argument-hint"))
    else {
        return Vec::new();
    };
    match value {
        MetaValue::Str(s) if s.trim().is_empty() => vec![Diagnostic::warning(
            "argument-hint",
            "'argument-hint' is empty",
        )],
        MetaValue::Str(_) => Vec::new(),
        MetaValue::Seq(_) => vec![Diagnostic::warning(
            "argument-hint",
            "'argument-hint' is a sequence; it should be a single string",
        )],
        MetaValue::Bool(_) => vec![Diagnostic::error(
            "argument-hint",
            "'argument-hint' must be a string",
        )],
    }
}

fn check_allowed_tools(doc: &Document, ctx: &Context) -> Vec<Diagnostic> {
    let Some(value) = doc
        .frontmatter
        .as_ref()
        .and_then(|fm| fm.get("allowed-tools"))
    else {
        return Vec::new();
    };
    let tools: Vec<String> = match value {
        MetaValue::Str(s) => s.split(',').map(|t| t.trim().to_string()).collect(),
        MetaValue::Seq(items) => items.iter().map(|t| t.trim().to_string()).collect(),
        MetaValue::Bool(_) => {
            return vec![Diagnostic::error(
                "allowed-tools",
                "'allowed-tools' must be a string or a list of tool names",
            )];
        }
    };
    tools
        .iter()
        .filter(|tool| !tool.is_empty() && !ctx.tool_is_known(tool))
        .map(|tool| {
            Diagnostic::warning(
                "allowed-tools",
                format!("tool '{tool}' may not be a valid tool name"),
            )
        })
        .collect()
}

fn check_model(doc: &Document, ctx: &Context) -> Vec<Diagnostic> {
    let Some(value) = doc.frontmatter.as_ref().and_then(|fm| fm.get("model")) else {
        return Vec::new();
    };
    match value {
        MetaValue::Str(model) => {
            if ctx.models.iter().any(|known| known == model) {
                Vec::new()
            } else {
                vec![Diagnostic::warning(
                    "model",
                    format!("model '{model}' may not be valid; check the documentation"),
                )]
            }
        }
        _ => vec![Diagnostic::error("model", "'model' must be a string")],
    }
}

fn check_disable_model_invocation(doc: &Document, _ctx: &Context) -> Vec<Diagnostic> {
    let Some(value) = doc
        .frontmatter
        .as_ref()
        .and_then(|fm| fm.get("disable-model-invocation"))
    else {
        return Vec::new();
    };
    if value.as_bool().is_some() {
        Vec::new()
    } else {
        vec![Diagnostic::error(
            "disable-model-invocation",
            "'disable-model-invocation' must be a boolean (true/false)",
        )]
    }
}

fn check_body(doc: &Document, _ctx: &Context) -> Vec<Diagnostic> {
    if doc.body.trim().is_empty() {
        vec![Diagnostic::error("body", "file has no content after frontmatter")]
    } else {
        Vec::new()
    }
}

fn check_argument_style(doc: &Document, _ctx: &Context) -> Vec<Diagnostic> {
    if detect::has_catch_all(&doc.body) && !detect::positional_indices(&doc.body).is_empty() {
        vec![Diagnostic::warning(
            "argument-style",
            "mixed usage of $ARGUMENTS and positional arguments ($1, $2); use one style",
        )]
    } else {
        Vec::new()
    }
}

fn check_argument_hint_missing(doc: &Document, _ctx: &Context) -> Vec<Diagnostic> {
    let uses_arguments =
        detect::has_catch_all(&doc.body) || !detect::positional_indices(&doc.body).is_empty();
    let has_hint = doc
        .frontmatter
        .as_ref()
        .is_some_and(|fm| fm.contains("argument-hint"));
    if uses_arguments && !has_hint {
        vec![Diagnostic::warning(
            "argument-hint-missing",
            "arguments detected but no 'argument-hint' in frontmatter",
        )]
    } else {
        Vec::new()
    }
}

fn check_argument_hint_dangling(doc: &Document, _ctx: &Context) -> Vec<Diagnostic> {
    let has_hint = doc
        .frontmatter
        .as_ref()
        .is_some_and(|fm| fm.contains("argument-hint"));
    let uses_arguments =
        detect::has_catch_all(&doc.body) || !detect::positional_indices(&doc.body).is_empty();
    if has_hint && !uses_arguments {
        vec![Diagnostic::warning(
            "argument-hint-dangling",
            "'argument-hint' specified but no $ARGUMENTS or $N found in body",
        )]
    } else {
        Vec::new()
    }
}

fn check_shell_permission(doc: &Document, _ctx: &Context) -> Vec<Diagnostic> {
    let invocations = detect::shell_invocations(&doc.body);
    if invocations.is_empty() {
        return Vec::new();
    }
    let mut diagnostics = vec![Diagnostic::info(
        "shell-permission",
        format!("found {} shell command execution(s)", invocations.len()),
    )];
    if !declares_bash(doc.frontmatter.as_ref()) {
        diagnostics.push(Diagnostic::error(
            "shell-permission",
            "shell execution markers found but 'Bash' is not in allowed-tools",
        ));
    }
    diagnostics
}

fn check_file_references(doc: &Document, _ctx: &Context) -> Vec<Diagnostic> {
    let refs = detect::file_references(&doc.body);
    if refs.is_empty() {
        Vec::new()
    } else {
        vec![Diagnostic::info(
            "file-references",
            format!("found {} file reference(s)", refs.len()),
        )]
    }
}

fn check_thinking_mode(doc: &Document, _ctx: &Context) -> Vec<Diagnostic> {
    if detect::has_thinking_keywords(&doc.body) {
        vec![Diagnostic::info(
            "thinking-mode",
            "extended thinking mode detected",
        )]
    } else {
        Vec::new()
    }
}
