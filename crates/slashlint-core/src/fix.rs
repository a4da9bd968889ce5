//! Deterministic auto-fixer.
//!
//! Applies the subset of rules that declare a fix action, in catalogue
//! order: frontmatter syntax repair (pre-parse), sequence-to-string
//! coercions, argument-hint synthesis, then shell-permission synthesis.
//! Each step re-evaluates its precondition against the current working
//! copy, so later steps see the effects of earlier ones.
//!
//! Running the fixer twice in succession on its own output produces zero
//! additional records and byte-identical text.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::detect;
use crate::document::{Frontmatter, MetaValue};
use crate::error::{FrontmatterError, ParseResult};
use crate::frontmatter;
use crate::rules::{self, Rule};

/// One fix actually applied to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FixRecord {
    /// Id of the rule whose fix was applied.
    pub rule: String,
    /// What the fix did.
    pub description: String,
}

/// The result of fixing one document.
#[derive(Debug, Clone)]
pub struct FixOutcome {
    /// The document text after all applicable fixes. Byte-identical to the
    /// input when `records` is empty.
    pub text: String,
    /// Fixes applied, in application order. Empty means "no write needed".
    pub records: Vec<FixRecord>,
}

impl FixOutcome {
    /// Returns `true` if any fix was applied.
    pub fn changed(&self) -> bool {
        !self.records.is_empty()
    }
}

/// Fix a document's text.
///
/// The input is never mutated; the rewritten text is returned alongside
/// the records of what changed. A document whose frontmatter cannot be
/// parsed even after the one-shot syntax repair fails with the parse
/// error — the caller reports it and leaves the file untouched.
#[tracing::instrument(skip_all, fields(path))]
pub fn fix_text(path: &str, raw: &str, rules: &[Rule]) -> ParseResult<FixOutcome> {
    let mut records = Vec::new();

    // Step 1: parse, with a single repair-and-retry on decode failure.
    let doc = match frontmatter::parse(path, raw) {
        Ok(doc) => doc,
        // A block with no closing marker is never auto-repaired.
        Err(FrontmatterError::Unterminated) => return Err(FrontmatterError::Unterminated),
        Err(first_err) => match frontmatter::repair_brackets(raw) {
            Some((repaired, touched)) => {
                let doc = frontmatter::parse(path, &repaired)?;
                for field in touched {
                    records.push(FixRecord {
                        rule: "frontmatter".to_string(),
                        description: format!("quoted square brackets in '{field}' field"),
                    });
                }
                tracing::debug!(path, "frontmatter repaired");
                doc
            }
            None => return Err(first_err),
        },
    };

    let syntax_repairs = records.len();
    let mut fm = doc.frontmatter.clone();
    let mut body = doc.body.clone();

    // Steps 2-4: rule fixes in catalogue order, each against the current
    // working copy.
    for rule in rules {
        let Some(fix) = rule.fix else { continue };
        if let Some(description) = fix(&mut fm, &mut body) {
            tracing::debug!(path, rule = rule.id, %description, "fix applied");
            records.push(FixRecord {
                rule: rule.id.to_string(),
                description,
            });
        }
    }

    let text = if records.len() > syntax_repairs {
        // At least one fix mutated the mapping: canonical re-emission.
        frontmatter::serialize(fm.as_ref().unwrap_or(&Frontmatter::new()), &body)
    } else if syntax_repairs > 0 {
        // Only the syntax repair applied; its rewrite is already verbatim.
        doc.to_text()
    } else {
        raw.to_string()
    };

    Ok(FixOutcome { text, records })
}

/// Join sequence items into a single space-separated string.
fn coerce_seq_field(fm: &mut Option<Frontmatter>, field: &str) -> Option<String> {
    let mapping = fm.as_mut()?;
    let items = mapping.get(field)?.as_seq()?.to_vec();
    mapping.set(field, MetaValue::Str(items.join(" ")));
    Some(format!("converted '{field}' from sequence to string"))
}

/// Coerce a sequence-valued `description` to its canonical string form.
pub(crate) fn coerce_description(fm: &mut Option<Frontmatter>, _body: &mut String) -> Option<String> {
    coerce_seq_field(fm, "description")
}

/// Coerce a sequence-valued `argument-hint` to its canonical string form.
pub(crate) fn coerce_argument_hint(
    fm: &mut Option<Frontmatter>,
    _body: &mut String,
) -> Option<String> {
    coerce_seq_field(fm, "argument-hint")
}

/// Add an `argument-hint` when the body uses placeholders and no hint
/// exists. The catch-all marker takes precedence over positional markers,
/// mirroring the detection order.
pub(crate) fn synthesize_argument_hint(
    fm: &mut Option<Frontmatter>,
    body: &mut String,
) -> Option<String> {
    if fm.as_ref().is_some_and(|m| m.contains("argument-hint")) {
        return None;
    }
    if detect::has_catch_all(body) {
        fm.get_or_insert_with(Frontmatter::new)
            .set("argument-hint", MetaValue::Str("[args]".to_string()));
        return Some("added generic argument-hint for $ARGUMENTS usage".to_string());
    }
    let max_index = detect::positional_indices(body).into_iter().max()?;
    if max_index == 0 {
        // `$0` alone names no real argument.
        return None;
    }
    let hint = (1..=max_index)
        .map(|i| format!("[arg{i}]"))
        .collect::<Vec<_>>()
        .join(" ");
    fm.get_or_insert_with(Frontmatter::new)
        .set("argument-hint", MetaValue::Str(hint));
    Some(format!(
        "added argument-hint for positional arguments ($1-${max_index})"
    ))
}

/// Add `Bash` to `allowed-tools` when the body embeds shell execution
/// markers and the capability is not declared. Preserves the field's
/// existing shape; a newly created field is a bare string.
pub(crate) fn synthesize_shell_permission(
    fm: &mut Option<Frontmatter>,
    body: &mut String,
) -> Option<String> {
    if detect::shell_invocations(body).is_empty() {
        return None;
    }
    if rules::declares_bash(fm.as_ref()) {
        return None;
    }
    let mapping = fm.get_or_insert_with(Frontmatter::new);
    match mapping.get("allowed-tools") {
        None => {
            mapping.set("allowed-tools", MetaValue::Str("Bash".to_string()));
            Some("created allowed-tools with 'Bash'".to_string())
        }
        Some(MetaValue::Str(existing)) => {
            let appended = if existing.trim().is_empty() {
                "Bash".to_string()
            } else {
                format!("{existing}, Bash")
            };
            mapping.set("allowed-tools", MetaValue::Str(appended));
            Some("added 'Bash' to allowed-tools".to_string())
        }
        Some(MetaValue::Seq(items)) => {
            let mut items = items.to_vec();
            items.push("Bash".to_string());
            mapping.set("allowed-tools", MetaValue::Seq(items));
            Some("added 'Bash' to allowed-tools".to_string())
        }
        // A boolean field is a type error the validator owns; appending
        // to it would hide the problem.
        Some(MetaValue::Bool(_)) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::catalogue;

    fn fix(raw: &str) -> FixOutcome {
        fix_text("test.md", raw, &catalogue()).unwrap()
    }

    fn hint_of(text: &str) -> Option<String> {
        frontmatter::parse("test.md", text)
            .unwrap()
            .frontmatter?
            .get("argument-hint")?
            .as_str()
            .map(ToString::to_string)
    }

    #[test]
    fn clean_document_is_untouched() {
        let raw = "---\ndescription: A perfectly fine command\n---\nDo the thing.\n";
        let outcome = fix(raw);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.text, raw);
    }

    #[test]
    fn sequence_description_joins_with_spaces() {
        let raw = "---\ndescription:\n  - Part one.\n  - Part two.\n---\nbody\n";
        let outcome = fix(raw);
        assert_eq!(outcome.records.len(), 1);
        let doc = frontmatter::parse("test.md", &outcome.text).unwrap();
        assert_eq!(
            doc.frontmatter.unwrap().get("description").unwrap().as_str(),
            Some("Part one. Part two.")
        );
    }

    #[test]
    fn hint_synthesis_fills_gaps() {
        // $1 and $3 with no $2: contiguous naming up to the max index.
        let outcome = fix("Compare $1 against $3.\n");
        assert_eq!(hint_of(&outcome.text).unwrap(), "[arg1] [arg2] [arg3]");
    }

    #[test]
    fn hint_synthesis_prefers_catch_all() {
        let outcome = fix("Run with $ARGUMENTS, or maybe $1.\n");
        assert_eq!(hint_of(&outcome.text).unwrap(), "[args]");
    }

    #[test]
    fn hint_synthesis_respects_existing_hint() {
        let raw = "---\nargument-hint: '[file]'\n---\nProcess $1.\n";
        let outcome = fix(raw);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.text, raw);
    }

    #[test]
    fn permission_appends_to_string_field() {
        let raw = "---\nallowed-tools: Edit\n---\nRun !`cargo test` first.\n";
        let outcome = fix(raw);
        let doc = frontmatter::parse("test.md", &outcome.text).unwrap();
        assert_eq!(
            doc.frontmatter.unwrap().get("allowed-tools").unwrap().as_str(),
            Some("Edit, Bash")
        );
    }

    #[test]
    fn permission_appends_to_sequence_field() {
        let raw = "---\nallowed-tools:\n  - Edit\n  - Read\n---\nRun !`cargo test` first.\n";
        let outcome = fix(raw);
        let doc = frontmatter::parse("test.md", &outcome.text).unwrap();
        assert_eq!(
            doc.frontmatter.unwrap().get("allowed-tools").unwrap().as_seq().unwrap(),
            &["Edit".to_string(), "Read".to_string(), "Bash".to_string()]
        );
    }

    #[test]
    fn permission_created_when_field_absent() {
        let outcome = fix("Run !`git status` now.\n");
        let doc = frontmatter::parse("test.md", &outcome.text).unwrap();
        assert_eq!(
            doc.frontmatter.unwrap().get("allowed-tools").unwrap().as_str(),
            Some("Bash")
        );
    }

    #[test]
    fn permission_not_duplicated() {
        let raw = "---\nallowed-tools: Bash(git status:*)\n---\nStatus: !`git status`\n";
        let outcome = fix(raw);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.text, raw);
    }

    #[test]
    fn bracket_repair_then_field_fixes_compose() {
        // Unquoted brackets break the parse; after repair the hint exists,
        // so synthesis must not run.
        let raw = "---\nargument-hint: [file] [pattern]\n---\nProcess $1 and $2.\n";
        let outcome = fix(raw);
        assert!(outcome
            .records
            .iter()
            .any(|r| r.description.contains("square brackets")));
        assert_eq!(hint_of(&outcome.text).unwrap(), "[file] [pattern]");
    }

    #[test]
    fn unterminated_block_fails_and_is_not_rewritten() {
        let raw = "---\ndescription: oops\nno closing marker\n";
        let err = fix_text("test.md", raw, &catalogue()).unwrap_err();
        assert!(matches!(err, FrontmatterError::Unterminated));
    }

    #[test]
    fn fixer_is_idempotent() {
        let inputs = [
            "---\ndescription:\n  - One.\n  - Two.\n---\nRun !`ls` with $1 and $3.\n",
            "Run with $ARGUMENTS.\n",
            "---\nallowed-tools: Edit\n---\n!`make build`\n",
            "---\nargument-hint: [file] [pattern]\n---\nProcess $1.\n",
        ];
        for raw in inputs {
            let first = fix(raw);
            assert!(first.changed(), "expected fixes for {raw:?}");
            let second = fix(&first.text);
            assert!(second.records.is_empty(), "second pass fixed {raw:?} again");
            assert_eq!(second.text, first.text);
        }
    }

    #[test]
    fn multiple_fixes_record_in_order() {
        let raw = "---\ndescription:\n  - One.\n  - Two.\n---\nRun !`ls` with $1.\n";
        let outcome = fix(raw);
        let rules: Vec<&str> = outcome.records.iter().map(|r| r.rule.as_str()).collect();
        assert_eq!(
            rules,
            vec!["description", "argument-hint-missing", "shell-permission"]
        );
    }
}
