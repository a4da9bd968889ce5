//! Body convention detectors.
//!
//! Each convention a command body can carry — argument placeholders, inline
//! shell execution, file references, thinking-mode keywords — gets a named
//! detector returning a structured result. Rules compose these instead of
//! scattering pattern literals.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// The catch-all placeholder consumed as the entire argument string.
pub const CATCH_ALL_MARKER: &str = "$ARGUMENTS";

static POSITIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("valid regex"));

static SHELL_INVOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!`([^`]+)`").expect("valid regex"));

static FILE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([\w\-./]+)").expect("valid regex"));

/// Keywords that request extended thinking from the model.
const THINKING_KEYWORDS: &[&str] = &["<ultrathink>", "<megaexpertise>", "<think>", "<thinking>"];

/// Returns `true` if the body uses the catch-all argument marker.
pub fn has_catch_all(body: &str) -> bool {
    body.contains(CATCH_ALL_MARKER)
}

/// Positional argument indices referenced in the body (`$1`, `$2`, ...).
///
/// Indices are deduplicated and sorted; `$0` is included if present so the
/// caller sees exactly what the author wrote.
pub fn positional_indices(body: &str) -> BTreeSet<u32> {
    POSITIONAL
        .captures_iter(body)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Inline shell-execution commands (`!` immediately followed by a
/// backtick-delimited command).
pub fn shell_invocations(body: &str) -> Vec<&str> {
    SHELL_INVOCATION
        .captures_iter(body)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
        .collect()
}

/// File references (`@` followed by a path-like token).
pub fn file_references(body: &str) -> Vec<&str> {
    FILE_REFERENCE
        .captures_iter(body)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
        .collect()
}

/// Returns `true` if the body contains an extended-thinking keyword.
pub fn has_thinking_keywords(body: &str) -> bool {
    THINKING_KEYWORDS.iter().any(|kw| body.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catch_all_detection() {
        assert!(has_catch_all("Process $ARGUMENTS now"));
        assert!(!has_catch_all("Process $1 now"));
    }

    #[test]
    fn positional_indices_dedupe_and_sort() {
        let indices = positional_indices("use $3 then $1, then $3 again");
        assert_eq!(indices.into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn positional_ignores_catch_all() {
        assert!(positional_indices("only $ARGUMENTS here").is_empty());
    }

    #[test]
    fn shell_invocations_extract_commands() {
        let body = "Current status: !`git status`\nDiff: !`git diff HEAD`\n";
        assert_eq!(shell_invocations(body), vec!["git status", "git diff HEAD"]);
    }

    #[test]
    fn bare_backticks_are_not_invocations() {
        assert!(shell_invocations("use `git status` to check").is_empty());
    }

    #[test]
    fn file_references_extract_paths() {
        let body = "See @src/main.rs and @docs/guide.md.";
        assert_eq!(file_references(body), vec!["src/main.rs", "docs/guide.md"]);
    }

    #[test]
    fn thinking_keywords_detected() {
        assert!(has_thinking_keywords("Please <think> hard about this"));
        assert!(!has_thinking_keywords("No special markers"));
    }
}
