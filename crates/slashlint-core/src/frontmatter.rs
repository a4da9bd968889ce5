//! Frontmatter extraction, decoding, and re-serialization.
//!
//! A command document may open with a metadata block delimited by `---`
//! marker lines. Parsing is lossless: the verbatim block is retained on the
//! [`Document`] so an unfixed document re-serializes to its original bytes.
//! Canonical YAML re-emission only happens after the fixer has mutated the
//! mapping.

use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;

use crate::document::{Document, Frontmatter, MetaValue};
use crate::error::{FrontmatterError, ParseResult};

/// Result of locating the frontmatter block within raw text.
#[derive(Debug, PartialEq, Eq)]
enum Split<'a> {
    /// No opening marker; the whole text is body.
    NoBlock,
    /// Opening marker with no closing marker.
    Unterminated,
    /// A complete block.
    Block {
        /// Interior YAML text, without the marker lines.
        yaml: &'a str,
        /// Byte offset where the body starts (first character after the
        /// closing marker's line break).
        body_start: usize,
    },
}

/// Locate the frontmatter block, if any.
///
/// The opening marker must be the very first line. The closing marker must
/// sit on its own line (`\n---\n`, `\n---\r\n`, or `\n---` at end of input).
fn split(raw: &str) -> Split<'_> {
    let yaml_start = if let Some(rest) = raw.strip_prefix("---") {
        if rest.starts_with('\n') {
            4
        } else if rest.starts_with("\r\n") {
            5
        } else {
            // `----`, `--- foo`, etc. is an ordinary first line.
            return Split::NoBlock;
        }
    } else {
        return Split::NoBlock;
    };

    // Search from the opening line's own newline so a closing marker on
    // the very next line (an empty block) is still found.
    let base = yaml_start - 1;
    let tail = &raw[base..];
    let closing = tail
        .find("\n---\n")
        .map(|pos| (pos, 5))
        .or_else(|| tail.find("\n---\r\n").map(|pos| (pos, 6)))
        .or_else(|| tail.ends_with("\n---").then(|| (tail.len() - 4, 4)));

    match closing {
        Some((pos, marker_len)) => Split::Block {
            yaml: &raw[yaml_start..base + pos + 1],
            body_start: base + pos + marker_len,
        },
        None => Split::Unterminated,
    }
}

/// Decode one YAML value into the restricted [`MetaValue`] grammar.
///
/// Scalars outside the grammar (numbers, nulls) are folded into strings so
/// the type rules can report on them; structural shapes (nested mappings,
/// non-scalar sequence items) are decode errors.
fn decode_value(field: &str, value: Value) -> ParseResult<MetaValue> {
    match value {
        Value::String(s) => Ok(MetaValue::Str(s)),
        Value::Bool(b) => Ok(MetaValue::Bool(b)),
        Value::Number(n) => Ok(MetaValue::Str(n.to_string())),
        Value::Null => Ok(MetaValue::Str(String::new())),
        Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => out.push(s),
                    Value::Number(n) => out.push(n.to_string()),
                    Value::Bool(b) => out.push(b.to_string()),
                    _ => {
                        return Err(FrontmatterError::UnsupportedShape {
                            field: field.to_string(),
                            shape: "nested sequence item",
                        });
                    }
                }
            }
            Ok(MetaValue::Seq(out))
        }
        Value::Mapping(_) => Err(FrontmatterError::UnsupportedShape {
            field: field.to_string(),
            shape: "mapping",
        }),
        Value::Tagged(_) => Err(FrontmatterError::UnsupportedShape {
            field: field.to_string(),
            shape: "tagged value",
        }),
    }
}

/// Decode the interior YAML of a block into an ordered [`Frontmatter`].
fn decode_block(yaml: &str) -> ParseResult<Frontmatter> {
    let value: Value = serde_yaml::from_str(yaml)?;
    match value {
        // An empty block decodes to null; treat it as an empty mapping.
        Value::Null => Ok(Frontmatter::new()),
        Value::Mapping(mapping) => {
            let mut fm = Frontmatter::new();
            for (key, value) in mapping {
                let Value::String(name) = key else {
                    return Err(FrontmatterError::NotAMapping);
                };
                let decoded = decode_value(&name, value)?;
                fm.set(&name, decoded);
            }
            Ok(fm)
        }
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// Parse raw text into a [`Document`].
///
/// A document without an opening marker is valid: `frontmatter` is `None`
/// and the body is the whole text. An unterminated or undecodable block is
/// an error; the caller decides whether to attempt repair.
pub fn parse(path: &str, raw: &str) -> ParseResult<Document> {
    match split(raw) {
        Split::NoBlock => Ok(Document {
            path: path.to_string(),
            raw: raw.to_string(),
            raw_block: None,
            frontmatter: None,
            body: raw.to_string(),
        }),
        Split::Unterminated => Err(FrontmatterError::Unterminated),
        Split::Block { yaml, body_start } => {
            let fm = decode_block(yaml)?;
            Ok(Document {
                path: path.to_string(),
                raw: raw.to_string(),
                raw_block: Some(raw[..body_start].to_string()),
                frontmatter: Some(fm),
                body: raw[body_start..].to_string(),
            })
        }
    }
}

/// Emit one value in the canonical form used after a fix.
fn emit_value(value: &MetaValue) -> String {
    let yaml = match value {
        MetaValue::Str(s) => serde_yaml::to_string(&Value::String(s.clone())),
        MetaValue::Bool(b) => serde_yaml::to_string(&Value::Bool(*b)),
        MetaValue::Seq(items) => serde_yaml::to_string(&items),
    };
    // Serializing a scalar or flat sequence of scalars cannot fail.
    yaml.unwrap_or_default()
}

/// Serialize a mutated mapping and body back to document text.
///
/// Used by the fixer once at least one fix has been applied. Fields are
/// emitted in mapping order, scalars inline and sequences in block form,
/// matching what `serde_yaml` round-trips.
pub fn serialize(frontmatter: &Frontmatter, body: &str) -> String {
    let mut out = String::from("---\n");
    for (name, value) in frontmatter.iter() {
        match value {
            MetaValue::Seq(_) => {
                out.push_str(name);
                out.push_str(":\n");
                out.push_str(&emit_value(value));
            }
            _ => {
                out.push_str(name);
                out.push_str(": ");
                out.push_str(&emit_value(value));
            }
        }
    }
    out.push_str("---\n");
    out.push_str(body);
    out
}

static UNQUOTED_BRACKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\w[\w-]*):[ \t]*(.+?)[ \t]*$").expect("valid regex")
});

/// Best-effort repair for the one documented frontmatter failure mode:
/// an unquoted value containing `[`, which YAML misreads as a flow
/// sequence. Wraps such values in double quotes.
///
/// Returns the rewritten text and the fields touched, or `None` when
/// nothing matched. Never attempts to repair a block with no closing
/// marker.
pub fn repair_brackets(raw: &str) -> Option<(String, Vec<String>)> {
    let Split::Block { yaml, body_start } = split(raw) else {
        return None;
    };

    let mut touched = Vec::new();
    let repaired = UNQUOTED_BRACKET.replace_all(yaml, |caps: &regex::Captures<'_>| {
        let key = &caps[1];
        let value = &caps[2];
        if value.contains('[') && !value.starts_with('"') && !value.starts_with('\'') {
            touched.push(key.to_string());
            format!("{key}: \"{}\"", value.replace('"', "\\\""))
        } else {
            caps[0].to_string()
        }
    });

    if touched.is_empty() {
        return None;
    }
    Some((format!("---\n{repaired}---\n{}", &raw[body_start..]), touched))
}
