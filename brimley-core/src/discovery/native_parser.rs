//! Native-function companion parser.
//!
//! The original dotted-path/reflection discovery of native functions has no
//! idiomatic Rust equivalent: Rust has no stable way to enumerate "every
//! function annotated like this" at runtime. Native functions are instead
//! registered explicitly at process start through [`crate::native_registry`].
//!
//! This parser is kept only as a diagnostics companion: it looks for the same
//! frontmatter shape inside a `.rs` file's leading module doc comment
//! (`//! --- ... ---`) so the scanner can warn when a file documents a native
//! function that nothing ever registers, or vice versa. Its output is never
//! consulted by the dispatcher.

use super::common::parse_common;
use super::frontmatter;
use crate::model::{FunctionKind, FunctionRecord};

/// Extract the `//!`-prefixed leading doc comment block of a Rust source
/// file, stripped of its comment markers, as plain text.
fn extract_module_doc(content: &str) -> Option<String> {
    let mut lines = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("//!") {
            lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        } else if lines.is_empty() && trimmed.is_empty() {
            continue;
        } else {
            break;
        }
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Parse a `.rs` file's declared native-function metadata for diagnostic
/// cross-checking only. Returns `Ok(None)` when the file carries no
/// frontmatter-shaped module doc comment at all (an ordinary Rust file).
pub fn parse(content: &str) -> Result<Option<FunctionRecord>, String> {
    let Some(doc) = extract_module_doc(content) else { return Ok(None) };

    let (value, _body) = match frontmatter::parse(&doc) {
        Ok(parsed) => parsed,
        Err((framing, e)) => {
            return Err(format!("invalid YAML frontmatter: {e} (hint: {})", framing.suggestion()));
        }
    };

    let is_empty = match value.as_mapping() {
        Some(mapping) => mapping.is_empty(),
        None => true,
    };
    if is_empty {
        return Ok(None);
    }

    let common = parse_common(&value)?;

    let mapping = value.as_mapping();
    let handler = mapping
        .and_then(|m| m.get("handler"))
        .and_then(serde_yaml::Value::as_str)
        .ok_or_else(|| "missing required key 'handler'".to_string())?
        .to_string();
    let reload = mapping
        .and_then(|m| m.get("reload"))
        .and_then(serde_yaml::Value::as_bool)
        .unwrap_or(true);

    Ok(Some(FunctionRecord { common, kind: FunctionKind::Native { handler, reload } }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_with_no_doc_comment_yields_none() {
        let content = "pub fn hello() {}\n";
        assert!(parse(content).unwrap().is_none());
    }

    #[test]
    fn extracts_frontmatter_from_module_doc_comment() {
        let content = "//! ---\n//! name: greet\n//! type: native_function\n//! return_shape: string\n//! handler: greet::run\n//! ---\npub fn run() {}\n";
        let record = parse(content).unwrap().unwrap();
        assert_eq!(record.name(), "greet");
        match record.kind {
            FunctionKind::Native { handler, reload } => {
                assert_eq!(handler, "greet::run");
                assert!(reload);
            }
            _ => panic!("expected Native kind"),
        }
    }

    #[test]
    fn missing_handler_is_an_error() {
        let content = "//! ---\n//! name: greet\n//! type: native_function\n//! return_shape: string\n//! ---\npub fn run() {}\n";
        assert!(parse(content).is_err());
    }

    #[test]
    fn ordinary_doc_comment_without_frontmatter_is_ignored() {
        let content = "//! A helper module.\npub fn run() {}\n";
        assert!(parse(content).unwrap().is_none());
    }
}
