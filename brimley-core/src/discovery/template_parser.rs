//! `.jinja`/`.j2`/`.md`/`.txt` template function parser: frontmatter
//! describes the function, the body is either a single rendered template or
//! a `messages:` list of role/content prompt turns.

use super::common::parse_common;
use super::frontmatter;
use crate::model::{FunctionKind, FunctionRecord, PromptMessageSpec};

pub fn parse(content: &str) -> Result<FunctionRecord, String> {
    let (value, body) = frontmatter::parse(content).map_err(|(framing, e)| {
        format!("invalid YAML frontmatter: {e} (hint: {})", framing.suggestion())
    })?;

    let common = parse_common(&value)?;

    let mapping = value.as_mapping();
    let template_engine = mapping
        .and_then(|m| m.get("template_engine"))
        .and_then(serde_yaml::Value::as_str)
        .unwrap_or("jinja2")
        .to_string();

    let messages: Option<Vec<PromptMessageSpec>> = match mapping.and_then(|m| m.get("messages")) {
        Some(v) => Some(serde_yaml::from_value(v.clone()).map_err(|e| format!("malformed 'messages': {e}"))?),
        None => None,
    };

    let template_body = if body.trim().is_empty() { None } else { Some(body) };

    if messages.is_none() && template_body.is_none() {
        return Err("template function has neither a body nor a 'messages' block".to_string());
    }
    if messages.is_some() && template_body.is_some() {
        return Err("template function must not define both a body and a 'messages' block".to_string());
    }

    Ok(FunctionRecord {
        common,
        kind: FunctionKind::Template { template_engine, template_body, messages },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_body_template() {
        let content = "---\nname: greet\ntype: template_function\nreturn_shape: string\n---\nHello {{ args.name }}";
        let record = parse(content).unwrap();
        match record.kind {
            FunctionKind::Template { template_engine, template_body, messages } => {
                assert_eq!(template_engine, "jinja2");
                assert_eq!(template_body.as_deref(), Some("Hello {{ args.name }}"));
                assert!(messages.is_none());
            }
            _ => panic!("expected Template kind"),
        }
    }

    #[test]
    fn parses_messages_block() {
        let content = "---\nname: chat\ntype: template_function\nreturn_shape: PromptMessage[]\nmessages:\n  - role: user\n    content: \"hi {{ args.name }}\"\n---\n";
        let record = parse(content).unwrap();
        match record.kind {
            FunctionKind::Template { messages, template_body, .. } => {
                assert!(template_body.is_none());
                let messages = messages.unwrap();
                assert_eq!(messages.len(), 1);
                assert_eq!(messages[0].role, "user");
            }
            _ => panic!("expected Template kind"),
        }
    }

    #[test]
    fn rejects_both_body_and_messages() {
        let content = "---\nname: chat\ntype: template_function\nreturn_shape: string\nmessages:\n  - role: user\n    content: hi\n---\nbody text";
        assert!(parse(content).is_err());
    }

    #[test]
    fn rejects_neither_body_nor_messages() {
        let content = "---\nname: chat\ntype: template_function\nreturn_shape: string\n---\n";
        assert!(parse(content).is_err());
    }
}
