//! Entity-definition file parser: recognizes the
//! `declarative_entity` and `native_entity` type tags alongside the function
//! tags the scanner already knows, using the same frontmatter framing rules.
//!
//! Declarative entities carry a `fields:` map validated the same way an
//! inline `return_shape`/`arguments` block is. Native entities
//! only need a `handler` path recorded for parity with native functions —
//! unlike a native function there is no dispatch step to resolve, so the
//! handler is not invoked, only carried through for diagnostics and tooling.

use super::frontmatter;
use crate::model::{EntityKind, EntityRecord, FieldSpecMap};

pub fn parse(content: &str, type_tag: &str) -> Result<EntityRecord, String> {
    let (value, _body) = frontmatter::parse(content)
        .map_err(|(framing, e)| format!("invalid YAML frontmatter: {e} (hint: {})", framing.suggestion()))?;

    let mapping = value.as_mapping().ok_or_else(|| "frontmatter is not a YAML mapping".to_string())?;

    let name = mapping
        .get("name")
        .and_then(serde_yaml::Value::as_str)
        .ok_or_else(|| "missing required key 'name'".to_string())?
        .to_string();

    let kind = match type_tag {
        "declarative_entity" => {
            let fields_value = mapping.get("fields").cloned().ok_or_else(|| "missing required key 'fields'".to_string())?;
            let fields: FieldSpecMap =
                serde_yaml::from_value(fields_value).map_err(|e| format!("malformed 'fields': {e}"))?;
            if fields.is_empty() {
                return Err("'fields' must declare at least one field".to_string());
            }
            EntityKind::Declarative { fields }
        }
        "native_entity" => {
            let handler = mapping
                .get("handler")
                .and_then(serde_yaml::Value::as_str)
                .ok_or_else(|| "missing required key 'handler'".to_string())?
                .to_string();
            EntityKind::Native { handler }
        }
        other => return Err(format!("unknown entity type: {other}")),
    };

    Ok(EntityRecord { name, kind, canonical_id: String::new(), raw_definition: Some(yaml_to_json(&value)) })
}

fn yaml_to_json(value: &serde_yaml::Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}
