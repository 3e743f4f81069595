//! Shared frontmatter-to-[`FunctionCommon`] extraction used by the SQL and
//! template parsers. Native discovery builds its own `FunctionCommon`
//! directly from source reflection rather than YAML, so it does not go
//! through this helper.

use crate::model::{ArgumentsBlock, FunctionCommon, McpMarker, ReturnShape};

/// Deserialize the common fields out of a parsed frontmatter YAML value.
/// Returns the missing/malformed key name on failure so the caller can
/// produce an `ERR_PARSE_FAILURE` diagnostic naming it.
pub fn parse_common(value: &serde_yaml::Value) -> Result<FunctionCommon, String> {
    let mapping = value.as_mapping().ok_or_else(|| "frontmatter is not a YAML mapping".to_string())?;

    let name = mapping
        .get("name")
        .and_then(serde_yaml::Value::as_str)
        .ok_or_else(|| "missing required key 'name'".to_string())?
        .to_string();

    if mapping.get("type").is_none() {
        return Err("missing required key 'type'".to_string());
    }

    let return_shape_value = mapping
        .get("return_shape")
        .cloned()
        .ok_or_else(|| "missing required key 'return_shape'".to_string())?;
    let return_shape: ReturnShape = serde_yaml::from_value(return_shape_value)
        .map_err(|e| format!("malformed 'return_shape': {e}"))?;

    let description = mapping.get("description").and_then(serde_yaml::Value::as_str).map(String::from);

    let arguments: Option<ArgumentsBlock> = match mapping.get("arguments") {
        Some(v) => Some(serde_yaml::from_value(v.clone()).map_err(|e| format!("malformed 'arguments': {e}"))?),
        None => None,
    };

    let mcp: Option<McpMarker> = match mapping.get("mcp") {
        Some(v) => Some(serde_yaml::from_value(v.clone()).map_err(|e| format!("malformed 'mcp': {e}"))?),
        None => None,
    };

    let timeout_seconds = mapping.get("timeout_seconds").and_then(serde_yaml::Value::as_u64);

    Ok(FunctionCommon {
        name,
        description,
        canonical_id: String::new(),
        arguments,
        return_shape,
        mcp,
        timeout_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_return_shape_names_the_key() {
        let value: serde_yaml::Value = serde_yaml::from_str("name: hello\ntype: template_function\n").unwrap();
        let err = parse_common(&value).unwrap_err();
        assert!(err.contains("return_shape"));
    }

    #[test]
    fn parses_full_common_fields() {
        let value: serde_yaml::Value = serde_yaml::from_str(
            "name: hello\ntype: template_function\nreturn_shape: string\ndescription: greets\nmcp:\n  type: tool\n",
        )
        .unwrap();
        let common = parse_common(&value).unwrap();
        assert_eq!(common.name, "hello");
        assert_eq!(common.description.as_deref(), Some("greets"));
        assert!(common.mcp.unwrap().is_tool());
    }
}
