//! Tool-export protocol: builds the advertised JSON input schema for
//! every `mcp.type == "tool"` function, a deterministic signature over that
//! schema, and the refresh-diff used to decide whether a reload can update
//! an already-running tool host in place.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::BrimleyError;
use crate::model::{ArgumentFieldSpec, FunctionRecord};
use crate::registry::Registry;
use crate::types::{self, CanonicalType, Scalar};

/// One tool's advertised surface: the schema a client sees, never the
/// function's full internal metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
    /// `sha-of-{tool, input_schema_json_sorted}`. Stable across runs for
    /// an unchanged definition; changes whenever `arguments` changes.
    pub schema_signature: String,
}

/// Build the advertised descriptor for one tool-export function.
///
/// Fields with `from_context` are omitted entirely from the schema — the
/// caller never supplies them, so advertising them as a parameter would be
/// actively misleading.
pub fn describe(function: &FunctionRecord) -> Result<ToolDescriptor, BrimleyError> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    if let Some(arguments) = &function.common.arguments {
        let mut names: Vec<&String> = arguments.inline.keys().collect();
        names.sort();
        for name in names {
            let spec = &arguments.inline[name];
            if let ArgumentFieldSpec::Complex(complex) = spec {
                if complex.from_context.is_some() {
                    continue;
                }
            }
            properties.insert(name.clone(), field_schema(spec)?);
            if !has_default(spec) {
                required.push(Value::String(name.clone()));
            }
        }
    }

    let mut input_schema = serde_json::json!({
        "type": "object",
        "properties": Value::Object(properties),
    });
    if !required.is_empty() {
        input_schema["required"] = Value::Array(required);
    }

    let schema_signature = signature_of(function.name(), &input_schema);
    let description = function.common.mcp.as_ref().and_then(|marker| marker.description.clone());

    Ok(ToolDescriptor { name: function.name().to_string(), description, input_schema, schema_signature })
}

/// Describe every function in a tool-exports registry, in deterministic
/// name-sorted order.
pub fn describe_all(tool_exports: &Registry<FunctionRecord>) -> Result<Vec<ToolDescriptor>, BrimleyError> {
    let mut names = tool_exports.names();
    names.sort();
    names.iter().map(|name| describe(tool_exports.get(name)?)).collect()
}

/// The result of comparing a tool host's previously advertised descriptors
/// against the set a reload just produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolRefreshPlan {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Names present in both sets whose `schema_signature` differs.
    pub changed: Vec<String>,
}

impl ToolRefreshPlan {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Diff two descriptor sets and decide whether the refresh can proceed.
///
/// A tool set that only gained or lost tools can always be applied. A tool
/// whose schema signature changed can only be applied if the host supports
/// either clearing and re-registering its whole tool set, or producing a
/// fresh server instance (`host_supports_replacement`); otherwise the
/// refresh fails with [`BrimleyError::ClientActionRequired`].
pub fn plan_refresh(previous: &[ToolDescriptor], current: &[ToolDescriptor], host_supports_replacement: bool) -> Result<ToolRefreshPlan, BrimleyError> {
    let mut plan = ToolRefreshPlan::default();

    for current_tool in current {
        match previous.iter().find(|p| p.name == current_tool.name) {
            None => plan.added.push(current_tool.name.clone()),
            Some(prior) if prior.schema_signature != current_tool.schema_signature => {
                plan.changed.push(current_tool.name.clone())
            }
            Some(_) => {}
        }
    }
    for prior_tool in previous {
        if !current.iter().any(|c| c.name == prior_tool.name) {
            plan.removed.push(prior_tool.name.clone());
        }
    }

    if !plan.changed.is_empty() && !host_supports_replacement {
        return Err(BrimleyError::ClientActionRequired {
            reason: format!(
                "tool schema changed for {:?} but the host supports neither clear_tools nor a factory-produced replacement server",
                plan.changed
            ),
        });
    }

    Ok(plan)
}

fn has_default(spec: &ArgumentFieldSpec) -> bool {
    matches!(spec, ArgumentFieldSpec::Complex(complex) if complex.default.is_some())
}

fn field_schema(spec: &ArgumentFieldSpec) -> Result<Value, BrimleyError> {
    match spec {
        ArgumentFieldSpec::Shorthand(expr) => {
            let canonical = types::normalize(expr, false, true)?;
            Ok(canonical_schema(&canonical))
        }
        ArgumentFieldSpec::Complex(complex) => {
            let canonical = types::normalize(&complex.type_expr, false, true)?;
            let mut schema = canonical_schema(&canonical);
            if let Some(description) = &complex.description {
                schema["description"] = Value::String(description.clone());
            }
            if let Some(values) = &complex.enum_values {
                schema["enum"] = Value::Array(values.clone());
            }
            if let Some(default) = &complex.default {
                schema["default"] = default.clone();
            }
            Ok(schema)
        }
    }
}

fn canonical_schema(canonical_type: &CanonicalType) -> Value {
    match canonical_type {
        CanonicalType::Scalar(scalar) => scalar_schema(*scalar),
        CanonicalType::Entity(name) => serde_json::json!({"type": "object", "x-entity-ref": name}),
        CanonicalType::List(inner) => serde_json::json!({"type": "array", "items": canonical_schema(inner)}),
    }
}

fn scalar_schema(scalar: Scalar) -> Value {
    match scalar {
        Scalar::String => serde_json::json!({"type": "string"}),
        Scalar::Int => serde_json::json!({"type": "integer"}),
        Scalar::Float => serde_json::json!({"type": "number"}),
        Scalar::Bool => serde_json::json!({"type": "boolean"}),
        Scalar::Decimal => serde_json::json!({"type": "string", "format": "decimal"}),
        Scalar::Date => serde_json::json!({"type": "string", "format": "date"}),
        Scalar::DateTime => serde_json::json!({"type": "string", "format": "date-time"}),
        Scalar::Primitive => serde_json::json!({}),
        Scalar::Void => serde_json::json!({"type": "null"}),
    }
}

/// `serde_json::Map` is `BTreeMap`-backed in this workspace (the
/// `preserve_order` feature is not enabled), so serializing `input_schema`
/// already yields key-sorted, deterministic JSON — no separate sort step
/// is needed before hashing.
fn signature_of(tool: &str, input_schema: &Value) -> String {
    let payload = serde_json::json!({"tool": tool, "input_schema": input_schema});
    let canonical = serde_json::to_string(&payload).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArgumentsBlock, ComplexFieldSpec, FunctionCommon, FunctionKind, McpMarker, ReturnShape};

    fn tool_fn(name: &str, fields: Vec<(&str, ArgumentFieldSpec)>) -> FunctionRecord {
        let mut inline = std::collections::HashMap::new();
        for (key, spec) in fields {
            inline.insert(key.to_string(), spec);
        }
        FunctionRecord {
            common: FunctionCommon {
                name: name.to_string(),
                description: None,
                canonical_id: format!("template:test:{name}"),
                arguments: Some(ArgumentsBlock { inline }),
                return_shape: ReturnShape::Shorthand("string".to_string()),
                mcp: Some(McpMarker { marker_type: "tool".to_string(), description: Some("a tool".to_string()) }),
                timeout_seconds: None,
            },
            kind: FunctionKind::Template { template_engine: "minijinja".to_string(), template_body: Some("hi".to_string()), messages: None },
        }
    }

    #[test]
    fn describe_marks_fields_without_defaults_as_required() {
        let function = tool_fn("greet", vec![("name", ArgumentFieldSpec::Shorthand("string".to_string()))]);
        let descriptor = describe(&function).unwrap();
        assert_eq!(descriptor.input_schema["required"], serde_json::json!(["name"]));
    }

    #[test]
    fn describe_omits_from_context_fields_entirely() {
        let function = tool_fn(
            "whoami",
            vec![(
                "user_id",
                ArgumentFieldSpec::Complex(ComplexFieldSpec {
                    type_expr: "string".to_string(),
                    default: None,
                    description: None,
                    from_context: Some("app.user.id".to_string()),
                    enum_values: None,
                    min: None,
                    max: None,
                    pattern: None,
                    required: None,
                }),
            )],
        );
        let descriptor = describe(&function).unwrap();
        assert_eq!(descriptor.input_schema["properties"], serde_json::json!({}));
        assert!(descriptor.input_schema.get("required").is_none());
    }

    #[test]
    fn schema_signature_is_stable_for_an_unchanged_definition() {
        let a = tool_fn("greet", vec![("name", ArgumentFieldSpec::Shorthand("string".to_string()))]);
        let b = tool_fn("greet", vec![("name", ArgumentFieldSpec::Shorthand("string".to_string()))]);
        assert_eq!(describe(&a).unwrap().schema_signature, describe(&b).unwrap().schema_signature);
    }

    #[test]
    fn schema_signature_changes_with_arguments() {
        let a = tool_fn("greet", vec![("name", ArgumentFieldSpec::Shorthand("string".to_string()))]);
        let b = tool_fn("greet", vec![("name", ArgumentFieldSpec::Shorthand("int".to_string()))]);
        assert_ne!(describe(&a).unwrap().schema_signature, describe(&b).unwrap().schema_signature);
    }

    #[test]
    fn plan_refresh_without_host_support_rejects_a_schema_change() {
        let a = tool_fn("greet", vec![("name", ArgumentFieldSpec::Shorthand("string".to_string()))]);
        let b = tool_fn("greet", vec![("name", ArgumentFieldSpec::Shorthand("int".to_string()))]);
        let previous = vec![describe(&a).unwrap()];
        let current = vec![describe(&b).unwrap()];

        let err = plan_refresh(&previous, &current, false).unwrap_err();
        assert_eq!(err.code(), "ERR_CLIENT_ACTION_REQUIRED");
    }

    #[test]
    fn plan_refresh_with_host_support_allows_a_schema_change() {
        let a = tool_fn("greet", vec![("name", ArgumentFieldSpec::Shorthand("string".to_string()))]);
        let b = tool_fn("greet", vec![("name", ArgumentFieldSpec::Shorthand("int".to_string()))]);
        let previous = vec![describe(&a).unwrap()];
        let current = vec![describe(&b).unwrap()];

        let plan = plan_refresh(&previous, &current, true).unwrap();
        assert_eq!(plan.changed, vec!["greet".to_string()]);
    }

    #[test]
    fn plan_refresh_reports_additions_and_removals() {
        let a = tool_fn("greet", vec![]);
        let b = tool_fn("farewell", vec![]);
        let plan = plan_refresh(&[describe(&a).unwrap()], &[describe(&b).unwrap()], false).unwrap();
        assert_eq!(plan.added, vec!["farewell".to_string()]);
        assert_eq!(plan.removed, vec!["greet".to_string()]);
    }
}
