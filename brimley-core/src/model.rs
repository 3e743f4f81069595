//! Discovered-item data model: function and entity records, argument
//! field-specs, and return-shape forms, as produced by the discovery parsers
//! and consumed by the argument resolver, result mapper, and runners.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Tool-export marker (`mcp: {type: "tool", description?}`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct McpMarker {
    #[serde(rename = "type")]
    pub marker_type: String,
    pub description: Option<String>,
}

impl McpMarker {
    pub fn is_tool(&self) -> bool {
        self.marker_type == "tool"
    }
}

/// An inline argument field-spec: either a bare type-expression string
/// (implies required, no default) or the structured map form.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ArgumentFieldSpec {
    Shorthand(String),
    Complex(ComplexFieldSpec),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComplexFieldSpec {
    #[serde(rename = "type")]
    pub type_expr: String,
    pub default: Option<serde_json::Value>,
    pub description: Option<String>,
    pub from_context: Option<String>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<String>,
    pub required: Option<bool>,
}

impl ArgumentFieldSpec {
    pub fn type_expr(&self) -> &str {
        match self {
            ArgumentFieldSpec::Shorthand(expr) => expr,
            ArgumentFieldSpec::Complex(spec) => &spec.type_expr,
        }
    }

    pub fn default(&self) -> Option<&serde_json::Value> {
        match self {
            ArgumentFieldSpec::Shorthand(_) => None,
            ArgumentFieldSpec::Complex(spec) => spec.default.as_ref(),
        }
    }

    pub fn from_context(&self) -> Option<&str> {
        match self {
            ArgumentFieldSpec::Shorthand(_) => None,
            ArgumentFieldSpec::Complex(spec) => spec.from_context.as_deref(),
        }
    }

    /// Required unless a default or `from_context` source is declared, or the
    /// spec explicitly marks `required: false`.
    pub fn is_required(&self) -> bool {
        match self {
            ArgumentFieldSpec::Shorthand(_) => true,
            ArgumentFieldSpec::Complex(spec) => spec.required.unwrap_or(
                spec.default.is_none() && spec.from_context.is_none(),
            ),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            ArgumentFieldSpec::Shorthand(_) => None,
            ArgumentFieldSpec::Complex(spec) => spec.description.as_deref(),
        }
    }
}

pub type FieldSpecMap = HashMap<String, ArgumentFieldSpec>;

/// `return_shape`: either a bare type expression or a structured form.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ReturnShape {
    Shorthand(String),
    EntityRef { entity_ref: String },
    Inline { inline: FieldSpecMap },
}

/// Fields shared by every function flavor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionCommon {
    pub name: String,
    pub description: Option<String>,
    #[serde(skip_deserializing, default)]
    pub canonical_id: String,
    pub arguments: Option<ArgumentsBlock>,
    pub return_shape: ReturnShape,
    pub mcp: Option<McpMarker>,
    pub timeout_seconds: Option<u64>,
}

/// The `arguments:` block. Only the `inline` form is supported at this
/// level of detail; a `properties`-keyed JSON-Schema form is
/// explicitly rejected as a parse-time error rather than silently accepted.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ArgumentsBlock {
    #[serde(default)]
    pub inline: FieldSpecMap,
}

/// Flavor-specific data, tagged by the record's `type` field at parse time.
#[derive(Debug, Clone)]
pub enum FunctionKind {
    Native { handler: String, reload: bool },
    Sql { connection: String, sql_body: String },
    Template { template_engine: String, template_body: Option<String>, messages: Option<Vec<PromptMessageSpec>> },
}

impl FunctionKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            FunctionKind::Native { .. } => "native_function",
            FunctionKind::Sql { .. } => "sql_function",
            FunctionKind::Template { .. } => "template_function",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptMessageSpec {
    pub role: String,
    pub content: serde_json::Value,
}

/// A fully discovered function: common metadata plus flavor-specific data.
#[derive(Debug, Clone)]
pub struct FunctionRecord {
    pub common: FunctionCommon,
    pub kind: FunctionKind,
}

impl FunctionRecord {
    pub fn name(&self) -> &str {
        &self.common.name
    }

    pub fn is_tool_export(&self) -> bool {
        self.common.mcp.as_ref().is_some_and(McpMarker::is_tool)
    }
}

/// Entity kind: declarative entities carry a frozen field map; native
/// entities carry a handler path resolved lazily by the result mapper.
#[derive(Debug, Clone)]
pub enum EntityKind {
    Declarative { fields: FieldSpecMap },
    Native { handler: String },
}

#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub name: String,
    pub kind: EntityKind,
    pub canonical_id: String,
    pub raw_definition: Option<serde_json::Value>,
}

impl EntityRecord {
    pub fn declarative(name: impl Into<String>, canonical_id: impl Into<String>, fields: FieldSpecMap) -> Self {
        EntityRecord {
            name: name.into(),
            kind: EntityKind::Declarative { fields },
            canonical_id: canonical_id.into(),
            raw_definition: None,
        }
    }
}

/// Two entity kinds are built in and always present in a freshly built entity
/// registry, independent of scan results: `ContentBlock` and
/// `PromptMessage`.
pub fn builtin_entities() -> Vec<EntityRecord> {
    let mut content_block_fields = FieldSpecMap::new();
    content_block_fields.insert("type".to_string(), ArgumentFieldSpec::Shorthand("string".to_string()));
    content_block_fields.insert(
        "text".to_string(),
        ArgumentFieldSpec::Complex(ComplexFieldSpec {
            type_expr: "string".to_string(),
            default: None,
            description: None,
            from_context: None,
            enum_values: None,
            min: None,
            max: None,
            pattern: None,
            required: Some(false),
        }),
    );
    content_block_fields.insert(
        "data".to_string(),
        ArgumentFieldSpec::Complex(ComplexFieldSpec {
            type_expr: "string".to_string(),
            default: None,
            description: None,
            from_context: None,
            enum_values: None,
            min: None,
            max: None,
            pattern: None,
            required: Some(false),
        }),
    );
    content_block_fields.insert(
        "mime_type".to_string(),
        ArgumentFieldSpec::Complex(ComplexFieldSpec {
            type_expr: "string".to_string(),
            default: None,
            description: None,
            from_context: None,
            enum_values: None,
            min: None,
            max: None,
            pattern: None,
            required: Some(false),
        }),
    );

    let mut prompt_message_fields = FieldSpecMap::new();
    prompt_message_fields.insert("role".to_string(), ArgumentFieldSpec::Shorthand("string".to_string()));
    prompt_message_fields.insert("content".to_string(), ArgumentFieldSpec::Shorthand("ContentBlock[]".to_string()));

    vec![
        EntityRecord::declarative("ContentBlock", "entity:builtin:ContentBlock", content_block_fields),
        EntityRecord::declarative("PromptMessage", "entity:builtin:PromptMessage", prompt_message_fields),
    ]
}

pub const BUILTIN_ENTITY_NAMES: &[&str] = &["ContentBlock", "PromptMessage"];
