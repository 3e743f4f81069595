//! Result mapper: validates a runner's raw output against the
//! function's declared `return_shape`, including user-defined entity shapes
//! looked up in the live entity registry.

use serde_json::Value;

use crate::context::Context;
use crate::error::BrimleyError;
use crate::model::{ArgumentFieldSpec, EntityKind, FieldSpecMap, ReturnShape};
use crate::types::{normalize, CanonicalType, Scalar};

/// Validate `raw` against `return_shape`, returning the validated (and where
/// needed, coerced/unwrapped) value.
pub fn map(raw: Value, return_shape: &ReturnShape, function: &str, context: &Context) -> Result<Value, BrimleyError> {
    match return_shape {
        ReturnShape::Shorthand(expr) => {
            let canonical = normalize(expr, true, true).map_err(|_| BrimleyError::ResultValidation {
                function: function.to_string(),
                field: "$".to_string(),
                detail: format!("unrecognized return shape '{expr}'"),
            })?;
            validate(raw, &canonical, function, "$", context)
        }
        ReturnShape::EntityRef { entity_ref } => {
            validate(raw, &CanonicalType::Entity(entity_ref.clone()), function, "$", context)
        }
        ReturnShape::Inline { inline } => {
            let obj = as_object(&raw, function, "$")?;
            validate_fields(obj, inline, function, "$", context)
        }
    }
}

fn validate(raw: Value, canonical: &CanonicalType, function: &str, field: &str, context: &Context) -> Result<Value, BrimleyError> {
    match canonical {
        CanonicalType::Scalar(Scalar::Void) => Ok(Value::Null),
        CanonicalType::Scalar(scalar) => validate_scalar(raw, *scalar, function, field),
        CanonicalType::List(inner) => validate_list(raw, inner, function, field, context),
        CanonicalType::Entity(name) => validate_entity(raw, name, function, field, context),
    }
}

/// Scalar shape: a one-element sequence unwraps; more than one element is a
/// cardinality error; a bare scalar value validates directly.
fn validate_scalar(raw: Value, scalar: Scalar, function: &str, field: &str) -> Result<Value, BrimleyError> {
    if let Value::Array(items) = &raw {
        return match items.len() {
            1 => validate_scalar(items[0].clone(), scalar, function, field),
            _ => Err(BrimleyError::ResultCardinality {
                function: function.to_string(),
                detail: format!("expected exactly one value for scalar field '{field}', got {}", items.len()),
            }),
        };
    }
    coerce_scalar(&raw, scalar).ok_or_else(|| BrimleyError::ResultValidation {
        function: function.to_string(),
        field: field.to_string(),
        detail: format!("value does not match declared type '{}'", scalar_name(scalar)),
    })
}

/// List shape: a sequence validates element-by-element; a bare scalar wraps
/// into a one-element list.
fn validate_list(raw: Value, inner: &CanonicalType, function: &str, field: &str, context: &Context) -> Result<Value, BrimleyError> {
    match raw {
        Value::Array(items) => {
            let mut validated = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let element_field = format!("{field}[{i}]");
                validated.push(validate(item, inner, function, &element_field, context)?);
            }
            Ok(Value::Array(validated))
        }
        other => {
            let wrapped = validate(other, inner, function, field, context)?;
            Ok(Value::Array(vec![wrapped]))
        }
    }
}

fn validate_entity(raw: Value, entity_name: &str, function: &str, field: &str, context: &Context) -> Result<Value, BrimleyError> {
    let entities = context.registries().entities.clone();
    let record = entities.get(entity_name).map_err(|_| BrimleyError::ResultValidation {
        function: function.to_string(),
        field: field.to_string(),
        detail: format!("entity '{entity_name}' is not registered"),
    })?;

    match &record.kind {
        EntityKind::Declarative { fields } => {
            let obj = as_object(&raw, function, field)?;
            validate_fields(obj, fields, function, field, context)
        }
        // A native entity's concrete shape is supplied by whatever host
        // process registered it; without a host
        // schema provider wired up, the mapper trusts the runner's output
        // structurally rather than refusing every native-entity result.
        EntityKind::Native { .. } => Ok(raw),
    }
}

fn validate_fields(
    obj: &serde_json::Map<String, Value>,
    fields: &FieldSpecMap,
    function: &str,
    field: &str,
    context: &Context,
) -> Result<Value, BrimleyError> {
    let mut validated = serde_json::Map::with_capacity(fields.len());
    for (name, spec) in fields {
        let child_field = format!("{field}.{name}");
        let raw_value = obj.get(name).cloned();

        let value = match raw_value {
            Some(v) => v,
            None => match spec.default() {
                Some(default) => default.clone(),
                None if spec.is_required() => {
                    return Err(BrimleyError::ResultValidation {
                        function: function.to_string(),
                        field: child_field,
                        detail: "missing required field".to_string(),
                    })
                }
                None => continue,
            },
        };

        let canonical = normalize(spec.type_expr(), false, true).map_err(|_| BrimleyError::ResultValidation {
            function: function.to_string(),
            field: child_field.clone(),
            detail: format!("unrecognized declared type '{}'", spec.type_expr()),
        })?;

        validated.insert(name.clone(), validate(value, &canonical, function, &child_field, context)?);
    }
    Ok(Value::Object(validated))
}

fn as_object<'a>(raw: &'a Value, function: &str, field: &str) -> Result<&'a serde_json::Map<String, Value>, BrimleyError> {
    raw.as_object().ok_or_else(|| BrimleyError::ResultValidation {
        function: function.to_string(),
        field: field.to_string(),
        detail: "expected an object".to_string(),
    })
}

fn coerce_scalar(raw: &Value, scalar: Scalar) -> Option<Value> {
    match scalar {
        Scalar::Primitive | Scalar::Void => Some(raw.clone()),
        Scalar::String => match raw {
            Value::String(_) => Some(raw.clone()),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        Scalar::Int => match raw {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(raw.clone()),
            Value::String(s) => s.parse::<i64>().ok().map(|i| serde_json::json!(i)),
            _ => None,
        },
        Scalar::Float | Scalar::Decimal => match raw {
            Value::Number(_) => Some(raw.clone()),
            Value::String(s) => s.parse::<f64>().ok().map(|f| serde_json::json!(f)),
            _ => None,
        },
        Scalar::Bool => match raw {
            Value::Bool(_) => Some(raw.clone()),
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Some(Value::Bool(true)),
                "false" | "0" | "no" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        Scalar::Date => raw.as_str().filter(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()).map(|_| raw.clone()),
        Scalar::DateTime => raw.as_str().filter(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()).map(|_| raw.clone()),
    }
}

fn scalar_name(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::String => "string",
        Scalar::Int => "int",
        Scalar::Float => "float",
        Scalar::Bool => "bool",
        Scalar::Decimal => "decimal",
        Scalar::Date => "date",
        Scalar::DateTime => "datetime",
        Scalar::Primitive => "primitive",
        Scalar::Void => "void",
    }
}
