//! Argument resolver: merges caller input with context-injected values
//! and defaults, then coerces the result against the canonical type grammar
//! and checks declared constraints.
//!
//! Precedence per field is fixed: `from_context` (if it resolves) always wins
//! over caller input — this is the injection-priority security invariant —
//! then caller input, then a declared default, then a missing-argument
//! error if the field is required.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::config::ConfigValue;
use crate::context::Context;
use crate::error::BrimleyError;
use crate::model::{ArgumentFieldSpec, ComplexFieldSpec, FunctionRecord};
use crate::types::{normalize, CanonicalType, Scalar};

/// Resolve and coerce every declared argument of `func` against `user_input`
/// and `context`. Fields the function does not declare are ignored (future
/// compatibility).
pub fn resolve(
    func: &FunctionRecord,
    user_input: &HashMap<String, Value>,
    context: &Context,
) -> Result<HashMap<String, Value>, BrimleyError> {
    let function = func.name().to_string();
    let fields = match &func.common.arguments {
        Some(block) => &block.inline,
        None => return Ok(HashMap::new()),
    };

    let mut resolved = HashMap::with_capacity(fields.len());
    for (name, spec) in fields {
        let raw = match select(spec, name, user_input, context) {
            Some(v) => v,
            None => {
                if spec.is_required() {
                    return Err(BrimleyError::MissingArgument { function, argument: name.clone() });
                }
                continue;
            }
        };

        let canonical = normalize(spec.type_expr(), false, true)
            .map_err(|_| BrimleyError::ArgType {
                function: function.clone(),
                argument: name.clone(),
                expected: spec.type_expr().to_string(),
                detail: "unrecognized declared type".to_string(),
            })?;

        let coerced = coerce(&raw, &canonical, &function, name)?;

        if let ArgumentFieldSpec::Complex(complex) = spec {
            check_constraints(complex, &coerced, &function, name)?;
        }

        resolved.insert(name.clone(), coerced);
    }

    Ok(resolved)
}

/// Pick the raw (pre-coercion) value for one field per the declared precedence.
fn select(
    spec: &ArgumentFieldSpec,
    name: &str,
    user_input: &HashMap<String, Value>,
    context: &Context,
) -> Option<Value> {
    if let Some(path) = spec.from_context() {
        if let Some(value) = context_value(context, path) {
            return Some(value);
        }
    }
    if let Some(value) = user_input.get(name) {
        return Some(value.clone());
    }
    spec.default().cloned()
}

/// Navigate a dotted path (`app.user.id`, `config.retry_budget`,
/// `databases.primary.url`) into the context's three addressable roots.
fn context_value(context: &Context, path: &str) -> Option<Value> {
    let mut segments = path.splitn(2, '.');
    let root = segments.next()?;
    let rest = segments.next();

    match root {
        "app" => {
            let rest = rest?;
            let (head, tail) = split_head(rest);
            let value = context.app.get(head)?.to_json();
            navigate_json(&value, tail)
        }
        "config" => match rest {
            None => Some(Value::Object(
                context.config.config.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            )),
            Some(rest) => {
                let (head, tail) = split_head(rest);
                let value = context.config.config.get(head)?.to_json();
                navigate_json(&value, tail)
            }
        },
        "databases" => {
            let rest = rest?;
            let (head, tail) = split_head(rest);
            let settings = context.databases.get(head)?;
            let value = serde_json::json!({ "url": settings.url });
            navigate_json(&value, tail)
        }
        _ => None,
    }
}

fn split_head(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, tail)) => (head, Some(tail)),
        None => (path, None),
    }
}

fn navigate_json(value: &Value, path: Option<&str>) -> Option<Value> {
    match path {
        None => Some(value.clone()),
        Some(path) => {
            let (head, tail) = split_head(path);
            navigate_json(value.get(head)?, tail)
        }
    }
}

/// Coerce a raw JSON value against a canonical type expression (
/// string/numeric casts accepted, lists require sequence input, date/datetime
/// accept ISO-8601 strings).
fn coerce(raw: &Value, canonical: &CanonicalType, function: &str, argument: &str) -> Result<Value, BrimleyError> {
    match canonical {
        CanonicalType::List(inner) => {
            let items = raw.as_array().ok_or_else(|| BrimleyError::ArgType {
                function: function.to_string(),
                argument: argument.to_string(),
                expected: canonical.to_canonical_string(),
                detail: "expected a list".to_string(),
            })?;
            let mut coerced = Vec::with_capacity(items.len());
            for item in items {
                coerced.push(coerce(item, inner, function, argument)?);
            }
            Ok(Value::Array(coerced))
        }
        CanonicalType::Scalar(scalar) => coerce_scalar(raw, *scalar, function, argument),
        // Entity-shaped arguments pass through structurally; field-level
        // validation against the entity's own spec is the result mapper's
        // job when an entity appears as a *return* shape, not an argument.
        CanonicalType::Entity(_) => Ok(raw.clone()),
    }
}

fn coerce_scalar(raw: &Value, scalar: Scalar, function: &str, argument: &str) -> Result<Value, BrimleyError> {
    let mismatch = |detail: &str| BrimleyError::ArgType {
        function: function.to_string(),
        argument: argument.to_string(),
        expected: CanonicalType::Scalar(scalar).to_canonical_string(),
        detail: detail.to_string(),
    };

    match scalar {
        Scalar::Primitive | Scalar::Void => Ok(raw.clone()),
        Scalar::String => match raw {
            Value::String(_) => Ok(raw.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(mismatch("expected a string, number, or bool")),
        },
        Scalar::Int => match raw {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(raw.clone()),
            Value::Number(n) => Err(mismatch(&format!("not an integer: {n}"))),
            Value::String(s) => s
                .parse::<i64>()
                .map(|i| serde_json::json!(i))
                .map_err(|_| mismatch(&format!("cannot parse '{s}' as int"))),
            _ => Err(mismatch("expected an int")),
        },
        Scalar::Float | Scalar::Decimal => match raw {
            Value::Number(_) => Ok(raw.clone()),
            Value::String(s) => {
                s.parse::<f64>().map(|f| serde_json::json!(f)).map_err(|_| mismatch(&format!("cannot parse '{s}' as number")))
            }
            _ => Err(mismatch("expected a number")),
        },
        Scalar::Bool => match raw {
            Value::Bool(_) => Ok(raw.clone()),
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(mismatch(&format!("cannot parse '{s}' as bool"))),
            },
            _ => Err(mismatch("expected a bool")),
        },
        Scalar::Date => {
            let s = raw.as_str().ok_or_else(|| mismatch("expected an ISO-8601 date string"))?;
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(|_| raw.clone())
                .map_err(|_| mismatch(&format!("'{s}' is not an ISO-8601 date")))
        }
        Scalar::DateTime => {
            let s = raw.as_str().ok_or_else(|| mismatch("expected an ISO-8601 datetime string"))?;
            DateTime::parse_from_rfc3339(s)
                .map(|_| raw.clone())
                .map_err(|_| mismatch(&format!("'{s}' is not an ISO-8601 datetime")))
        }
    }
}

/// `enum`/`min`/`max`/`pattern` constraints, checked after successful
/// coercion. All violations surface as `ERR_ARG_TYPE` (the existing
/// code, not a new one) with the constraint named in the message.
fn check_constraints(
    spec: &ComplexFieldSpec,
    value: &Value,
    function: &str,
    argument: &str,
) -> Result<(), BrimleyError> {
    let fail = |detail: String| BrimleyError::ArgType {
        function: function.to_string(),
        argument: argument.to_string(),
        expected: spec.type_expr.clone(),
        detail,
    };

    if let Some(allowed) = &spec.enum_values {
        if !allowed.contains(value) {
            return Err(fail(format!("'{value}' is not one of the allowed values {allowed:?}")));
        }
    }

    if spec.min.is_some() || spec.max.is_some() {
        let measured = measure(value);
        if let Some(measured) = measured {
            if let Some(min) = spec.min {
                if measured < min {
                    return Err(fail(format!("value {measured} is below the minimum of {min}")));
                }
            }
            if let Some(max) = spec.max {
                if measured > max {
                    return Err(fail(format!("value {measured} is above the maximum of {max}")));
                }
            }
        }
    }

    if let Some(pattern) = &spec.pattern {
        if let Some(s) = value.as_str() {
            let re = regex::Regex::new(pattern)
                .map_err(|e| fail(format!("invalid pattern '{pattern}': {e}")))?;
            if !re.is_match(s) {
                return Err(fail(format!("'{s}' does not match pattern '{pattern}'")));
            }
        }
    }

    Ok(())
}

/// The value `min`/`max` are measured against: a scalar number directly, or
/// the length of a string/list (the original source's dual interpretation,
/// carried over unchanged).
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        _ => None,
    }
}
