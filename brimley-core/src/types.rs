//! Canonical type grammar: the constrained set of scalar, list, and
//! entity type expressions accepted for argument and return-shape declarations.
//!
//! `normalize` is a pure function: same input, allow-flags in, same canonical
//! string or error out, every time. It does not consult the entity registry —
//! an identifier that is not a known scalar is accepted as a bare entity name
//! and it is up to the caller (argument resolver, result mapper) to confirm
//! that name actually resolves to a registered entity.

use crate::error::BrimleyError;

/// A single normalized type expression, either a scalar/entity or a
/// one-dimensional list of one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CanonicalType {
    Scalar(Scalar),
    Entity(String),
    List(Box<CanonicalType>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    String,
    Int,
    Float,
    Bool,
    Decimal,
    Date,
    DateTime,
    Primitive,
    Void,
}

impl Scalar {
    fn as_str(&self) -> &'static str {
        match self {
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
}

impl CanonicalType {
    /// Render back to the canonical string form (`string`, `int[]`, `User[]`, ...).
    pub fn to_canonical_string(&self) -> String {
        match self {
            CanonicalType::Scalar(s) => s.as_str().to_string(),
            CanonicalType::Entity(name) => name.clone(),
            CanonicalType::List(inner) => format!("{}[]", inner.to_canonical_string()),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, CanonicalType::List(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, CanonicalType::Scalar(Scalar::Void))
    }

    /// The element type of a list, or `self` if this is not a list.
    pub fn element_type(&self) -> &CanonicalType {
        match self {
            CanonicalType::List(inner) => inner,
            other => other,
        }
    }
}

fn canonical_scalar_alias(lowered: &str) -> Option<Scalar> {
    match lowered {
        "str" | "string" => Some(Scalar::String),
        "int" | "integer" => Some(Scalar::Int),
        "float" | "number" => Some(Scalar::Float),
        "bool" | "boolean" => Some(Scalar::Bool),
        "decimal" => Some(Scalar::Decimal),
        "date" => Some(Scalar::Date),
        "datetime" => Some(Scalar::DateTime),
        "primitive" | "any" => Some(Scalar::Primitive),
        _ => None,
    }
}

const OPEN_CONTAINER_NAMES: &[&str] = &["dict", "object", "list", "array", "set", "tuple"];

fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Normalize a raw type expression string into a [`CanonicalType`].
///
/// Rejects union syntax (`|`, `Optional[...]`, `Union[...]`), nested lists,
/// and open containers (`dict`, `object`, a bare `list`) regardless of
/// `allow_legacy_containers` — that flag only widens which *spellings* of
/// `T[]` and scalar aliases are accepted, it never re-opens forbidden shapes.
pub fn normalize(
    expr: &str,
    allow_void: bool,
    allow_legacy_containers: bool,
) -> Result<CanonicalType, BrimleyError> {
    let normalized = expr.trim();
    if normalized.is_empty() {
        return Err(unsupported(expr, "type expression cannot be empty"));
    }

    let lowered = normalized.to_lowercase();
    if normalized.contains('|') || lowered.starts_with("optional[") || lowered.starts_with("union[") {
        return Err(unsupported(expr, "union types are not supported"));
    }

    // Generic `List[T]` / `list[T]` legacy spelling.
    if let Some(inner_expr) = strip_generic_list(normalized) {
        let inner = normalize(inner_expr, false, allow_legacy_containers)?;
        if inner.is_list() {
            return Err(unsupported(expr, "only one-dimensional lists are supported"));
        }
        return Ok(CanonicalType::List(Box::new(inner)));
    }

    // `T[]` spelling.
    if let Some(inner_expr) = normalized.strip_suffix("[]") {
        let inner = normalize(inner_expr.trim(), false, allow_legacy_containers)?;
        if inner.is_list() {
            return Err(unsupported(expr, "only one-dimensional lists are supported"));
        }
        return Ok(CanonicalType::List(Box::new(inner)));
    }

    if allow_void && matches!(lowered.as_str(), "void" | "none" | "nonetype") {
        return Ok(CanonicalType::Scalar(Scalar::Void));
    }

    if let Some(scalar) = canonical_scalar_alias(&lowered) {
        return Ok(CanonicalType::Scalar(scalar));
    }

    if OPEN_CONTAINER_NAMES.contains(&lowered.as_str()) {
        if allow_legacy_containers {
            return Err(unsupported(
                expr,
                "open container types are not representable in the canonical type grammar",
            ));
        }
        return Err(unsupported(
            expr,
            "unsupported open container type; use primitives/entities and one-dimensional lists only",
        ));
    }

    if normalized.contains('[') || normalized.contains(']') {
        return Err(unsupported(expr, "unsupported generic type expression"));
    }

    let entity_candidate = normalized.rsplit('.').next().unwrap_or(normalized);
    if !is_valid_identifier(entity_candidate) {
        return Err(unsupported(expr, "unsupported type expression"));
    }

    Ok(CanonicalType::Entity(entity_candidate.to_string()))
}

fn strip_generic_list(normalized: &str) -> Option<&str> {
    let stripped = normalized.strip_prefix("typing.").unwrap_or(normalized);
    let rest = stripped
        .strip_prefix("List[")
        .or_else(|| stripped.strip_prefix("list["))?;
    rest.strip_suffix(']')
}

fn unsupported(expr: &str, detail: &str) -> BrimleyError {
    BrimleyError::SchemaUnsupportedKeyword { keyword: format!("{expr} ({detail})") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_scalar_aliases() {
        assert_eq!(normalize("str", false, false).unwrap(), CanonicalType::Scalar(Scalar::String));
        assert_eq!(normalize("integer", false, false).unwrap(), CanonicalType::Scalar(Scalar::Int));
        assert_eq!(normalize("boolean", false, false).unwrap(), CanonicalType::Scalar(Scalar::Bool));
        assert_eq!(normalize("number", false, false).unwrap(), CanonicalType::Scalar(Scalar::Float));
    }

    #[test]
    fn normalizes_bracket_list_form() {
        let t = normalize("int[]", false, false).unwrap();
        assert_eq!(t.to_canonical_string(), "int[]");
    }

    #[test]
    fn normalizes_legacy_generic_list_form() {
        let t = normalize("List[string]", false, true).unwrap();
        assert_eq!(t.to_canonical_string(), "string[]");
    }

    #[test]
    fn rejects_nested_lists() {
        let err = normalize("int[][]", false, false).unwrap_err();
        assert_eq!(err.code(), "ERR_SCHEMA_UNSUPPORTED_KEYWORD");
    }

    #[test]
    fn rejects_union_and_optional() {
        assert!(normalize("string | int", false, false).is_err());
        assert!(normalize("Optional[string]", false, false).is_err());
        assert!(normalize("Union[string, int]", false, false).is_err());
    }

    #[test]
    fn rejects_open_containers_even_with_legacy_flag() {
        assert!(normalize("dict", false, true).is_err());
        assert!(normalize("object", false, true).is_err());
        assert!(normalize("list", false, true).is_err());
    }

    #[test]
    fn void_only_accepted_when_allowed() {
        assert!(normalize("void", false, false).is_err());
        assert_eq!(normalize("void", true, false).unwrap(), CanonicalType::Scalar(Scalar::Void));
    }

    #[test]
    fn bare_identifier_is_an_entity_reference() {
        let t = normalize("User", false, false).unwrap();
        assert_eq!(t, CanonicalType::Entity("User".to_string()));
    }

    #[test]
    fn round_trips_through_normalize_twice() {
        for expr in ["string", "int[]", "User", "User[]", "datetime"] {
            let once = normalize(expr, false, false).unwrap();
            let twice = normalize(&once.to_canonical_string(), false, false).unwrap();
            assert_eq!(once, twice);
        }
    }
}
