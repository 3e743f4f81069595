//! `.sql` file parser: frontmatter describes the function, the body
//! becomes `sql_body`.

use super::common::parse_common;
use super::frontmatter;
use crate::model::{FunctionKind, FunctionRecord};

pub fn parse(content: &str) -> Result<FunctionRecord, String> {
    let (value, body) = frontmatter::parse(content).map_err(|(framing, e)| {
        format!("invalid YAML frontmatter: {e} (hint: {})", framing.suggestion())
    })?;

    let common = parse_common(&value)?;

    let mapping = value.as_mapping();
    let connection = mapping
        .and_then(|m| m.get("connection"))
        .and_then(serde_yaml::Value::as_str)
        .unwrap_or("default")
        .to_string();

    if body.trim().is_empty() {
        return Err("missing required SQL body".to_string());
    }

    Ok(FunctionRecord {
        common,
        kind: FunctionKind::Sql { connection, sql_body: body },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_sql_function() {
        let content = "/*\n---\nname: get_users\ntype: sql_function\nreturn_shape: list[dict]\n---\n*/\nSELECT * FROM users WHERE id = :id";
        let record = parse(content).unwrap();
        assert_eq!(record.name(), "get_users");
        match record.kind {
            FunctionKind::Sql { connection, sql_body } => {
                assert_eq!(connection, "default");
                assert!(sql_body.contains(":id"));
            }
            _ => panic!("expected Sql kind"),
        }
    }

    #[test]
    fn connection_defaults_when_absent() {
        let content = "---\nname: ping\ntype: sql_function\nreturn_shape: void\n---\nSELECT 1";
        let record = parse(content).unwrap();
        match record.kind {
            FunctionKind::Sql { connection, .. } => assert_eq!(connection, "default"),
            _ => panic!("expected Sql kind"),
        }
    }

    #[test]
    fn empty_body_is_rejected() {
        let content = "---\nname: ping\ntype: sql_function\nreturn_shape: void\n---\n";
        assert!(parse(content).is_err());
    }
}
