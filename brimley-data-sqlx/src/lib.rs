//! SQLx-backed [`ConnectionPool`] for the SQL runner's `databases:` section.
//!
//! The SQL runner in `brimley-core` only knows the driver-agnostic
//! `ConnectionPool` trait; this crate is the one adapter crate the runner
//! actually talks to. It binds that trait to `sqlx::AnyPool` so a single
//! code path covers SQLite, Postgres, and MySQL by feature flag rather than
//! one implementation per driver — the function author writes `:name`
//! parameters once and the `connection`'s `url` scheme picks the backend.
//!
//! Named parameters are rewritten to the positional `?` placeholders
//! `sqlx::Any` requires before execution; row values are decoded into JSON
//! by trying a fixed cascade of concrete types, since `AnyRow` erases the
//! underlying driver's column type.

pub mod error;

pub use error::{SqlxErrorExt, SqlxResult};

use std::collections::HashMap;

use async_trait::async_trait;
use brimley_data::{ConnectionPool, DataError, SharedConnectionPool, SqlOutcome};
use serde_json::Value;
use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::{Column, Row};

/// A named connection backed by `sqlx::AnyPool`, as opened from one entry
/// of `brimley.yaml`'s `databases:` map.
pub struct AnyConnectionPool {
    pool: sqlx::AnyPool,
}

impl AnyConnectionPool {
    /// Connect to `url` using whichever `sqlx::any` driver its scheme
    /// selects (`sqlite:`, `postgres:`, `mysql:` — each must be enabled via
    /// this crate's matching feature).
    pub async fn connect(url: &str) -> Result<Self, DataError> {
        install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(8)
            .connect(url)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        tracing::info!(scheme = %url.split(':').next().unwrap_or(""), "database connection pool opened");
        Ok(AnyConnectionPool { pool })
    }

    /// Wrap in the `Arc<dyn ConnectionPool>` handle [`brimley_core::context::Context`]
    /// stores per database name.
    pub fn shared(self) -> SharedConnectionPool {
        std::sync::Arc::new(self)
    }
}

#[async_trait]
impl ConnectionPool for AnyConnectionPool {
    async fn execute(&self, sql: &str, params: &HashMap<String, Value>) -> Result<SqlOutcome, DataError> {
        let (rewritten, names) = rewrite_named_params(sql);

        if looks_like_query(sql) {
            let mut query = sqlx::query(&rewritten);
            for name in &names {
                query = bind_value(query, params.get(name).cloned());
            }
            let rows = query.fetch_all(&self.pool).await.map_err(SqlxErrorExt::into_data_error)?;
            let mapped: Result<Vec<_>, DataError> = rows.iter().map(row_to_map).collect();
            Ok(SqlOutcome::Rows(mapped?))
        } else {
            let mut query = sqlx::query(&rewritten);
            for name in &names {
                query = bind_value(query, params.get(name).cloned());
            }
            let result = query.execute(&self.pool).await.map_err(SqlxErrorExt::into_data_error)?;
            Ok(SqlOutcome::RowsAffected(result.rows_affected()))
        }
    }
}

/// Rewrite `:name` placeholders into positional `?` bind markers, in
/// first-occurrence order. Content inside `'...'`/`"..."` string literals is
/// left untouched, and a Postgres-style `::type` cast is not mistaken for a
/// named parameter.
fn rewrite_named_params(sql: &str) -> (String, Vec<String>) {
    let chars: Vec<char> = sql.chars().collect();
    let mut output = String::with_capacity(sql.len());
    let mut names = Vec::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' && !in_double {
            in_single = !in_single;
            output.push(c);
            i += 1;
            continue;
        }
        if c == '"' && !in_single {
            in_double = !in_double;
            output.push(c);
            i += 1;
            continue;
        }
        if !in_single && !in_double && c == ':' {
            if chars.get(i + 1) == Some(&':') {
                output.push_str("::");
                i += 2;
                continue;
            }
            let ident_len = chars[i + 1..].iter().take_while(|ch| ch.is_alphanumeric() || **ch == '_').count();
            if ident_len > 0 {
                let name: String = chars[i + 1..i + 1 + ident_len].iter().collect();
                names.push(name);
                output.push('?');
                i += 1 + ident_len;
                continue;
            }
        }
        output.push(c);
        i += 1;
    }

    (output, names)
}

/// Whether `sql` is a row-returning statement rather than DML/DDL.
fn looks_like_query(sql: &str) -> bool {
    let upper: String = sql.trim_start().chars().take(16).collect::<String>().to_uppercase();
    ["SELECT", "WITH", "PRAGMA", "SHOW", "EXPLAIN"].iter().any(|kw| upper.starts_with(kw))
}

type AnyQuery<'q> = sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>>;

fn bind_value(query: AnyQuery<'_>, value: Option<Value>) -> AnyQuery<'_> {
    match value {
        None | Some(Value::Null) => query.bind(None::<String>),
        Some(Value::Bool(b)) => query.bind(b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64().unwrap_or(0.0)),
        },
        Some(Value::String(s)) => query.bind(s),
        Some(other) => query.bind(other.to_string()),
    }
}

/// Decode one row into a JSON-valued map, keyed by column name. `AnyRow`
/// erases the concrete driver type per column, so each cell is decoded by
/// trying a fixed cascade of types until one succeeds.
fn row_to_map(row: &sqlx::any::AnyRow) -> Result<HashMap<String, Value>, DataError> {
    let mut map = HashMap::with_capacity(row.columns().len());
    for (idx, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), any_cell_to_json(row, idx)?);
    }
    Ok(map)
}

fn any_cell_to_json(row: &sqlx::any::AnyRow, idx: usize) -> Result<Value, DataError> {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return Ok(v.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return Ok(v.and_then(serde_json::Number::from_f64).map(Value::Number).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return Ok(v.map(Value::Bool).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return Ok(v.map(Value::String).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return Ok(v.map(hex::encode).map(Value::String).unwrap_or(Value::Null));
    }
    Err(DataError::Other(format!("column {idx} did not decode as any supported type")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_named_params_to_positional_in_order() {
        let (sql, names) = rewrite_named_params("SELECT * FROM users WHERE id = :id AND name = :name");
        assert_eq!(sql, "SELECT * FROM users WHERE id = ? AND name = ?");
        assert_eq!(names, vec!["id".to_string(), "name".to_string()]);
    }

    #[test]
    fn does_not_rewrite_inside_string_literals() {
        let (sql, names) = rewrite_named_params("SELECT ':id' AS literal, col FROM t WHERE x = :x");
        assert_eq!(sql, "SELECT ':id' AS literal, col FROM t WHERE x = ?");
        assert_eq!(names, vec!["x".to_string()]);
    }

    #[test]
    fn postgres_style_cast_is_not_mistaken_for_a_named_param() {
        let (sql, names) = rewrite_named_params("SELECT amount::float FROM t WHERE id = :id");
        assert_eq!(sql, "SELECT amount::float FROM t WHERE id = ?");
        assert_eq!(names, vec!["id".to_string()]);
    }

    #[test]
    fn query_keywords_are_recognized_case_insensitively() {
        assert!(looks_like_query("select 1"));
        assert!(looks_like_query("  WITH cte AS (SELECT 1) SELECT * FROM cte"));
        assert!(!looks_like_query("insert into t values (1)"));
        assert!(!looks_like_query("UPDATE t SET x = 1"));
    }
}
