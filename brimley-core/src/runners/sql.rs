//! SQL runner: looks up the named connection in the context, executes
//! with named parameters, and shapes the outcome by the function's declared
//! return type.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use brimley_data::SqlOutcome;

use crate::context::Context;
use crate::error::BrimleyError;
use crate::model::{FunctionRecord, ReturnShape};

pub async fn run(
    func: &FunctionRecord,
    connection: &str,
    sql_body: &str,
    args: HashMap<String, Value>,
    context: Arc<Context>,
) -> Result<Value, BrimleyError> {
    let pool = context.connection(connection).ok_or_else(|| BrimleyError::NoConnection {
        connection: connection.to_string(),
        available: context.connection_names(),
    })?;

    let outcome = pool
        .execute(sql_body, &args)
        .await
        .map_err(|e| BrimleyError::Runner { function: func.name().to_string(), source: Box::new(e) })?;

    Ok(match outcome {
        SqlOutcome::Rows(rows) => {
            Value::Array(rows.into_iter().map(|row| Value::Object(row.into_iter().collect())).collect())
        }
        SqlOutcome::RowsAffected(count) => {
            if is_void_shape(&func.common.return_shape) {
                Value::Null
            } else {
                serde_json::json!({ "rows_affected": count })
            }
        }
    })
}

fn is_void_shape(shape: &ReturnShape) -> bool {
    matches!(shape, ReturnShape::Shorthand(expr) if expr.eq_ignore_ascii_case("void"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrimleyConfig;
    use crate::model::{FunctionCommon, FunctionKind};
    use async_trait::async_trait;
    use brimley_data::{ConnectionPool, DataError};

    struct FakeRows;

    #[async_trait]
    impl ConnectionPool for FakeRows {
        async fn execute(&self, _sql: &str, _params: &HashMap<String, Value>) -> Result<SqlOutcome, DataError> {
            let mut row = HashMap::new();
            row.insert("id".to_string(), serde_json::json!(1));
            Ok(SqlOutcome::Rows(vec![row]))
        }
    }

    struct FakeAffected;

    #[async_trait]
    impl ConnectionPool for FakeAffected {
        async fn execute(&self, _sql: &str, _params: &HashMap<String, Value>) -> Result<SqlOutcome, DataError> {
            Ok(SqlOutcome::RowsAffected(3))
        }
    }

    fn sample_record(return_shape: ReturnShape) -> FunctionRecord {
        FunctionRecord {
            common: FunctionCommon {
                name: "q".to_string(),
                description: None,
                canonical_id: String::new(),
                arguments: None,
                return_shape,
                mcp: None,
                timeout_seconds: None,
            },
            kind: FunctionKind::Sql { connection: "primary".to_string(), sql_body: "select 1".to_string() },
        }
    }

    #[tokio::test]
    async fn missing_connection_is_no_connection_error() {
        let ctx = Arc::new(Context::new(BrimleyConfig::empty()));
        let record = sample_record(ReturnShape::Inline { inline: Default::default() });
        let err = run(&record, "primary", "select 1", HashMap::new(), ctx).await.unwrap_err();
        assert_eq!(err.code(), "ERR_NO_CONNECTION");
    }

    #[tokio::test]
    async fn row_returning_statement_maps_to_array_of_objects() {
        let ctx = Arc::new(Context::new(BrimleyConfig::empty()));
        ctx.set_connection("primary", Arc::new(FakeRows));
        let record = sample_record(ReturnShape::Inline { inline: Default::default() });
        let result = run(&record, "primary", "select * from t", HashMap::new(), ctx).await.unwrap();
        assert_eq!(result, serde_json::json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn non_row_statement_with_void_shape_discards_rows_affected() {
        let ctx = Arc::new(Context::new(BrimleyConfig::empty()));
        ctx.set_connection("primary", Arc::new(FakeAffected));
        let record = sample_record(ReturnShape::Shorthand("void".to_string()));
        let result = run(&record, "primary", "delete from t", HashMap::new(), ctx).await.unwrap();
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn non_row_statement_with_non_void_shape_reports_rows_affected() {
        let ctx = Arc::new(Context::new(BrimleyConfig::empty()));
        ctx.set_connection("primary", Arc::new(FakeAffected));
        let record = sample_record(ReturnShape::Inline { inline: Default::default() });
        let result = run(&record, "primary", "update t set x = 1", HashMap::new(), ctx).await.unwrap();
        assert_eq!(result, serde_json::json!({ "rows_affected": 3 }));
    }
}
