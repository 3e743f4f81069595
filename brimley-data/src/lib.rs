//! Backend-agnostic connection abstraction for Brimley's SQL function runner
//! This crate defines the pure trait and error types; a concrete
//! backend (SQLite/Postgres/MySQL) lives in `brimley-data-sqlx`.
//!
//! The SQL runner never talks to a driver directly — it looks up a named
//! [`ConnectionPool`] by the function's declared `connection` name and calls
//! [`ConnectionPool::execute`] with the SQL body and resolved named
//! parameters. Row-returning statements come back as [`SqlOutcome::Rows`];
//! everything else comes back as [`SqlOutcome::RowsAffected`].

pub mod error;

pub use error::DataError;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

/// The outcome of executing one SQL statement against a named connection.
#[derive(Debug, Clone)]
pub enum SqlOutcome {
    /// A row-returning statement, materialized as one JSON object per row.
    Rows(Vec<HashMap<String, Value>>),
    /// A non-row statement (`INSERT`/`UPDATE`/`DELETE`/DDL).
    RowsAffected(u64),
}

/// A named, pooled connection a backend crate implements once per driver.
/// Implementations own named-parameter binding (`:name` placeholders) and
/// row materialization into JSON so the SQL runner stays driver-agnostic.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    async fn execute(&self, sql: &str, params: &HashMap<String, Value>) -> Result<SqlOutcome, DataError>;
}

/// The shared handle the context stores per database name.
pub type SharedConnectionPool = std::sync::Arc<dyn ConnectionPool>;

/// Re-exports of the most commonly used data types.
pub mod prelude {
    pub use crate::{ConnectionPool, DataError, SharedConnectionPool, SqlOutcome};
}
