//! Shared project-loading helper used by every CLI subcommand: load
//! `brimley.yaml`, build the [`Context`], open every configured database
//! connection, and run the first discovery + reload cycle synchronously.

use std::path::Path;
use std::sync::Arc;

use brimley_core::context::Context;
use brimley_core::discovery::scan;
use brimley_core::error::BrimleyError;
use brimley_core::native_registry::NativeRegistry;
use brimley_core::reload::{ReloadEngine, ReloadOutcome};
use brimley_core::BrimleyConfig;
use brimley_data_sqlx::AnyConnectionPool;

/// A loaded project: its context (with registries already populated by one
/// reload cycle) plus that cycle's outcome, so callers can decide whether to
/// surface blocked-domain diagnostics before doing real work.
pub struct Project {
    pub context: Arc<Context>,
    pub initial_reload: ReloadOutcome,
}

/// Load `brimley.yaml` and run one discovery + reload cycle, without
/// opening any database connection. Sufficient for commands that only need
/// the registries (`schema-convert`, `build`) — a `sql_function` record
/// describes its schema without ever touching its `connection`.
pub fn discover(root: &Path, native_registry: NativeRegistry) -> Result<Project, BrimleyError> {
    let config = BrimleyConfig::load(root).map_err(|e| BrimleyError::Config(e.to_string()))?;
    let context = Arc::new(Context::new(config));

    let scan_result = scan(root);
    let engine = ReloadEngine::new(native_registry);
    let initial_reload = engine.apply(&context, root, &scan_result);

    Ok(Project { context, initial_reload })
}

/// [`discover`], then connect every entry under `databases:` so SQL
/// functions can actually be invoked.
pub async fn open(root: &Path, native_registry: NativeRegistry) -> Result<Project, BrimleyError> {
    let project = discover(root, native_registry)?;

    for (name, settings) in &project.context.databases {
        let pool = AnyConnectionPool::connect(&settings.url)
            .await
            .map_err(|e| BrimleyError::Config(format!("database '{name}': {e}")))?;
        project.context.set_connection(name.clone(), pool.shared());
    }

    Ok(project)
}
