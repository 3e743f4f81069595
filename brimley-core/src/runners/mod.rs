//! Function runners: one module per `FunctionKind`, fanned out from a
//! single entry point the dispatcher calls. Every runner hands its raw output
//! to [`crate::mapper::map`] before returning, so callers of [`run_call`]
//! always get a validated value or a typed [`BrimleyError`].

mod native;
mod sql;
mod template;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::error::BrimleyError;
use crate::model::{FunctionKind, FunctionRecord};
use crate::native_registry::NativeRegistry;

pub async fn run_call(
    func: &FunctionRecord,
    args: HashMap<String, Value>,
    context: Arc<Context>,
    native_registry: &NativeRegistry,
    host_context: Option<Arc<dyn Any + Send + Sync>>,
) -> Result<Value, BrimleyError> {
    let raw = match &func.kind {
        FunctionKind::Native { .. } => native::run(func, args, context.clone(), native_registry, host_context).await?,
        FunctionKind::Sql { connection, sql_body } => sql::run(func, connection, sql_body, args, context.clone()).await?,
        FunctionKind::Template { .. } => template::run(func, args, context.clone())?,
    };
    crate::mapper::map(raw, &func.common.return_shape, func.name(), &context)
}
