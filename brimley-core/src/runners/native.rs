//! Native runner: dispatches through the explicit handler table built
//! at process start rather than any dotted-path import resolution.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::error::BrimleyError;
use crate::model::FunctionRecord;
use crate::native_registry::NativeRegistry;

pub async fn run(
    func: &FunctionRecord,
    args: HashMap<String, Value>,
    context: Arc<Context>,
    registry: &NativeRegistry,
    host_context: Option<Arc<dyn Any + Send + Sync>>,
) -> Result<Value, BrimleyError> {
    let entry = registry
        .get(func.name())
        .ok_or_else(|| BrimleyError::NotFound { name: func.name().to_string() })?;
    let payload = Value::Object(args.into_iter().collect());
    (entry.handler)(payload, context, host_context).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrimleyConfig;
    use crate::model::{FunctionCommon, FunctionKind, ReturnShape};
    use crate::native_registry::register;

    fn sample_common(name: &str) -> FunctionCommon {
        FunctionCommon {
            name: name.to_string(),
            description: None,
            canonical_id: String::new(),
            arguments: None,
            return_shape: ReturnShape::Shorthand("string".to_string()),
            mcp: None,
            timeout_seconds: None,
        }
    }

    #[tokio::test]
    async fn runs_the_registered_handler_and_returns_its_value() {
        let registry = register(|r| {
            r.add(sample_common("greet"), false, Arc::new(|args, _ctx, _host| {
                Box::pin(async move { Ok(args["name"].clone()) })
            }));
        });
        let record = FunctionRecord {
            common: sample_common("greet"),
            kind: FunctionKind::Native { handler: "greet".to_string(), reload: false },
        };
        let ctx = Arc::new(Context::new(BrimleyConfig::empty()));
        let mut args = HashMap::new();
        args.insert("name".to_string(), Value::String("Ada".to_string()));

        let result = run(&record, args, ctx, &registry, None).await.unwrap();
        assert_eq!(result, Value::String("Ada".to_string()));
    }

    #[tokio::test]
    async fn unregistered_handler_is_not_found() {
        let registry = NativeRegistry::empty();
        let record = FunctionRecord {
            common: sample_common("missing"),
            kind: FunctionKind::Native { handler: "missing".to_string(), reload: false },
        };
        let ctx = Arc::new(Context::new(BrimleyConfig::empty()));
        let err = run(&record, HashMap::new(), ctx, &registry, None).await.unwrap_err();
        assert_eq!(err.code(), "ERR_NOT_FOUND");
    }
}
