//! Explicit native-function registration.
//!
//! Rust has no dotted-path dynamic import, so native functions never get
//! discovered by reflection: a host binary calls [`register`] (or builds a
//! [`NativeRegistrar`] directly) at process start, supplying a static
//! `{name, arguments, return_shape, mcp?, handler}` tuple per function. The
//! dispatcher only ever calls into the handler table this builds — it never
//! consults [`crate::discovery::native_parser`]'s companion scan.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::error::BrimleyError;
use crate::model::{FunctionCommon, FunctionKind, FunctionRecord};

pub type NativeFuture = Pin<Box<dyn Future<Output = Result<Value, BrimleyError>> + Send>>;

/// A native handler: resolved arguments plus the shared context in, a JSON
/// result or error out. `external_host_context` carries an opaque handle
/// when the call arrived through an external tool-protocol surface; native
/// handlers that accept such callers downcast it.
pub type NativeHandlerFn =
    Arc<dyn Fn(Value, Arc<Context>, Option<Arc<dyn std::any::Any + Send + Sync>>) -> NativeFuture + Send + Sync>;

/// One registered native function: its static metadata plus its handler.
#[derive(Clone)]
pub struct NativeEntry {
    pub common: FunctionCommon,
    pub reload: bool,
    pub handler: NativeHandlerFn,
}

/// Builder a host binary populates at process start via [`register`] or a
/// direct call to [`NativeRegistrar::add`].
#[derive(Default)]
pub struct NativeRegistrar {
    entries: HashMap<String, NativeEntry>,
}

impl NativeRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a native function registration. Panics on a duplicate name within
    /// the same registrar build — this is a process-start wiring error, not
    /// a runtime condition, so it is caught immediately rather than deferred
    /// to a diagnostic.
    pub fn add(&mut self, mut common: FunctionCommon, reload: bool, handler: NativeHandlerFn) -> &mut Self {
        let name = common.name.clone();
        if common.canonical_id.is_empty() {
            common.canonical_id = format!("native:<registered>:{name}");
        }
        if self.entries.contains_key(&name) {
            panic!("native function '{name}' registered more than once");
        }
        self.entries.insert(name, NativeEntry { common, reload, handler });
        self
    }

    pub fn build(self) -> NativeRegistry {
        NativeRegistry { entries: Arc::new(self.entries) }
    }
}

/// The immutable table the dispatcher and reload engine consult.
#[derive(Clone)]
pub struct NativeRegistry {
    entries: Arc<HashMap<String, NativeEntry>>,
}

impl NativeRegistry {
    pub fn empty() -> Self {
        NativeRegistry { entries: Arc::new(HashMap::new()) }
    }

    pub fn get(&self, name: &str) -> Option<&NativeEntry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &NativeEntry> {
        self.entries.values()
    }

    /// Project the registered entries into discovery-shaped [`FunctionRecord`]s
    /// for the reload engine's functions domain: native functions are always
    /// already "live" from the static table, so this just re-presents them in
    /// the same shape SQL/template discovery produces.
    pub fn as_function_records(&self) -> Vec<FunctionRecord> {
        self.entries
            .values()
            .map(|entry| FunctionRecord {
                common: entry.common.clone(),
                kind: FunctionKind::Native { handler: entry.common.name.clone(), reload: entry.reload },
            })
            .collect()
    }
}

/// Convenience entry point matching the builder-pattern name used in the
/// redesign note: a host binary's `main()` calls `native_registry::register`
/// with a closure populating a [`NativeRegistrar`].
pub fn register(build: impl FnOnce(&mut NativeRegistrar)) -> NativeRegistry {
    let mut registrar = NativeRegistrar::new();
    build(&mut registrar);
    registrar.build()
}
