//! The central execution aggregate injected into every call.
//!
//! `Context` holds the loaded configuration sections, the mutable `app`
//! state bag, the database connection table, and the three live registries.
//! Registries swap per-domain by atomic reference publication: a
//! call in flight holds the `Arc` it loaded at dispatch time and is
//! unaffected by a concurrent reload; a call issued after a reload observes
//! the new registry because it loads a fresh `Arc` from the `ArcSwap` cell.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use brimley_data::SharedConnectionPool;
use dashmap::DashMap;

use crate::config::{BrimleyConfig, ConfigValue};
use crate::model::{EntityRecord, FunctionRecord};
use crate::registry::Registry;

/// Name-keyed handle to a function registry plus the derived tool-export
/// subset, published together so a functions-domain swap and its
/// tool-exports-domain swap are each a single pointer publish.
pub struct Registries {
    pub entities: Arc<Registry<EntityRecord>>,
    pub functions: Arc<Registry<FunctionRecord>>,
    pub tool_exports: Arc<Registry<FunctionRecord>>,
}

impl Registries {
    pub fn empty() -> Self {
        Registries {
            entities: Arc::new(Registry::new()),
            functions: Arc::new(Registry::new()),
            tool_exports: Arc::new(Registry::new()),
        }
    }
}

/// The execution context passed to every dispatched call.
pub struct Context {
    pub config: BrimleyConfig,
    /// Mutable request/session-scoped state bag, seeded from `config.state`.
    pub app: DashMap<String, ConfigValue>,
    /// Database connection settings keyed by name, from `config.databases`.
    pub databases: HashMap<String, crate::config::DatabaseSettings>,
    /// Opened connection handles keyed by name, populated by the host after
    /// construction — `brimley-core` only knows the abstract
    /// [`brimley_data::ConnectionPool`] trait; a concrete driver crate such as
    /// `brimley-data-sqlx` supplies the instances.
    connections: DashMap<String, SharedConnectionPool>,
    registries: ArcSwap<Registries>,
}

impl Context {
    pub fn new(config: BrimleyConfig) -> Self {
        let app = DashMap::new();
        for (k, v) in config.state.clone() {
            app.insert(k, v);
        }
        let databases = config.databases.clone();
        Context {
            config,
            app,
            databases,
            connections: DashMap::new(),
            registries: ArcSwap::new(Arc::new(Registries::empty())),
        }
    }

    /// Bind an opened connection handle under `name`, overwriting any prior
    /// binding for that name.
    pub fn set_connection(&self, name: impl Into<String>, pool: SharedConnectionPool) {
        self.connections.insert(name.into(), pool);
    }

    pub fn connection(&self, name: &str) -> Option<SharedConnectionPool> {
        self.connections.get(name).map(|entry| entry.value().clone())
    }

    pub fn connection_names(&self) -> Vec<String> {
        self.connections.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Snapshot the currently published registries. A caller holds this
    /// snapshot for the lifetime of one call so a concurrent reload never
    /// changes behavior mid-call.
    pub fn registries(&self) -> Arc<Registries> {
        self.registries.load_full()
    }

    /// Atomically publish a new entity registry.
    pub fn swap_entities(&self, entities: Arc<Registry<EntityRecord>>) {
        let current = self.registries.load_full();
        self.registries.store(Arc::new(Registries {
            entities,
            functions: current.functions.clone(),
            tool_exports: current.tool_exports.clone(),
        }));
    }

    /// Atomically publish a new function registry.
    pub fn swap_functions(&self, functions: Arc<Registry<FunctionRecord>>) {
        let current = self.registries.load_full();
        self.registries.store(Arc::new(Registries {
            entities: current.entities.clone(),
            functions,
            tool_exports: current.tool_exports.clone(),
        }));
    }

    /// Atomically publish a new tool-exports registry, derived from the
    /// functions domain it depends on.
    pub fn swap_tool_exports(&self, tool_exports: Arc<Registry<FunctionRecord>>) {
        let current = self.registries.load_full();
        self.registries.store(Arc::new(Registries {
            entities: current.entities.clone(),
            functions: current.functions.clone(),
            tool_exports,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builtin_entities;

    #[test]
    fn new_context_seeds_app_state_from_config() {
        let cfg = BrimleyConfig::from_yaml_str("state:\n  counter: 0\n").unwrap();
        let ctx = Context::new(cfg);
        assert!(ctx.app.contains_key("counter"));
    }

    #[test]
    fn registry_swap_is_independent_per_domain() {
        let ctx = Context::new(BrimleyConfig::empty());
        let mut entities = Registry::new();
        entities
            .register_all(builtin_entities().into_iter().map(|e| (e.name.clone(), e)))
            .unwrap();
        ctx.swap_entities(Arc::new(entities));

        let before = ctx.registries();
        assert_eq!(before.entities.length(), 2);
        assert_eq!(before.functions.length(), 0);

        let functions = Registry::new();
        ctx.swap_functions(Arc::new(functions));

        let after = ctx.registries();
        assert_eq!(after.entities.length(), 2);
        assert_eq!(after.functions.length(), 0);
    }

    #[test]
    fn in_flight_snapshot_is_unaffected_by_later_swap() {
        let ctx = Context::new(BrimleyConfig::empty());
        let snapshot = ctx.registries();
        assert_eq!(snapshot.functions.length(), 0);

        let functions: Registry<FunctionRecord> = Registry::new();
        ctx.swap_functions(Arc::new(functions));

        // The snapshot taken before the swap still reflects the old state.
        assert_eq!(snapshot.functions.length(), 0);
        assert_eq!(ctx.registries().functions.length(), 0);
    }
}
