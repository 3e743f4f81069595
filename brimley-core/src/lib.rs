pub mod config;
pub mod context;
pub mod diagnostic;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod mapper;
pub mod model;
pub mod naming;
pub mod native_registry;
pub mod registry;
pub mod reload;
pub mod resolver;
pub mod runners;
pub mod runtime;
pub mod state_dir;
pub mod tool_export;
pub mod types;
pub mod watcher;

pub use config::{BrimleyConfig, ConfigError, ConfigValue};
pub use context::{Context, Registries};
pub use diagnostic::{codes, Diagnostic, Severity};
pub use discovery::ScanResult;
pub use dispatcher::Dispatcher;
pub use error::BrimleyError;
pub use model::{EntityRecord, FunctionRecord};
pub use native_registry::{NativeRegistrar, NativeRegistry};
pub use registry::Registry;
pub use reload::ReloadEngine;
pub use runtime::RuntimeController;
pub use types::{normalize, CanonicalType};
pub use watcher::{PollingWatcher, WatcherState};
