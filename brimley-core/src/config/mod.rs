mod loader;
pub mod secrets;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

pub use secrets::{DefaultSecretResolver, SecretResolver};
pub use value::{ConfigValue, FromConfigValue};

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading `brimley.yaml`.
    Load(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// `brimley:` section — process identity and logging defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrimleySettings {
    pub env: String,
    pub app_name: String,
    pub log_level: String,
}

impl Default for BrimleySettings {
    fn default() -> Self {
        BrimleySettings {
            env: "dev".to_string(),
            app_name: "brimley".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// `mcp:` section — tool-export transport configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct McpSettings {
    pub embedded: bool,
    pub transport: McpTransport,
    pub host: String,
    pub port: u16,
}

impl Default for McpSettings {
    fn default() -> Self {
        McpSettings { embedded: true, transport: McpTransport::Stdio, host: "127.0.0.1".to_string(), port: 8787 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpTransport {
    Sse,
    Stdio,
}

/// `auto_reload:` section — polling watcher configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutoReloadSettings {
    pub enabled: bool,
    pub interval_ms: u64,
    pub debounce_ms: u64,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for AutoReloadSettings {
    fn default() -> Self {
        AutoReloadSettings {
            enabled: true,
            interval_ms: 1000,
            debounce_ms: 300,
            include_patterns: vec![
                "*.sql".to_string(),
                "*.md".to_string(),
                "*.txt".to_string(),
                "*.jinja".to_string(),
                "*.j2".to_string(),
                "*.rs".to_string(),
            ],
            exclude_patterns: vec![
                "target/*".to_string(),
                ".git/*".to_string(),
                ".brimley/*".to_string(),
            ],
        }
    }
}

/// A single entry under `databases:`.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default)]
    pub connect_args: HashMap<String, ConfigValue>,
}

/// `execution.queue` sub-section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    pub max_size: usize,
    pub on_full: OnFullPolicy,
}

impl Default for QueueSettings {
    fn default() -> Self {
        QueueSettings { max_size: 64, on_full: OnFullPolicy::Block }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFullPolicy {
    Block,
    Reject,
}

/// `execution:` section — dispatcher sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    pub thread_pool_size: usize,
    pub timeout_seconds: u64,
    pub queue: QueueSettings,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        ExecutionSettings { thread_pool_size: 8, timeout_seconds: 30, queue: QueueSettings::default() }
    }
}

/// Application configuration loaded from `brimley.yaml`, with `${VAR}` /
/// `${VAR:default}` placeholders interpolated and only the allow-listed
/// top-level sections retained.
#[derive(Debug, Clone)]
pub struct BrimleyConfig {
    pub brimley: BrimleySettings,
    pub config: HashMap<String, ConfigValue>,
    pub mcp: McpSettings,
    pub auto_reload: AutoReloadSettings,
    pub state: HashMap<String, ConfigValue>,
    pub databases: HashMap<String, DatabaseSettings>,
    pub execution: ExecutionSettings,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSections {
    brimley: BrimleySettings,
    config: HashMap<String, ConfigValue>,
    mcp: McpSettings,
    auto_reload: AutoReloadSettings,
    state: HashMap<String, ConfigValue>,
    databases: HashMap<String, DatabaseSettings>,
    execution: ExecutionSettings,
}

impl BrimleyConfig {
    /// Load `brimley.yaml` from `root` (missing file yields all-defaults),
    /// resolving placeholders with the given resolver.
    pub fn load_with_resolver(root: &Path, resolver: &dyn SecretResolver) -> Result<Self, ConfigError> {
        let path = root.join("brimley.yaml");
        let filtered = loader::load_file(&path, resolver)?;
        Self::from_filtered_value(filtered)
    }

    /// Load `brimley.yaml` from `root` using the default environment-variable
    /// resolver.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        Self::load_with_resolver(root, &DefaultSecretResolver)
    }

    /// Parse configuration directly from a YAML string (useful for tests).
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let filtered = loader::load_and_filter(yaml, &DefaultSecretResolver)?;
        Self::from_filtered_value(filtered)
    }

    /// All-default configuration, as if `brimley.yaml` were absent.
    pub fn empty() -> Self {
        let raw = RawSections::default();
        Self::from_raw(raw)
    }

    fn from_filtered_value(value: serde_yaml::Value) -> Result<Self, ConfigError> {
        let raw: RawSections = serde_yaml::from_value(value).map_err(|e| ConfigError::Load(e.to_string()))?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawSections) -> Self {
        BrimleyConfig {
            brimley: raw.brimley,
            config: raw.config,
            mcp: raw.mcp,
            auto_reload: raw.auto_reload,
            state: raw.state,
            databases: raw.databases,
            execution: raw.execution,
        }
    }

    /// Look up a value in the free-form `config:` map.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self.config.get(key).ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_documented_defaults() {
        let cfg = BrimleyConfig::empty();
        assert_eq!(cfg.brimley.env, "dev");
        assert_eq!(cfg.mcp.transport, McpTransport::Stdio);
        assert_eq!(cfg.auto_reload.interval_ms, 1000);
        assert_eq!(cfg.execution.queue.on_full, OnFullPolicy::Block);
    }

    #[test]
    fn parses_full_section_set_from_yaml() {
        let yaml = r#"
brimley:
  env: prod
  app_name: orders-service
  log_level: warn
config:
  retry_budget: 3
mcp:
  embedded: false
  transport: sse
  host: 0.0.0.0
  port: 9000
auto_reload:
  enabled: false
  interval_ms: 2000
  debounce_ms: 500
state:
  counter: 0
databases:
  primary:
    url: "postgres://localhost/app"
execution:
  thread_pool_size: 16
  timeout_seconds: 5
  queue:
    max_size: 128
    on_full: reject
"#;
        let cfg = BrimleyConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.brimley.env, "prod");
        assert_eq!(cfg.mcp.port, 9000);
        assert!(!cfg.auto_reload.enabled);
        assert_eq!(cfg.databases["primary"].url, "postgres://localhost/app");
        assert_eq!(cfg.execution.queue.max_size, 128);
        assert_eq!(cfg.get::<i64>("retry_budget").unwrap(), 3);
    }

    #[test]
    fn unknown_top_level_section_does_not_fail_parsing() {
        let yaml = "brimley:\n  app_name: x\nnonexistent_section:\n  whatever: true\n";
        let cfg = BrimleyConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.brimley.app_name, "x");
    }

    #[test]
    fn placeholder_with_default_resolves_when_env_var_unset() {
        std::env::remove_var("BRIMLEY_TEST_DB_HOST");
        let yaml = "databases:\n  primary:\n    url: \"postgres://${BRIMLEY_TEST_DB_HOST:localhost}/app\"\n";
        let cfg = BrimleyConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.databases["primary"].url, "postgres://localhost/app");
    }
}
