use brimley_core::config::{BrimleyConfig, McpTransport, OnFullPolicy};

#[test]
fn empty_config_has_no_databases_or_free_form_keys() {
    let config = BrimleyConfig::empty();
    assert!(config.databases.is_empty());
    assert!(config.get::<String>("nonexistent").is_err());
}

#[test]
fn loading_a_missing_brimley_yaml_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = BrimleyConfig::load(dir.path()).unwrap();
    assert_eq!(config.brimley.env, "dev");
    assert_eq!(config.execution.thread_pool_size, 8);
}

#[test]
fn loading_brimley_yaml_from_disk_picks_up_every_section() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("brimley.yaml"),
        r#"
brimley:
  env: prod
  app_name: checkout
config:
  retry_budget: 5
mcp:
  transport: stdio
  port: 9100
databases:
  primary:
    url: "sqlite::memory:"
execution:
  thread_pool_size: 4
  queue:
    max_size: 16
    on_full: reject
"#,
    )
    .unwrap();

    let config = BrimleyConfig::load(dir.path()).unwrap();
    assert_eq!(config.brimley.app_name, "checkout");
    assert_eq!(config.mcp.transport, McpTransport::Stdio);
    assert_eq!(config.mcp.port, 9100);
    assert_eq!(config.databases["primary"].url, "sqlite::memory:");
    assert_eq!(config.execution.queue.on_full, OnFullPolicy::Reject);
    assert_eq!(config.get::<i64>("retry_budget").unwrap(), 5);
}

#[test]
fn database_url_placeholders_resolve_against_the_process_environment() {
    std::env::set_var("BRIMLEY_CONFIG_TEST_DB_HOST", "db.example.internal");
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("brimley.yaml"),
        "databases:\n  primary:\n    url: \"postgres://${BRIMLEY_CONFIG_TEST_DB_HOST}/app\"\n",
    )
    .unwrap();

    let config = BrimleyConfig::load(dir.path()).unwrap();
    assert_eq!(config.databases["primary"].url, "postgres://db.example.internal/app");
    std::env::remove_var("BRIMLEY_CONFIG_TEST_DB_HOST");
}

#[test]
fn malformed_yaml_surfaces_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("brimley.yaml"), "brimley: [unterminated\n").unwrap();
    assert!(BrimleyConfig::load(dir.path()).is_err());
}
