//! End-to-end: a function that becomes invalid between reload cycles is
//! quarantined, and other functions stay callable.

use std::collections::HashMap;
use std::fs;

use brimley_cli::project;
use brimley_core::dispatcher::{Dispatcher, RuntimeInjections};
use brimley_core::native_registry::NativeRegistry;
use brimley_core::resolver;

#[tokio::test]
async fn breaking_a_function_quarantines_it_without_affecting_others() {
    let dir = tempfile::tempdir().unwrap();
    let hello_path = dir.path().join("hello.md");
    fs::write(&hello_path, "---\nname: hello\ntype: template_function\nreturn_shape: string\n---\nHello V1").unwrap();
    fs::write(
        dir.path().join("other.md"),
        "---\nname: other\ntype: template_function\nreturn_shape: string\n---\nOther",
    )
    .unwrap();

    let loaded = project::open(dir.path(), NativeRegistry::empty()).await.unwrap();
    let func = loaded.context.registries().functions.get("hello").unwrap().clone();
    let dispatcher = Dispatcher::new(NativeRegistry::empty());
    let result = dispatcher
        .dispatch(&func, resolver::resolve(&func, &HashMap::new(), &loaded.context).unwrap(), loaded.context.clone(), RuntimeInjections::default())
        .await
        .unwrap();
    assert_eq!(result, serde_json::json!("Hello V1"));

    // Break hello.md: drop return_shape, a blocking parse failure.
    fs::write(&hello_path, "---\nname: hello\ntype: template_function\n---\nHello V2").unwrap();

    let scan_result = brimley_core::discovery::scan(dir.path());
    let engine = brimley_core::reload::ReloadEngine::new(NativeRegistry::empty());
    let outcome = engine.apply(&loaded.context, dir.path(), &scan_result);
    assert!(!outcome.blocked_domains.is_empty());

    let err = loaded.context.registries().functions.get("hello").unwrap_err();
    assert!(err.to_string().to_lowercase().contains("invalid") || err.to_string().to_lowercase().contains("return_shape"));

    let other = loaded.context.registries().functions.get("other").unwrap().clone();
    let result = dispatcher
        .dispatch(&other, resolver::resolve(&other, &HashMap::new(), &loaded.context).unwrap(), loaded.context.clone(), RuntimeInjections::default())
        .await
        .unwrap();
    assert_eq!(result, serde_json::json!("Other"));
}
