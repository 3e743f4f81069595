//! `brimley invoke <name> [--root R] [--input I]`.

use std::collections::HashMap;
use std::path::Path;

use brimley_core::dispatcher::{Dispatcher, RuntimeInjections};
use brimley_core::error::BrimleyError;
use brimley_core::native_registry::NativeRegistry;
use brimley_core::resolver;

use crate::project;

pub async fn run(root: &Path, name: &str, input: &str) -> Result<(), BrimleyError> {
    let user_input: HashMap<String, serde_json::Value> = if input.trim().is_empty() {
        HashMap::new()
    } else {
        serde_json::from_str(input).map_err(|e| BrimleyError::ParseFailure { file: "--input".to_string(), detail: e.to_string() })?
    };

    let native_registry = NativeRegistry::empty();
    let loaded = project::open(root, native_registry.clone()).await?;
    report_diagnostics(&loaded.initial_reload.diagnostics);

    let func = loaded.context.registries().functions.get(name)?.clone();
    let args = resolver::resolve(&func, &user_input, &loaded.context)?;

    let dispatcher = Dispatcher::new(native_registry);
    let result = dispatcher.dispatch(&func, args, loaded.context.clone(), RuntimeInjections::default()).await?;

    println!("{}", serde_json::to_string_pretty(&result).expect("json values always serialize"));
    Ok(())
}

fn report_diagnostics(diagnostics: &[brimley_core::diagnostic::Diagnostic]) {
    for diagnostic in diagnostics {
        tracing::warn!("{diagnostic}");
    }
}
