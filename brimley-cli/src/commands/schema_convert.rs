//! `brimley schema-convert`.
//!
//! Discovers the project's functions and prints the advertised tool-export
//! schema (the tool-export protocol) for every `mcp.type == "tool"` function
//! as a JSON array on stdout — the same descriptors an MCP host would see.

use std::path::Path;

use brimley_core::error::BrimleyError;
use brimley_core::native_registry::NativeRegistry;
use brimley_core::tool_export::describe_all;

pub fn run(root: &Path) -> Result<(), BrimleyError> {
    let project = crate::project::discover(root, NativeRegistry::empty())?;
    for diagnostic in &project.initial_reload.diagnostics {
        tracing::warn!("{diagnostic}");
    }

    let registries = project.context.registries();
    let descriptors = describe_all(&registries.tool_exports)?;

    let payload: Vec<serde_json::Value> = descriptors
        .iter()
        .map(|d| {
            serde_json::json!({
                "name": d.name,
                "description": d.description,
                "input_schema": d.input_schema,
                "schema_signature": d.schema_signature,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&payload).expect("json values always serialize"));
    Ok(())
}
