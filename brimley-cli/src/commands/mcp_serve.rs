//! `brimley mcp-serve`.
//!
//! Serves the project's tool-exports over newline-delimited JSON on stdio
//! (the tool-export protocol, `mcp.transport: stdio`). Each input line is
//! `{"tool": "<name>", "arguments": {...}}`; each output line is either
//! `{"ok": true, "result": ...}` or `{"ok": false, "error": "...", "code": "..."}`.
//! Auto-reload runs in the background so a schema change is picked up
//! between calls; a changed tool schema requires `clear_tools` or a
//! replacement server, neither of which a stdio pipe can offer, so a tool
//! whose schema changed mid-session is served with its last-known schema
//! until the process is restarted.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use brimley_core::config::McpTransport;
use brimley_core::dispatcher::{Dispatcher, RuntimeInjections};
use brimley_core::error::BrimleyError;
use brimley_core::native_registry::NativeRegistry;
use brimley_core::resolver;
use brimley_core::runtime::RuntimeController;
use brimley_core::tool_export::describe_all;

pub async fn run(root: &Path) -> Result<(), BrimleyError> {
    let native_registry = NativeRegistry::empty();
    let project = crate::project::open(root, native_registry.clone()).await?;
    let context = project.context;

    if context.config.mcp.transport != McpTransport::Stdio {
        return Err(BrimleyError::Config(
            "mcp-serve only implements the stdio transport; set mcp.transport: stdio".to_string(),
        ));
    }

    let controller = Arc::new(RuntimeController::new(context.clone(), root, &context.config.auto_reload, native_registry.clone())?);
    if context.config.auto_reload.enabled {
        controller.start_auto_reload(None, None);
    }

    let descriptors = describe_all(&context.registries().tool_exports)?;
    tracing::info!(tools = descriptors.len(), "mcp-serve ready on stdio");

    let dispatcher = Dispatcher::new(native_registry);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.map_err(BrimleyError::from)?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&dispatcher, &context, &line).await;
        writeln!(stdout, "{response}").map_err(BrimleyError::from)?;
        stdout.flush().map_err(BrimleyError::from)?;
    }

    controller.stop_auto_reload().await;
    Ok(())
}

async fn handle_line(dispatcher: &Dispatcher, context: &Arc<brimley_core::context::Context>, line: &str) -> String {
    let request: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return error_line(&format!("invalid request JSON: {e}"), "ERR_PARSE_FAILURE"),
    };

    let tool = match request.get("tool").and_then(|v| v.as_str()) {
        Some(name) => name,
        None => return error_line("missing 'tool' field", "ERR_PARSE_FAILURE"),
    };
    let arguments = request
        .get("arguments")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .collect();

    match invoke(dispatcher, context, tool, arguments).await {
        Ok(result) => serde_json::json!({"ok": true, "result": result}).to_string(),
        Err(err) => error_line(&err.to_string(), err.code()),
    }
}

async fn invoke(
    dispatcher: &Dispatcher,
    context: &Arc<brimley_core::context::Context>,
    name: &str,
    user_input: std::collections::HashMap<String, serde_json::Value>,
) -> Result<serde_json::Value, BrimleyError> {
    let registries = context.registries();
    let func = registries.tool_exports.get(name)?.clone();
    let args = resolver::resolve(&func, &user_input, context)?;
    dispatcher.dispatch(&func, args, context.clone(), RuntimeInjections::default()).await
}

fn error_line(message: &str, code: &str) -> String {
    serde_json::json!({"ok": false, "error": message, "code": code}).to_string()
}
