//! `brimley repl [--root R] [--mcp/--no-mcp] [--watch/--no-watch]`.
//!
//! An interactive loop over the same dispatch path `invoke` uses. Claims the
//! single REPL-client slot in `.brimley/` for the session's lifetime so two
//! REPLs can't step on one copy of the mutable `app` state bag at once.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use dialoguer::Input;

use brimley_core::dispatcher::{Dispatcher, RuntimeInjections};
use brimley_core::error::BrimleyError;
use brimley_core::native_registry::NativeRegistry;
use brimley_core::resolver;
use brimley_core::runtime::RuntimeController;
use brimley_core::state_dir::StateDir;
use brimley_core::tool_export::describe_all;

const RESERVED_WORDS: &str = "help, quit, exit, reset, reload, settings, config, state, functions, entities, databases, errors";

pub async fn run(root: &Path, mcp: bool, watch: bool) -> Result<(), BrimleyError> {
    let state_dir = StateDir::new(root);
    state_dir.claim_repl_client(std::process::id())?;

    let result = run_loop(root, mcp, watch).await;

    let _ = state_dir.release_repl_client();
    result
}

async fn run_loop(root: &Path, mcp: bool, watch: bool) -> Result<(), BrimleyError> {
    let native_registry = NativeRegistry::empty();
    let project = crate::project::open(root, native_registry.clone()).await?;
    let context = project.context;
    report(&project.initial_reload.diagnostics);

    let controller = if watch {
        let controller = Arc::new(RuntimeController::new(context.clone(), root, &context.config.auto_reload, native_registry.clone())?);
        controller.start_auto_reload(None, None);
        Some(controller)
    } else {
        None
    };

    let dispatcher = Dispatcher::new(native_registry);
    println!("brimley repl — type 'help' for commands, 'exit' to quit");

    loop {
        let line: String = match Input::new().with_prompt("brimley").allow_empty(true).interact_text() {
            Ok(line) => line,
            Err(_) => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "exit" | "quit" => break,
            "help" => {
                println!("commands: help, exit, quit, functions, entities, <name> [json-args]");
                println!("reserved names: {RESERVED_WORDS}");
                continue;
            }
            "functions" => {
                let mut names = context.registries().functions.names();
                names.sort();
                println!("{}", names.join(", "));
                continue;
            }
            "entities" => {
                let mut names = context.registries().entities.names();
                names.sort();
                println!("{}", names.join(", "));
                continue;
            }
            "errors" => {
                if mcp {
                    if let Ok(descriptors) = describe_all(&context.registries().tool_exports) {
                        println!("{} tools advertised", descriptors.len());
                    }
                }
                continue;
            }
            _ => {}
        }

        let (name, rest) = line.split_once(' ').unwrap_or((line, ""));
        let user_input: HashMap<String, serde_json::Value> = if rest.trim().is_empty() {
            HashMap::new()
        } else {
            match serde_json::from_str(rest.trim()) {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("invalid JSON arguments: {e}");
                    continue;
                }
            }
        };

        let outcome = invoke_one(&dispatcher, &context, name, user_input).await;
        match outcome {
            Ok(value) => println!("{}", serde_json::to_string_pretty(&value).expect("json values always serialize")),
            Err(err) => eprintln!("error [{}]: {err}", err.code()),
        }
    }

    if let Some(controller) = controller {
        controller.stop_auto_reload().await;
    }
    Ok(())
}

async fn invoke_one(
    dispatcher: &Dispatcher,
    context: &Arc<brimley_core::context::Context>,
    name: &str,
    user_input: HashMap<String, serde_json::Value>,
) -> Result<serde_json::Value, BrimleyError> {
    let func = context.registries().functions.get(name)?.clone();
    let args = resolver::resolve(&func, &user_input, context)?;
    dispatcher.dispatch(&func, args, context.clone(), RuntimeInjections::default()).await
}

fn report(diagnostics: &[brimley_core::diagnostic::Diagnostic]) {
    for diagnostic in diagnostics {
        tracing::warn!("{diagnostic}");
    }
}
