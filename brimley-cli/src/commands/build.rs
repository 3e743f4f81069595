//! `brimley build`.
//!
//! A CI-friendly one-shot check: discover and reload once, print a summary
//! to stdout, and fail if any domain was blocked this cycle.

use std::path::Path;

use brimley_core::error::BrimleyError;
use brimley_core::native_registry::NativeRegistry;

/// Returns `Ok(true)` when every domain swapped cleanly.
pub fn run(root: &Path) -> Result<bool, BrimleyError> {
    let project = crate::project::discover(root, NativeRegistry::empty())?;
    let outcome = &project.initial_reload;

    for diagnostic in &outcome.diagnostics {
        eprintln!("{diagnostic} [{}]", diagnostic.error_code);
    }

    println!(
        "entities: {}  functions: {}  tools: {}",
        outcome.summary.entities, outcome.summary.functions, outcome.summary.tools
    );

    if outcome.blocked_domains.is_empty() {
        Ok(true)
    } else {
        eprintln!("blocked domains: {}", outcome.blocked_domains.join(", "));
        Ok(false)
    }
}
