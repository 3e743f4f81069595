//! `brimley validate [--fail-on severity]`.
//!
//! Runs discovery only (no reload, no database connections) and reports
//! every diagnostic to stderr. Exits non-zero when any diagnostic at or
//! above `--fail-on` was produced.

use std::path::Path;

use brimley_core::diagnostic::Severity;
use brimley_core::discovery::scan;
use brimley_core::error::BrimleyError;

/// Returns `Ok(true)` when nothing at or above `fail_on` was found.
pub fn run(root: &Path, fail_on: Severity) -> Result<bool, BrimleyError> {
    let scan_result = scan(root);

    let mut passed = true;
    for diagnostic in scan_result.entity_diagnostics.iter().chain(scan_result.diagnostics.iter()) {
        eprintln!("{diagnostic} [{}]", diagnostic.error_code);
        if diagnostic.severity >= fail_on {
            passed = false;
        }
    }

    eprintln!(
        "discovered {} functions, {} entities, {} native declarations",
        scan_result.functions.len(),
        scan_result.entities.len(),
        scan_result.native_declarations.len(),
    );

    Ok(passed)
}

pub fn parse_severity(raw: &str) -> Result<Severity, String> {
    match raw {
        "warning" => Ok(Severity::Warning),
        "error" => Ok(Severity::Error),
        "critical" => Ok(Severity::Critical),
        other => Err(format!("unknown severity '{other}' (expected warning, error, or critical)")),
    }
}
