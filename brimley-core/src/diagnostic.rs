use std::path::{Path, PathBuf};

/// Severity of a [`Diagnostic`]. Only `Error` and `Critical` block a reload domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Error | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured error/warning payload produced by discovery and the reload engine.
///
/// Immutable once created; diagnostics are accumulated into `Vec<Diagnostic>` and
/// never mutated in place.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub file_path: PathBuf,
    pub error_code: String,
    pub severity: Severity,
    pub message: String,
    pub suggestion: Option<String>,
    pub line_number: Option<u32>,
}

impl Diagnostic {
    pub fn new(
        file_path: impl Into<PathBuf>,
        error_code: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            file_path: file_path.into(),
            error_code: error_code.into(),
            severity,
            message: message.into(),
            suggestion: None,
            line_number: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line_number = Some(line);
        self
    }

    /// Whether this diagnostic, by itself, blocks the domain its file belongs to.
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.severity,
            self.file_path.display(),
            self.message
        )?;
        if let Some(line) = self.line_number {
            write!(f, " (line {line})")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " — {suggestion}")?;
        }
        Ok(())
    }
}

pub mod codes {
    pub const ERR_PARSE_FAILURE: &str = "ERR_PARSE_FAILURE";
    pub const ERR_INVALID_NAME: &str = "ERR_INVALID_NAME";
    pub const ERR_RESERVED_NAME: &str = "ERR_RESERVED_NAME";
    pub const ERR_DUPLICATE_NAME: &str = "ERR_DUPLICATE_NAME";
    pub const ERR_NAME_PROXIMITY: &str = "ERR_NAME_PROXIMITY";
    pub const ERR_MISSING_ARGUMENT: &str = "ERR_MISSING_ARGUMENT";
    pub const ERR_ARG_TYPE: &str = "ERR_ARG_TYPE";
    pub const ERR_RESULT_CARDINALITY: &str = "ERR_RESULT_CARDINALITY";
    pub const ERR_RESULT_VALIDATION: &str = "ERR_RESULT_VALIDATION";
    pub const ERR_NO_CONNECTION: &str = "ERR_NO_CONNECTION";
    pub const ERR_TIMEOUT: &str = "ERR_TIMEOUT";
    pub const ERR_QUEUE_FULL: &str = "ERR_QUEUE_FULL";
    pub const ERR_UNKNOWN_FUNCTION_TYPE: &str = "ERR_UNKNOWN_FUNCTION_TYPE";
    pub const ERR_RELOAD_DOMAIN_BLOCKED: &str = "ERR_RELOAD_DOMAIN_BLOCKED";
    pub const ERR_SCHEMA_UNSUPPORTED_KEYWORD: &str = "ERR_SCHEMA_UNSUPPORTED_KEYWORD";
    pub const WARN_NAME_PROXIMITY: &str = "WARN_NAME_PROXIMITY";
    pub const WARN_SCHEMA_NUMBER_TO_FLOAT: &str = "WARN_SCHEMA_NUMBER_TO_FLOAT";
    pub const WARN_SCHEMA_DROPPED_KEYWORD: &str = "WARN_SCHEMA_DROPPED_KEYWORD";
}
