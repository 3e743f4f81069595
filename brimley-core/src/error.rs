use crate::diagnostic::codes;

/// Runtime error taxonomy for Brimley. One variant per stable diagnostic code
/// family from the external contract (see `diagnostic::codes`), each holding
/// the structured fields that family needs.
#[derive(Debug)]
pub enum BrimleyError {
    MissingArgument { function: String, argument: String },
    ArgType { function: String, argument: String, expected: String, detail: String },
    ResultCardinality { function: String, detail: String },
    ResultValidation { function: String, field: String, detail: String },
    NoConnection { connection: String, available: Vec<String> },
    Timeout { function: String, elapsed_ms: u64 },
    QueueFull { function: String },
    UnknownFunctionType { function: String, type_tag: String },
    ReloadDomainBlocked { domain: String, reason: String },
    Quarantined { name: String, reason: String },
    NotFound { name: String },
    InvalidName { name: String },
    ReservedName { name: String },
    DuplicateName { name: String },
    ParseFailure { file: String, detail: String },
    SchemaUnsupportedKeyword { keyword: String },
    Runner { function: String, source: Box<dyn std::error::Error + Send + Sync> },
    Config(String),
    Io(std::io::Error),
    ClientActionRequired { reason: String },
}

impl BrimleyError {
    /// The stable diagnostic code associated with this error, as used by the
    /// CLI's exit-code mapping and `validate --fail-on` comparisons.
    pub fn code(&self) -> &'static str {
        match self {
            BrimleyError::MissingArgument { .. } => codes::ERR_MISSING_ARGUMENT,
            BrimleyError::ArgType { .. } => codes::ERR_ARG_TYPE,
            BrimleyError::ResultCardinality { .. } => codes::ERR_RESULT_CARDINALITY,
            BrimleyError::ResultValidation { .. } => codes::ERR_RESULT_VALIDATION,
            BrimleyError::NoConnection { .. } => codes::ERR_NO_CONNECTION,
            BrimleyError::Timeout { .. } => codes::ERR_TIMEOUT,
            BrimleyError::QueueFull { .. } => codes::ERR_QUEUE_FULL,
            BrimleyError::UnknownFunctionType { .. } => codes::ERR_UNKNOWN_FUNCTION_TYPE,
            BrimleyError::ReloadDomainBlocked { .. } => codes::ERR_RELOAD_DOMAIN_BLOCKED,
            BrimleyError::Quarantined { .. } => codes::ERR_RELOAD_DOMAIN_BLOCKED,
            BrimleyError::NotFound { .. } => "ERR_NOT_FOUND",
            BrimleyError::InvalidName { .. } => codes::ERR_INVALID_NAME,
            BrimleyError::ReservedName { .. } => codes::ERR_RESERVED_NAME,
            BrimleyError::DuplicateName { .. } => codes::ERR_DUPLICATE_NAME,
            BrimleyError::ParseFailure { .. } => codes::ERR_PARSE_FAILURE,
            BrimleyError::SchemaUnsupportedKeyword { .. } => codes::ERR_SCHEMA_UNSUPPORTED_KEYWORD,
            BrimleyError::Runner { .. } => "ERR_RUNNER_FAILURE",
            BrimleyError::Config(_) => "ERR_CONFIG",
            BrimleyError::Io(_) => "ERR_IO",
            BrimleyError::ClientActionRequired { .. } => "ERR_CLIENT_ACTION_REQUIRED",
        }
    }
}

impl std::fmt::Display for BrimleyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrimleyError::MissingArgument { function, argument } => {
                write!(f, "{function}: missing required argument '{argument}'")
            }
            BrimleyError::ArgType { function, argument, expected, detail } => {
                write!(f, "{function}: argument '{argument}' expected {expected}: {detail}")
            }
            BrimleyError::ResultCardinality { function, detail } => {
                write!(f, "{function}: result cardinality error: {detail}")
            }
            BrimleyError::ResultValidation { function, field, detail } => {
                write!(f, "{function}: result field '{field}' invalid: {detail}")
            }
            BrimleyError::NoConnection { connection, available } => {
                write!(f, "database connection '{connection}' not found. Available: {available:?}")
            }
            BrimleyError::Timeout { function, elapsed_ms } => {
                write!(f, "{function}: timed out after {elapsed_ms}ms")
            }
            BrimleyError::QueueFull { function } => {
                write!(f, "{function}: dispatcher queue is full")
            }
            BrimleyError::UnknownFunctionType { function, type_tag } => {
                write!(f, "{function}: unknown function type '{type_tag}'")
            }
            BrimleyError::ReloadDomainBlocked { domain, reason } => {
                write!(f, "[{domain}] domain blocked: {reason}")
            }
            BrimleyError::Quarantined { name, reason } => {
                write!(f, "'{name}' is quarantined: {reason}")
            }
            BrimleyError::NotFound { name } => write!(f, "'{name}' not found"),
            BrimleyError::InvalidName { name } => write!(f, "invalid name '{name}'"),
            BrimleyError::ReservedName { name } => write!(f, "'{name}' is a reserved name"),
            BrimleyError::DuplicateName { name } => write!(f, "duplicate name '{name}'"),
            BrimleyError::ParseFailure { file, detail } => write!(f, "{file}: {detail}"),
            BrimleyError::SchemaUnsupportedKeyword { keyword } => {
                write!(f, "unsupported schema keyword '{keyword}'")
            }
            BrimleyError::Runner { function, source } => {
                write!(f, "{function}: runner failure: {source}")
            }
            BrimleyError::Config(msg) => write!(f, "configuration error: {msg}"),
            BrimleyError::Io(err) => write!(f, "I/O error: {err}"),
            BrimleyError::ClientActionRequired { reason } => {
                write!(f, "client action required: {reason}")
            }
        }
    }
}

impl std::error::Error for BrimleyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrimleyError::Runner { source, .. } => Some(source.as_ref()),
            BrimleyError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BrimleyError {
    fn from(err: std::io::Error) -> Self {
        BrimleyError::Io(err)
    }
}

/// Generate `From<E> for BrimleyError` implementations that wrap a third-party
/// error type into `BrimleyError::Config` (or another constant-arity variant),
/// used at the module boundary where the third-party error first surfaces.
///
/// ```ignore
/// brimley_core::map_error! {
///     serde_yaml::Error => Config,
/// }
/// ```
#[macro_export]
macro_rules! map_error {
    ( $( $err_ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$err_ty> for $crate::error::BrimleyError {
                fn from(err: $err_ty) -> Self {
                    $crate::error::BrimleyError::$variant(err.to_string())
                }
            }
        )*
    };
}

map_error! {
    serde_yaml::Error => Config,
}
