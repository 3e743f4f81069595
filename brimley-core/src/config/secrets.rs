use super::ConfigError;

/// Trait for secret resolution backends.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError>;
}

/// Default resolver: environment variables, with an optional `:default`
/// fallback embedded in the placeholder itself.
///
/// Supports the following reference formats:
/// - `${VAR_NAME}` — resolves from the environment; empty string if unset
/// - `${VAR_NAME:default}` — resolves from the environment; `default` if unset
/// - `${file:/path/to/secret}` — reads from file (trimmed)
///
/// Unlike a typical secrets store, a missing variable with no `:default` is
/// not an error: it resolves to an empty string, matching how the original
/// runtime's env interpolation behaves so that optional settings can be left
/// unset without every config file carrying a placeholder for them.
pub struct DefaultSecretResolver;

impl SecretResolver for DefaultSecretResolver {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
        if let Some(path) = reference.strip_prefix("file:") {
            return std::fs::read_to_string(path.trim())
                .map(|s| s.trim().to_string())
                .map_err(|e| ConfigError::Load(format!("Secret file '{}': {}", path.trim(), e)));
        }
        let reference = reference.strip_prefix("env:").unwrap_or(reference);
        let (var, default) = match reference.split_once(':') {
            Some((var, default)) => (var.trim(), Some(default)),
            None => (reference.trim(), None),
        };
        match std::env::var(var) {
            Ok(val) => Ok(val),
            Err(_) => Ok(default.unwrap_or("").to_string()),
        }
    }
}

/// Resolve all `${...}` placeholders in a string value, left to right.
pub fn resolve_placeholders(
    value: &str,
    resolver: &dyn SecretResolver,
) -> Result<String, ConfigError> {
    let mut result = value.to_string();
    while let Some(start) = result.find("${") {
        let end = result[start..]
            .find('}')
            .ok_or_else(|| ConfigError::Load(format!("Unclosed placeholder in: {value}")))?;
        let reference = &result[start + 2..start + end];
        let resolved = resolver.resolve(reference)?;
        result = format!("{}{}{}", &result[..start], resolved, &result[start + end + 1..]);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_var_without_default_resolves_to_empty_string() {
        std::env::remove_var("BRIMLEY_TEST_UNSET_VAR");
        let resolved = resolve_placeholders("${BRIMLEY_TEST_UNSET_VAR}", &DefaultSecretResolver).unwrap();
        assert_eq!(resolved, "");
    }

    #[test]
    fn missing_var_with_default_falls_back_to_default() {
        std::env::remove_var("BRIMLEY_TEST_UNSET_VAR_2");
        let resolved =
            resolve_placeholders("${BRIMLEY_TEST_UNSET_VAR_2:postgres}", &DefaultSecretResolver).unwrap();
        assert_eq!(resolved, "postgres");
    }

    #[test]
    fn set_var_wins_over_default() {
        std::env::set_var("BRIMLEY_TEST_SET_VAR", "override");
        let resolved =
            resolve_placeholders("${BRIMLEY_TEST_SET_VAR:fallback}", &DefaultSecretResolver).unwrap();
        assert_eq!(resolved, "override");
        std::env::remove_var("BRIMLEY_TEST_SET_VAR");
    }

    #[test]
    fn multiple_placeholders_in_one_string_are_all_resolved() {
        std::env::set_var("BRIMLEY_TEST_HOST", "db.internal");
        let resolved = resolve_placeholders(
            "postgres://${BRIMLEY_TEST_HOST}:${BRIMLEY_TEST_PORT:5432}/app",
            &DefaultSecretResolver,
        )
        .unwrap();
        assert_eq!(resolved, "postgres://db.internal:5432/app");
        std::env::remove_var("BRIMLEY_TEST_HOST");
    }

    #[test]
    fn unclosed_placeholder_is_an_error() {
        let err = resolve_placeholders("${OOPS", &DefaultSecretResolver).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
