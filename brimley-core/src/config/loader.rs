use super::secrets::{self, SecretResolver};
use super::ConfigError;

/// Top-level keys Brimley recognizes in `brimley.yaml`. Anything else is
/// dropped silently rather than surfaced as an error — unlike a typed
/// general-purpose config loader, this is a fixed allow-list, not a
/// flatten-everything map.
const ALLOWED_TOP_LEVEL_KEYS: &[&str] =
    &["brimley", "config", "mcp", "auto_reload", "state", "databases", "execution"];

/// Parse `content` as YAML, interpolate `${VAR}`/`${VAR:default}` placeholders
/// in every string scalar, then drop any top-level key not on the allow-list.
///
/// Returns the filtered `serde_yaml::Value` mapping ready for typed
/// deserialization into [`super::BrimleyConfig`]'s sections.
pub(crate) fn load_and_filter(
    content: &str,
    resolver: &dyn SecretResolver,
) -> Result<serde_yaml::Value, ConfigError> {
    let mut value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    interpolate(&mut value, resolver)?;
    filter_top_level(&mut value);
    Ok(value)
}

/// Read and process a YAML file at `path`. Missing files yield an empty
/// mapping rather than an error — `brimley.yaml` is optional, every section
/// has defaults.
pub(crate) fn load_file(
    path: &std::path::Path,
    resolver: &dyn SecretResolver,
) -> Result<serde_yaml::Value, ConfigError> {
    if !path.exists() {
        return Ok(serde_yaml::Value::Mapping(serde_yaml::Mapping::new()));
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
    load_and_filter(&content, resolver)
}

fn interpolate(value: &mut serde_yaml::Value, resolver: &dyn SecretResolver) -> Result<(), ConfigError> {
    match value {
        serde_yaml::Value::String(s) => {
            if s.contains("${") {
                *s = secrets::resolve_placeholders(s, resolver)?;
            }
            Ok(())
        }
        serde_yaml::Value::Sequence(seq) => {
            for item in seq {
                interpolate(item, resolver)?;
            }
            Ok(())
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                interpolate(v, resolver)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn filter_top_level(value: &mut serde_yaml::Value) {
    if let serde_yaml::Value::Mapping(map) = value {
        map.retain(|k, _| match k.as_str() {
            Some(key) => ALLOWED_TOP_LEVEL_KEYS.contains(&key),
            None => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secrets::DefaultSecretResolver;

    #[test]
    fn unknown_top_level_keys_are_dropped() {
        let yaml = "brimley:\n  app_name: demo\nbogus_section:\n  x: 1\n";
        let value = load_and_filter(yaml, &DefaultSecretResolver).unwrap();
        let map = value.as_mapping().unwrap();
        assert!(map.contains_key("brimley"));
        assert!(!map.contains_key("bogus_section"));
    }

    #[test]
    fn placeholders_interpolated_before_filtering() {
        std::env::set_var("BRIMLEY_TEST_LOADER_VAR", "resolved-value");
        let yaml = "config:\n  secret: \"${BRIMLEY_TEST_LOADER_VAR}\"\n";
        let value = load_and_filter(yaml, &DefaultSecretResolver).unwrap();
        let secret = value["config"]["secret"].as_str().unwrap();
        assert_eq!(secret, "resolved-value");
        std::env::remove_var("BRIMLEY_TEST_LOADER_VAR");
    }

    #[test]
    fn missing_file_yields_empty_mapping() {
        let value = load_file(std::path::Path::new("/nonexistent/brimley.yaml"), &DefaultSecretResolver).unwrap();
        assert!(value.as_mapping().unwrap().is_empty());
    }

    #[test]
    fn interpolation_recurses_into_nested_sequences() {
        std::env::set_var("BRIMLEY_TEST_NESTED", "abc");
        let yaml = "auto_reload:\n  include_patterns:\n    - \"${BRIMLEY_TEST_NESTED}/*.sql\"\n";
        let value = load_and_filter(yaml, &DefaultSecretResolver).unwrap();
        let pattern = value["auto_reload"]["include_patterns"][0].as_str().unwrap();
        assert_eq!(pattern, "abc/*.sql");
        std::env::remove_var("BRIMLEY_TEST_NESTED");
    }
}
