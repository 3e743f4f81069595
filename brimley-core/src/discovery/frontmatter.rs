//! Frontmatter extraction: splits a discovered file's content into
//! a YAML metadata block and a body, accepting the two framings the scanner's
//! parsers are handed — `---`-delimited and SQL-comment-wrapped.

/// The two accepted frontmatter framings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFraming {
    Delimited,
    SqlComment,
}

impl FrontmatterFraming {
    /// The remediation hint for a malformed-frontmatter diagnostic.
    pub fn suggestion(&self) -> &'static str {
        match self {
            FrontmatterFraming::Delimited => "wrap the frontmatter in --- lines",
            FrontmatterFraming::SqlComment => "wrap the frontmatter in /* --- ... --- */ ",
        }
    }
}

/// Split `content` into a raw YAML block and the body that follows it.
/// Returns `None` when no recognizable frontmatter framing is present (in
/// which case the whole content is treated as the body with empty metadata
/// by the caller).
pub fn split(content: &str) -> Option<(FrontmatterFraming, String, String)> {
    let trimmed = content.trim();

    if let Some(rest) = trimmed.strip_prefix("/*") {
        // SQL-comment framing: /* \n --- ... --- \n */ BODY
        let rest = rest.trim_start();
        if let Some(inner) = rest.strip_prefix("---") {
            if let Some(close) = inner.find("---") {
                let yaml_text = inner[..close].to_string();
                let after_dashes = &inner[close + 3..];
                if let Some(comment_close) = after_dashes.find("*/") {
                    let body = after_dashes[comment_close + 2..].trim().to_string();
                    return Some((FrontmatterFraming::SqlComment, yaml_text, body));
                }
            }
        }
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix("---") {
        // Delimited framing: find the next standalone `---` line.
        if let Some((yaml_text, body)) = split_on_next_delimiter(rest) {
            return Some((FrontmatterFraming::Delimited, yaml_text, body));
        }
        return None;
    }

    None
}

fn split_on_next_delimiter(rest: &str) -> Option<(String, String)> {
    // rest begins immediately after the opening `---`; scan line by line for
    // a line that is exactly `---` to find the closing delimiter.
    let mut consumed = 0usize;
    let bytes = rest.as_bytes();
    let mut cursor = 0usize;
    while cursor < bytes.len() {
        let line_start = cursor;
        let line_end = rest[cursor..].find('\n').map(|i| cursor + i).unwrap_or(rest.len());
        let line = rest[line_start..line_end].trim_end_matches('\r');
        if line_start != 0 && line.trim() == "---" {
            let yaml_text = rest[..line_start].to_string();
            let body_start = (line_end + 1).min(rest.len());
            let body = rest[body_start..].trim().to_string();
            return Some((yaml_text, body));
        }
        consumed = line_end + 1;
        cursor = consumed;
        if line_end == rest.len() {
            break;
        }
    }
    None
}

/// Parse `content`'s frontmatter into a YAML value plus the remaining body.
/// Content with no recognizable framing yields an empty mapping and the full
/// content as body, so a body-only template/SQL file is still valid.
pub fn parse(content: &str) -> Result<(serde_yaml::Value, String), (FrontmatterFraming, serde_yaml::Error)> {
    match split(content) {
        Some((framing, yaml_text, body)) => {
            let trimmed_yaml = yaml_text.trim().trim_matches('-').trim();
            let value = if trimmed_yaml.is_empty() {
                serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
            } else {
                match serde_yaml::from_str(trimmed_yaml) {
                    Ok(v) => v,
                    Err(e) => return Err((framing, e)),
                }
            };
            Ok((value, body))
        }
        None => Ok((serde_yaml::Value::Mapping(serde_yaml::Mapping::new()), content.trim().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_delimited_frontmatter() {
        let content = "---\nname: hello\ntype: template_function\n---\nHello {{ args.name }}";
        let (value, body) = parse(content).unwrap();
        assert_eq!(value["name"].as_str(), Some("hello"));
        assert_eq!(body, "Hello {{ args.name }}");
    }

    #[test]
    fn splits_sql_comment_frontmatter() {
        let content = "/*\n---\nname: get_users\ntype: sql_function\n---\n*/\nSELECT * FROM users";
        let (value, body) = parse(content).unwrap();
        assert_eq!(value["name"].as_str(), Some("get_users"));
        assert_eq!(body, "SELECT * FROM users");
    }

    #[test]
    fn content_without_frontmatter_has_empty_metadata() {
        let (value, body) = parse("SELECT 1").unwrap();
        assert!(value.as_mapping().unwrap().is_empty());
        assert_eq!(body, "SELECT 1");
    }

    #[test]
    fn malformed_yaml_surfaces_framing_for_suggestion() {
        let content = "---\nname: [\n---\nbody";
        let err = parse(content).unwrap_err();
        assert_eq!(err.0, FrontmatterFraming::Delimited);
    }

    #[test]
    fn sql_framing_suggests_comment_wrapper() {
        assert!(FrontmatterFraming::SqlComment.suggestion().contains("/*"));
        assert!(FrontmatterFraming::Delimited.suggestion().contains("---"));
    }
}
