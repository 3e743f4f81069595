use brimley_core::diagnostic::codes;
use brimley_core::error::BrimleyError;

#[test]
fn missing_argument_reports_the_missing_argument_code_and_names() {
    let err = BrimleyError::MissingArgument { function: "get_user".into(), argument: "id".into() };
    assert_eq!(err.code(), codes::ERR_MISSING_ARGUMENT);
    assert!(err.to_string().contains("get_user"));
    assert!(err.to_string().contains("id"));
}

#[test]
fn no_connection_lists_the_available_connections() {
    let err = BrimleyError::NoConnection {
        connection: "analytics".into(),
        available: vec!["primary".into(), "replica".into()],
    };
    assert_eq!(err.code(), codes::ERR_NO_CONNECTION);
    assert!(err.to_string().contains("analytics"));
    assert!(err.to_string().contains("primary"));
}

#[test]
fn quarantined_and_reload_domain_blocked_share_the_same_diagnostic_code() {
    let quarantined = BrimleyError::Quarantined { name: "hello".into(), reason: "bad frontmatter".into() };
    let blocked = BrimleyError::ReloadDomainBlocked { domain: "functions".into(), reason: "bad frontmatter".into() };
    assert_eq!(quarantined.code(), codes::ERR_RELOAD_DOMAIN_BLOCKED);
    assert_eq!(blocked.code(), codes::ERR_RELOAD_DOMAIN_BLOCKED);
}

#[test]
fn runner_error_preserves_the_underlying_source() {
    let source: Box<dyn std::error::Error + Send + Sync> =
        Box::new(std::io::Error::new(std::io::ErrorKind::Other, "driver exploded"));
    let err = BrimleyError::Runner { function: "fetch_order".into(), source };
    assert!(err.to_string().contains("driver exploded"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn client_action_required_is_distinct_from_other_client_facing_errors() {
    let err = BrimleyError::ClientActionRequired { reason: "tool schema changed".into() };
    assert_eq!(err.code(), "ERR_CLIENT_ACTION_REQUIRED");
    assert!(err.to_string().contains("tool schema changed"));
}

#[test]
fn reserved_invalid_and_duplicate_names_each_carry_their_own_code() {
    let reserved = BrimleyError::ReservedName { name: "exit".into() };
    let invalid = BrimleyError::InvalidName { name: "9bad".into() };
    let duplicate = BrimleyError::DuplicateName { name: "hello".into() };
    assert_eq!(reserved.code(), codes::ERR_RESERVED_NAME);
    assert_eq!(invalid.code(), codes::ERR_INVALID_NAME);
    assert_eq!(duplicate.code(), codes::ERR_DUPLICATE_NAME);
}
