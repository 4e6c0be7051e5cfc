// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the smsrcs configuration system.

use smsrcs_config::diagnostic::ConfigError;
use smsrcs_config::{load_and_validate_str, load_config_from_str};

const COMPLETE: &str = r#"
[bridge]
phone_number = "447900550999"
log_level = "debug"

[oauth]
token_url = "https://maap.example.com/oauth2/v1/token"
client_id = "1172968146179160996"
client_secret = "7288480323129135260"
scope = "botmessage"

[maap]
api_url = "https://maap.example.com/rcs/bot/v1"
bot_id = "bot904567"
timeout_secs = 20

[smpp]
host = "127.0.0.1"
port = 2775
system_id = "bridge"
bind_system_id = "esme"
bind_password = "pw"
response_timeout_secs = 10

[webhook]
host = "127.0.0.1"
port = 5050
"#;

/// Valid TOML with all known fields deserializes and validates.
#[test]
fn complete_toml_loads_and_validates() {
    let config = load_and_validate_str(COMPLETE).expect("complete config should validate");
    assert_eq!(config.bridge.log_level, "debug");
    assert_eq!(config.oauth.client_id, "1172968146179160996");
    assert_eq!(
        config.oauth.client_secret.as_deref(),
        Some("7288480323129135260")
    );
    assert_eq!(config.maap.bot_id, "bot904567");
    assert_eq!(config.maap.timeout_secs, Some(20));
    assert_eq!(config.smpp.system_id, "bridge");
    assert_eq!(config.smpp.bind_system_id.as_deref(), Some("esme"));
    assert_eq!(config.smpp.response_timeout_secs, 10);
    assert_eq!(config.webhook.port, 5050);
}

/// Missing optional sections use defaults without a deserialization error.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.bridge.phone_number, "447900550999");
    assert_eq!(config.bridge.log_level, "info");
    assert_eq!(config.oauth.scope, "botmessage");
    assert!(config.oauth.client_secret.is_none());
    assert_eq!(config.smpp.host, "0.0.0.0");
    assert_eq!(config.smpp.port, 2775);
    assert_eq!(config.smpp.max_pdu_len, 65536);
    assert_eq!(config.webhook.port, 5050);
}

/// Defaults alone are not enough to start: credentials are required.
#[test]
fn empty_toml_fails_validation() {
    let errors = load_and_validate_str("").expect_err("credentials are required");
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
    assert!(errors.len() >= 5, "got {} errors", errors.len());
}

/// A typo in a known section becomes an UnknownKey diagnostic with a suggestion.
#[test]
fn typo_produces_unknown_key_with_suggestion() {
    let toml = r#"
[smpp]
prot = 2775
"#;
    let errors = load_and_validate_str(toml).expect_err("unknown key must be rejected");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("expected an UnknownKey error");
    assert_eq!(unknown.0, "prot");
    assert_eq!(unknown.1.as_deref(), Some("port"));
}

/// A wrong value type is reported as InvalidType.
#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[webhook]
port = "five thousand"
"#;
    let errors = load_and_validate_str(toml).expect_err("string port must be rejected");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

/// Unknown top-level sections are rejected.
#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telegram]
bot_token = "abc"
"#;
    let err = load_config_from_str(toml).expect_err("unknown section must be rejected");
    assert!(format!("{err}").contains("telegram"));
}
