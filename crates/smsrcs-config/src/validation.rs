// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes:
//! required credentials, URL schemes, listener addresses and PDU limits.

use crate::diagnostic::ConfigError;
use crate::model::BridgeConfig;

/// Smallest possible SMPP PDU: the 16-byte header.
const MIN_PDU_LEN: usize = 16;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    require_non_empty(&mut errors, "oauth.token_url", &config.oauth.token_url);
    require_non_empty(&mut errors, "oauth.client_id", &config.oauth.client_id);
    require_non_empty(&mut errors, "maap.api_url", &config.maap.api_url);
    require_non_empty(&mut errors, "maap.bot_id", &config.maap.bot_id);
    require_non_empty(&mut errors, "oauth.scope", &config.oauth.scope);

    match config.oauth.client_secret.as_deref() {
        Some(secret) if !secret.trim().is_empty() => {}
        _ => errors.push(ConfigError::Validation {
            message: "oauth.client_secret must be set (or SMSRCS_OAUTH_CLIENT_SECRET)"
                .to_string(),
        }),
    }

    require_http_url(&mut errors, "oauth.token_url", &config.oauth.token_url);
    require_http_url(&mut errors, "maap.api_url", &config.maap.api_url);

    let phone = config.bridge.phone_number.trim();
    if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "bridge.phone_number must be digits only (no leading `+`), got `{phone}`"
            ),
        });
    }

    validate_host(&mut errors, "smpp.host", &config.smpp.host);
    validate_host(&mut errors, "webhook.host", &config.webhook.host);

    if config.smpp.port != 0
        && config.smpp.port == config.webhook.port
        && config.smpp.host.trim() == config.webhook.host.trim()
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "smpp.port and webhook.port must differ on the same host, both are {}",
                config.smpp.port
            ),
        });
    }

    if config.smpp.max_pdu_len < MIN_PDU_LEN {
        errors.push(ConfigError::Validation {
            message: format!(
                "smpp.max_pdu_len must be at least {MIN_PDU_LEN}, got {}",
                config.smpp.max_pdu_len
            ),
        });
    }

    if config.smpp.outbound_queue == 0 {
        errors.push(ConfigError::Validation {
            message: "smpp.outbound_queue must be at least 1".to_string(),
        });
    }

    if config.smpp.response_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "smpp.response_timeout_secs must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn require_non_empty(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: format!("{key} must not be empty"),
        });
    }
}

fn require_http_url(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() && !value.starts_with("http://") && !value.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("{key} `{value}` must start with http:// or https://"),
        });
    }
}

fn validate_host(errors: &mut Vec<ConfigError>, key: &str, host: &str) {
    let addr = host.trim();
    if addr.is_empty() {
        errors.push(ConfigError::Validation {
            message: format!("{key} must not be empty"),
        });
        return;
    }

    let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
    let is_valid_hostname = addr
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
    if !is_valid_ip && !is_valid_hostname {
        errors.push(ConfigError::Validation {
            message: format!("{key} `{addr}` is not a valid IP address or hostname"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.oauth.token_url = "https://maap.example.com/oauth2/v1/token".into();
        config.oauth.client_id = "client".into();
        config.oauth.client_secret = Some("secret".into());
        config.maap.api_url = "https://maap.example.com/rcs/bot/v1".into();
        config.maap.bot_id = "bot904567".into();
        config
    }

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn complete_config_validates() {
        assert!(validate_config(&complete_config()).is_ok());
    }

    #[test]
    fn default_config_reports_every_missing_credential() {
        let errors = validate_config(&BridgeConfig::default()).unwrap_err();
        assert!(has_message(&errors, "oauth.token_url"));
        assert!(has_message(&errors, "oauth.client_id"));
        assert!(has_message(&errors, "oauth.client_secret"));
        assert!(has_message(&errors, "maap.api_url"));
        assert!(has_message(&errors, "maap.bot_id"));
    }

    #[test]
    fn non_http_url_fails_validation() {
        let mut config = complete_config();
        config.maap.api_url = "ftp://maap.example.com".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "http://"));
    }

    #[test]
    fn phone_number_with_plus_fails_validation() {
        let mut config = complete_config();
        config.bridge.phone_number = "+447900550999".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "bridge.phone_number"));
    }

    #[test]
    fn same_port_on_same_host_fails_validation() {
        let mut config = complete_config();
        config.webhook.port = config.smpp.port;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "must differ"));
    }

    #[test]
    fn ephemeral_ports_may_coincide() {
        let mut config = complete_config();
        config.smpp.port = 0;
        config.webhook.port = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn tiny_pdu_limit_fails_validation() {
        let mut config = complete_config();
        config.smpp.max_pdu_len = 8;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "max_pdu_len"));
    }

    #[test]
    fn bad_host_fails_validation() {
        let mut config = complete_config();
        config.smpp.host = "not a host!".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "smpp.host"));
    }
}
