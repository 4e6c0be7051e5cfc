// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the smsrcs bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level bridge configuration.
///
/// Loaded once at startup from TOML files and environment variables, then
/// passed explicitly to each component. Never reconfigured at runtime.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Bridge identity and logging.
    #[serde(default)]
    pub bridge: BridgeSection,

    /// OAuth2 client-credentials settings for the rich-messaging API.
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// Rich-messaging (MaaP) API settings.
    #[serde(default)]
    pub maap: MaapConfig,

    /// SMPP listener settings.
    #[serde(default)]
    pub smpp: SmppConfig,

    /// Webhook HTTP listener settings.
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// Bridge identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeSection {
    /// The bridge's own number on the rich channel, used as the SMPP source
    /// address of every `deliver_sm`.
    #[serde(default = "default_phone_number")]
    pub phone_number: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            phone_number: default_phone_number(),
            log_level: default_log_level(),
        }
    }
}

fn default_phone_number() -> String {
    "447900550999".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// OAuth2 client-credentials configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OAuthConfig {
    /// Token endpoint URL.
    #[serde(default)]
    pub token_url: String,

    /// OAuth client id.
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret. `None` requires `SMSRCS_OAUTH_CLIENT_SECRET`.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Scope requested in the client-credentials grant.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Tokens this close to expiry are refreshed on next use.
    #[serde(default = "default_refresh_skew_secs")]
    pub refresh_skew_secs: u64,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            token_url: String::new(),
            client_id: String::new(),
            client_secret: None,
            scope: default_scope(),
            refresh_skew_secs: default_refresh_skew_secs(),
        }
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("scope", &self.scope)
            .field("refresh_skew_secs", &self.refresh_skew_secs)
            .finish()
    }
}

fn default_scope() -> String {
    "botmessage".to_string()
}

fn default_refresh_skew_secs() -> u64 {
    60
}

/// Rich-messaging (MaaP) API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MaapConfig {
    /// Base URL of the chatbot API, e.g. `https://host/rcs/bot/v1`.
    #[serde(default)]
    pub api_url: String,

    /// Bot identifier appended to the base URL.
    #[serde(default)]
    pub bot_id: String,

    /// Per-request timeout. `None` keeps the HTTP client's default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// SMPP listener configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmppConfig {
    /// Host address to bind.
    #[serde(default = "default_bind_host")]
    pub host: String,

    /// TCP port to bind.
    #[serde(default = "default_smpp_port")]
    pub port: u16,

    /// System id the bridge reports in bind responses.
    #[serde(default = "default_system_id")]
    pub system_id: String,

    /// Required peer system id. `None` accepts any peer.
    #[serde(default)]
    pub bind_system_id: Option<String>,

    /// Required peer password. `None` accepts any password.
    #[serde(default)]
    pub bind_password: Option<String>,

    /// How long to wait for a peer's response to a bridge-originated PDU.
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,

    /// Largest accepted `command_length`.
    #[serde(default = "default_max_pdu_len")]
    pub max_pdu_len: usize,

    /// Capacity of each session's outbound write queue.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

impl Default for SmppConfig {
    fn default() -> Self {
        Self {
            host: default_bind_host(),
            port: default_smpp_port(),
            system_id: default_system_id(),
            bind_system_id: None,
            bind_password: None,
            response_timeout_secs: default_response_timeout_secs(),
            max_pdu_len: default_max_pdu_len(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

impl fmt::Debug for SmppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("system_id", &self.system_id)
            .field("bind_system_id", &self.bind_system_id)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "[redacted]"),
            )
            .field("response_timeout_secs", &self.response_timeout_secs)
            .field("max_pdu_len", &self.max_pdu_len)
            .field("outbound_queue", &self.outbound_queue)
            .finish()
    }
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_smpp_port() -> u16 {
    2775
}

fn default_system_id() -> String {
    "smsrcs".to_string()
}

fn default_response_timeout_secs() -> u64 {
    30
}

fn default_max_pdu_len() -> usize {
    65536
}

fn default_outbound_queue() -> usize {
    64
}

/// Webhook HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Host address to bind.
    #[serde(default = "default_bind_host")]
    pub host: String,

    /// TCP port to bind.
    #[serde(default = "default_webhook_port")]
    pub port: u16,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            host: default_bind_host(),
            port: default_webhook_port(),
        }
    }
}

fn default_webhook_port() -> u16 {
    5050
}
