// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `smsrcs serve` implementation.
//!
//! Wires the credential manager, MaaP client, SMPP listener and webhook
//! listener together and runs them until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use smsrcs_bridge::{InboundForwarder, OutboundForwarder};
use smsrcs_config::BridgeConfig;
use smsrcs_core::BridgeError;
use smsrcs_gateway::{WebhookServer, WebhookState};
use smsrcs_maap::{CredentialManager, MaapClient, http_client};
use smsrcs_smpp::{SessionRegistry, SmppServer};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::shutdown;

/// Both listeners bound and a valid credential in hand.
///
/// Construction is the startup precondition: if the first token exchange
/// fails, no listener is bound.
pub struct Bridge {
    credentials: Arc<CredentialManager>,
    registry: Arc<SessionRegistry>,
    smpp: SmppServer,
    webhook: WebhookServer,
}

impl Bridge {
    pub async fn start(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let http = http_client(config.maap.timeout_secs)?;

        let credentials = Arc::new(CredentialManager::new(&config.oauth, http.clone())?);
        let initial = credentials.acquire().await?;
        let expires_in = initial
            .expires_at()
            .saturating_duration_since(tokio::time::Instant::now());
        info!(
            expires_in_secs = expires_in.as_secs(),
            "initial access token acquired"
        );

        let client = Arc::new(MaapClient::new(&config.maap, credentials.clone(), http));
        info!(url = client.messages_url(), "MaaP client ready");

        let registry = Arc::new(SessionRegistry::new());
        let inbound = Arc::new(InboundForwarder::new(client));
        let smpp = SmppServer::bind(config.smpp.clone(), registry.clone(), inbound).await?;

        let outbound = Arc::new(OutboundForwarder::from_config(registry.clone(), config));
        let webhook =
            WebhookServer::bind(&config.webhook, WebhookState::new(outbound, registry.clone()))
                .await?;

        Ok(Self {
            credentials,
            registry,
            smpp,
            webhook,
        })
    }

    pub fn smpp_addr(&self) -> Result<SocketAddr, BridgeError> {
        self.smpp.local_addr()
    }

    pub fn webhook_addr(&self) -> Result<SocketAddr, BridgeError> {
        self.webhook.local_addr()
    }

    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }

    /// Runs both listeners and the token refresher until `cancel` fires or
    /// either listener fails.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), BridgeError> {
        let Self {
            credentials,
            smpp,
            webhook,
            ..
        } = self;

        let refresher = tokio::spawn(credentials.run_refresh(cancel.clone()));

        // try_join drops the surviving listener as soon as the other fails.
        let result = futures::future::try_join(smpp.run(cancel.clone()), webhook.run(cancel.clone()))
            .await;

        cancel.cancel();
        if let Err(e) = refresher.await {
            error!(error = %e, "token refresh task panicked");
        }

        result.map(|_| ())
    }
}

/// Runs the `serve` command.
pub async fn run_serve(config: BridgeConfig) -> Result<(), BridgeError> {
    init_tracing(&config.bridge.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting smsrcs serve");

    let cancel = shutdown::install_signal_handler();

    let bridge = match Bridge::start(&config).await {
        Ok(bridge) => bridge,
        Err(e) => {
            error!(error = %e, "bridge startup failed");
            return Err(e);
        }
    };

    info!(
        smpp = %bridge.smpp_addr()?,
        webhook = %bridge.webhook_addr()?,
        phone_number = %config.bridge.phone_number,
        "bridge listening"
    );

    bridge.run(cancel).await?;

    info!("smsrcs shutdown complete");
    Ok(())
}

/// Crates whose logs follow `bridge.log_level`.
const LOG_TARGETS: &[&str] = &[
    "smsrcs",
    "smsrcs_core",
    "smsrcs_config",
    "smsrcs_smpp",
    "smsrcs_maap",
    "smsrcs_bridge",
    "smsrcs_gateway",
    "tower_http",
];

fn filter_directives(log_level: &str) -> String {
    let mut directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={log_level}"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_covers_every_crate() {
        let directives = filter_directives("debug");
        assert!(directives.starts_with("smsrcs=debug,"));
        assert!(directives.contains("smsrcs_smpp=debug"));
        assert!(directives.contains("tower_http=debug"));
        assert!(directives.ends_with(",warn"));
    }

    #[test]
    fn filter_directives_parse() {
        let filter = tracing_subscriber::EnvFilter::try_new(filter_directives("info"));
        assert!(filter.is_ok());
    }
}
