// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the webhook receiver.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::get;
use smsrcs_bridge::OutboundForwarder;
use smsrcs_config::model::WebhookConfig;
use smsrcs_core::BridgeError;
use smsrcs_smpp::SessionRegistry;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::dispatch::ReplyDispatcher;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct WebhookState {
    /// Delivers suggested replies to bound SMPP sessions.
    pub dispatcher: Arc<ReplyDispatcher>,
    /// Session counts for `/health`.
    pub registry: Arc<SessionRegistry>,
    /// Process start time for uptime calculation.
    pub started: Instant,
}

impl WebhookState {
    pub fn new(outbound: Arc<OutboundForwarder>, registry: Arc<SessionRegistry>) -> Self {
        Self {
            dispatcher: Arc::new(ReplyDispatcher::new(outbound)),
            registry,
            started: Instant::now(),
        }
    }
}

/// Routes:
/// - `POST /` MaaP callbacks
/// - `GET /` liveness probe
/// - `GET /health` JSON status
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(handlers::get_root).post(handlers::post_webhook))
        .route("/health", get(handlers::get_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bound webhook listener.
pub struct WebhookServer {
    listener: TcpListener,
    app: Router,
    dispatcher: Arc<ReplyDispatcher>,
}

impl WebhookServer {
    /// Binds to `config.host:config.port`.
    pub async fn bind(config: &WebhookConfig, state: WebhookState) -> Result<Self, BridgeError> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| BridgeError::Transport {
                message: format!("failed to bind webhook listener to {addr}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            listener,
            dispatcher: state.dispatcher.clone(),
            app: router(state),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
        self.listener
            .local_addr()
            .map_err(|e| BridgeError::Transport {
                message: "webhook listener has no local address".to_string(),
                source: Some(Box::new(e)),
            })
    }

    /// Serves until `cancel` fires, then drains in-flight requests and
    /// reply deliveries.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), BridgeError> {
        let addr = self.local_addr()?;
        tracing::info!(%addr, "webhook listener started");

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
            .map_err(|e| BridgeError::Transport {
                message: format!("webhook server error: {e}"),
                source: Some(Box::new(e)),
            })?;

        self.dispatcher.shutdown().await;
        tracing::info!(%addr, "webhook listener stopped");
        Ok(())
    }
}
