// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the webhook endpoints.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::server::WebhookState;

/// Acknowledgment body for every callback.
pub const WEBHOOK_ACK: &str = "Webhook received";

/// Body of `GET /`.
pub const GET_ACK: &str = "GET request received";

/// Response for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub sessions: usize,
    pub bound_sessions: usize,
}

/// POST /
///
/// Classifies a MaaP callback and hands it to the reply dispatcher, which
/// delivers in the background. Always answers `200`, even for bodies that
/// cannot be parsed, so the provider never redelivers.
pub async fn post_webhook(State(state): State<WebhookState>, body: Bytes) -> (StatusCode, &'static str) {
    debug!(len = body.len(), body = %excerpt(&body), "webhook body received");

    match smsrcs_maap::classify(&body) {
        Ok(event) => {
            info!(kind = %event.kind(), "webhook callback classified");
            state.dispatcher.dispatch(event).await;
        }
        Err(e) => {
            warn!(error = %e, body = %excerpt(&body), "malformed webhook callback dropped");
        }
    }

    (StatusCode::OK, WEBHOOK_ACK)
}

/// GET /
pub async fn get_root(Query(params): Query<HashMap<String, String>>) -> (StatusCode, &'static str) {
    debug!(?params, "GET / received");
    (StatusCode::OK, GET_ACK)
}

/// GET /health
pub async fn get_health(State(state): State<WebhookState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
        sessions: state.registry.len(),
        bound_sessions: state.registry.bound_count(),
    })
}

/// Lossy UTF-8 excerpt of a request body for logs.
fn excerpt(body: &[u8]) -> String {
    const MAX: usize = 200;
    let text = String::from_utf8_lossy(&body[..body.len().min(MAX)]);
    if body.len() > MAX {
        format!("{text}...")
    } else {
        text.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use smsrcs_bridge::OutboundForwarder;
    use smsrcs_smpp::SessionRegistry;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    use super::*;
    use crate::server::router;

    fn state() -> WebhookState {
        let registry = Arc::new(SessionRegistry::new());
        let outbound = Arc::new(OutboundForwarder::new(
            registry.clone(),
            "447900550999",
            Duration::from_secs(1),
        ));
        WebhookState::new(outbound, registry)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn malformed_json_is_acknowledged() {
        let response = router(state()).oneshot(post("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, WEBHOOK_ACK);
        assert!(logs_contain("malformed webhook callback dropped"));
    }

    #[tokio::test]
    async fn invalid_utf8_is_acknowledged() {
        let response = router(state())
            .oneshot(post(vec![0xff_u8, 0xfe, 0x00]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    #[traced_test]
    async fn new_user_is_classified_and_dropped() {
        let body = r#"{"event":"newUser","messageContact":{"userContact":"+447700900123"}}"#;
        let response = router(state()).oneshot(post(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(logs_contain("kind=new-user"));
    }

    #[tokio::test]
    async fn get_root_answers() {
        let request = Request::builder()
            .uri("/?probe=1")
            .body(Body::empty())
            .unwrap();
        let response = router(state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, GET_ACK);
    }

    #[tokio::test]
    async fn health_reports_session_counts() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = router(state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["sessions"], 0);
        assert_eq!(json["bound_sessions"], 0);
    }

    #[test]
    fn excerpt_is_bounded() {
        let long = vec![b'a'; 500];
        assert_eq!(excerpt(&long).len(), 203);
        assert_eq!(excerpt(b"short"), "short");
    }
}
