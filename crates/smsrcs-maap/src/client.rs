// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the MaaP bot messaging API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use smsrcs_config::model::MaapConfig;
use smsrcs_core::{BridgeError, MessageId, OutboundRichRequest, RichMessagingClient};
use tracing::{debug, warn};

use crate::oauth::{Credential, CredentialManager, excerpt};
use crate::types::{SendMessageRequest, SendMessageResponse};

/// Builds the HTTP client shared by the token exchange and message sends.
///
/// `timeout_secs` of `None` keeps reqwest's default (no overall timeout).
pub fn http_client(timeout_secs: Option<u64>) -> Result<reqwest::Client, BridgeError> {
    let mut builder = reqwest::Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(|e| BridgeError::Provider {
        message: format!("failed to build HTTP client: {e}"),
        status: None,
        source: Some(Box::new(e)),
    })
}

/// Sends bot messages through `POST {api_url}/{bot_id}/messages`.
///
/// A `401` invalidates the cached token and the send is retried once with a
/// fresh one. Every other failure is returned to the caller as is.
#[derive(Debug, Clone)]
pub struct MaapClient {
    http: reqwest::Client,
    credentials: Arc<CredentialManager>,
    messages_url: String,
}

impl MaapClient {
    pub fn new(
        config: &MaapConfig,
        credentials: Arc<CredentialManager>,
        http: reqwest::Client,
    ) -> Self {
        let messages_url = format!(
            "{}/{}/messages",
            config.api_url.trim_end_matches('/'),
            config.bot_id
        );
        Self {
            http,
            credentials,
            messages_url,
        }
    }

    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }

    async fn send_once(
        &self,
        credential: &Credential,
        body: &SendMessageRequest<'_>,
    ) -> Result<MessageId, BridgeError> {
        let response = self
            .http
            .post(&self.messages_url)
            .bearer_auth(credential.token().expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| BridgeError::Provider {
                message: format!("MaaP request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| BridgeError::Provider {
            message: format!("failed to read MaaP response body: {e}"),
            status: Some(status.as_u16()),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(BridgeError::provider(
                format!("MaaP returned {status}: {}", excerpt(&text)),
                Some(status.as_u16()),
            ));
        }

        let parsed: SendMessageResponse =
            serde_json::from_str(&text).map_err(|e| BridgeError::Provider {
                message: format!("failed to parse MaaP response: {e}"),
                status: Some(status.as_u16()),
                source: Some(Box::new(e)),
            })?;

        parsed
            .rcs_message
            .and_then(|m| m.msg_id)
            .filter(|id| !id.is_empty())
            .map(MessageId)
            .ok_or_else(|| {
                BridgeError::provider(
                    format!("MaaP response has no RCSMessage.msgId: {}", excerpt(&text)),
                    Some(status.as_u16()),
                )
            })
    }
}

#[async_trait]
impl RichMessagingClient for MaapClient {
    async fn send_message(&self, request: &OutboundRichRequest) -> Result<MessageId, BridgeError> {
        let body = SendMessageRequest::from(request);
        let credential = self.credentials.acquire().await?;

        let result = match self.send_once(&credential, &body).await {
            Err(e) if e.is_unauthorized() => {
                warn!(user = %request.destination, "MaaP rejected the access token, re-authenticating");
                self.credentials.invalidate(&credential);
                let fresh = self.credentials.acquire().await?;
                self.send_once(&fresh, &body).await
            }
            other => other,
        };

        if let Ok(msg_id) = &result {
            debug!(user = %request.destination, %msg_id, chips = request.quick_replies.len(), "rich message accepted");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smsrcs_config::model::OAuthConfig;
    use smsrcs_core::QuickReply;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use tracing_test::traced_test;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_token(server: &MockServer, token: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path("/oauth2/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": token,
                "expires_in": 3600
            })))
            .up_to_n_times(times)
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> MaapClient {
        let oauth = OAuthConfig {
            token_url: format!("{}/oauth2/v1/token", server.uri()),
            client_id: "client".into(),
            client_secret: Some("secret".into()),
            ..OAuthConfig::default()
        };
        let maap = MaapConfig {
            api_url: format!("{}/rcs/bot/v1/", server.uri()),
            bot_id: "bot904567".into(),
            timeout_secs: Some(5),
        };
        let http = http_client(maap.timeout_secs).unwrap();
        let credentials = Arc::new(CredentialManager::new(&oauth, http.clone()).unwrap());
        MaapClient::new(&maap, credentials, http)
    }

    fn request() -> OutboundRichRequest {
        OutboundRichRequest {
            destination: "+19005550100".into(),
            text: "Hello reply YES or reply NO".into(),
            quick_replies: vec![
                QuickReply::reply("YES", "Choice_YES"),
                QuickReply::reply("NO", "Choice_NO"),
            ],
        }
    }

    fn accepted(msg_id: &str) -> ResponseTemplate {
        ResponseTemplate::new(202).set_body_json(serde_json::json!({
            "RCSMessage": {"msgId": msg_id, "status": "pending"}
        }))
    }

    #[tokio::test]
    async fn send_returns_provider_msg_id() {
        let server = MockServer::start().await;
        mount_token(&server, "tok-1", 1).await;
        Mock::given(method("POST"))
            .and(path("/rcs/bot/v1/bot904567/messages"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_partial_json(serde_json::json!({
                "RCSMessage": {
                    "textMessage": "Hello reply YES or reply NO",
                    "suggestedChipList": {"suggestions": [
                        {"reply": {"displayText": "YES", "postback": {"data": "Choice_YES"}}},
                        {"reply": {"displayText": "NO", "postback": {"data": "Choice_NO"}}}
                    ]}
                },
                "messageContact": {"userContact": "+19005550100"}
            })))
            .respond_with(accepted("m-123"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(client.messages_url().ends_with("/rcs/bot/v1/bot904567/messages"));
        let id = client.send_message(&request()).await.unwrap();
        assert_eq!(id, MessageId("m-123".into()));
    }

    #[tokio::test]
    #[traced_test]
    async fn unauthorized_send_reauthenticates_once() {
        let server = MockServer::start().await;
        mount_token(&server, "stale", 1).await;
        mount_token(&server, "fresh", 1).await;
        Mock::given(method("POST"))
            .and(path("/rcs/bot/v1/bot904567/messages"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rcs/bot/v1/bot904567/messages"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(accepted("m-456"))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).send_message(&request()).await.unwrap();
        assert_eq!(id.0, "m-456");
        assert!(logs_contain("re-authenticating"));
        assert!(!logs_contain("fresh"));
    }

    #[tokio::test]
    async fn repeated_unauthorized_gives_up() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 10).await;
        Mock::given(method("POST"))
            .and(path("/rcs/bot/v1/bot904567/messages"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let err = client(&server).send_message(&request()).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 1).await;
        Mock::given(method("POST"))
            .and(path("/rcs/bot/v1/bot904567/messages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).send_message(&request()).await.unwrap_err();
        assert!(matches!(err, BridgeError::Provider { status: Some(500), .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn success_without_msg_id_is_an_error() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 1).await;
        Mock::given(method("POST"))
            .and(path("/rcs/bot/v1/bot904567/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"RCSMessage": {}})))
            .mount(&server)
            .await;

        let err = client(&server).send_message(&request()).await.unwrap_err();
        assert!(err.to_string().contains("msgId"), "got: {err}");
    }

    #[tokio::test]
    async fn credential_failure_fails_the_send() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/v1/token"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let err = client(&server).send_message(&request()).await.unwrap_err();
        assert!(matches!(err, BridgeError::Credential { .. }));
    }
}
