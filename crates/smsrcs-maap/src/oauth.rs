// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OAuth2 client-credentials token management for the MaaP API.
//!
//! [`CredentialManager`] exchanges the configured client id/secret for a
//! bearer token and keeps the current token in an [`ArcSwapOption`], so
//! concurrent senders read a complete token without locking. Refreshes are
//! single-flight: concurrent callers that find the token stale wait on one
//! exchange instead of each starting their own.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use secrecy::{ExposeSecret, SecretString};
use smsrcs_config::model::OAuthConfig;
use smsrcs_core::BridgeError;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::types::TokenResponse;

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Longest token lifetime taken at face value; larger `expires_in` values
/// are clamped to it.
pub const MAX_EXPIRES_IN_SECS: u64 = 30 * 24 * 3600;

/// Pause before the background refresher retries a failed exchange.
const RETRY_AFTER_FAILURE: Duration = Duration::from_secs(30);

/// Shortest pause between two scheduled refreshes.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// A bearer token and its expiry. The token itself is only reachable
/// through [`ExposeSecret`].
pub struct Credential {
    token: SecretString,
    expires_at: Instant,
    refresh_at: Instant,
}

impl Credential {
    fn new(token: String, lifetime: Duration, refresh_skew: Duration) -> Self {
        let now = Instant::now();
        // Short-lived tokens are refreshed halfway through instead of immediately.
        let skew = refresh_skew.min(lifetime / 2);
        Self {
            token: SecretString::from(token),
            expires_at: now + lifetime,
            refresh_at: now + lifetime - skew,
        }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// False once the token is inside its refresh window.
    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.refresh_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Obtains and caches the MaaP bearer token.
pub struct CredentialManager {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    scope: String,
    refresh_skew: Duration,
    current: ArcSwapOption<Credential>,
    refresh: Mutex<()>,
}

impl fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialManager")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

impl CredentialManager {
    pub fn new(config: &OAuthConfig, http: reqwest::Client) -> Result<Self, BridgeError> {
        let client_secret = config
            .client_secret
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| BridgeError::Config("oauth.client_secret is not set".to_string()))?;

        Ok(Self {
            http,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: SecretString::from(client_secret),
            scope: config.scope.clone(),
            refresh_skew: Duration::from_secs(config.refresh_skew_secs),
            current: ArcSwapOption::empty(),
            refresh: Mutex::new(()),
        })
    }

    /// Returns a valid credential, exchanging for a new one if the cached
    /// token is missing or about to expire.
    pub async fn acquire(&self) -> Result<Arc<Credential>, BridgeError> {
        if let Some(credential) = self.current.load_full() {
            if credential.is_fresh() {
                return Ok(credential);
            }
        }

        let _guard = self.refresh.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(credential) = self.current.load_full() {
            if credential.is_fresh() {
                return Ok(credential);
            }
        }
        self.exchange_and_store().await
    }

    /// Discards `stale` so the next [`acquire`](Self::acquire) exchanges
    /// again. A credential that was already replaced is left alone.
    pub fn invalidate(&self, stale: &Arc<Credential>) {
        let current = self.current.load();
        if let Some(credential) = &*current {
            if Arc::ptr_eq(credential, stale) {
                self.current.store(None);
                debug!("cached MaaP token invalidated");
            }
        }
    }

    /// Keeps the token fresh ahead of expiry until `cancel` fires.
    pub async fn run_refresh(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            // Floored so a token stale on arrival (`expires_in: 0`) is not
            // re-exchanged back to back.
            let wait = self
                .current
                .load_full()
                .map(|c| {
                    c.refresh_at
                        .saturating_duration_since(Instant::now())
                        .max(MIN_REFRESH_INTERVAL)
                })
                .unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            let result = {
                let _guard = self.refresh.lock().await;
                match self.current.load_full() {
                    Some(credential) if credential.is_fresh() => Ok(credential),
                    _ => self.exchange_and_store().await,
                }
            };

            if let Err(e) = result {
                warn!(error = %e, retry_in = ?RETRY_AFTER_FAILURE, "scheduled MaaP token refresh failed");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RETRY_AFTER_FAILURE) => {}
                }
            }
        }
        debug!("MaaP token refresher stopped");
    }

    async fn exchange_and_store(&self) -> Result<Arc<Credential>, BridgeError> {
        let credential = Arc::new(self.exchange().await?);
        self.current.store(Some(credential.clone()));
        Ok(credential)
    }

    async fn exchange(&self) -> Result<Credential, BridgeError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| BridgeError::Credential {
                message: format!("token request to {} failed: {e}", self.token_url),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::Credential {
                message: format!("token endpoint returned {status}: {}", excerpt(&body)),
                source: None,
            });
        }

        let body: TokenResponse = response.json().await.map_err(|e| BridgeError::Credential {
            message: format!("failed to parse token response: {e}"),
            source: Some(Box::new(e)),
        })?;

        let expires_in = body.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        if expires_in > MAX_EXPIRES_IN_SECS {
            warn!(
                expires_in,
                max = MAX_EXPIRES_IN_SECS,
                "token endpoint reported an implausible lifetime, clamping"
            );
        }
        let lifetime = Duration::from_secs(expires_in.min(MAX_EXPIRES_IN_SECS));
        info!(
            expires_in = lifetime.as_secs(),
            token_type = body.token_type.as_deref().unwrap_or("bearer"),
            "obtained MaaP access token"
        );
        Ok(Credential::new(body.access_token, lifetime, self.refresh_skew))
    }
}

/// First 200 characters of a response body, for error messages.
pub(crate) fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
