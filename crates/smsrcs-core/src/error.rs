// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the smsrcs bridge.

use thiserror::Error;

use crate::types::SessionHandle;

/// The primary error type shared by every smsrcs crate.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// OAuth token acquisition failed. Fatal at startup.
    #[error("credential error: {message}")]
    Credential {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Rich-messaging provider errors (network failure, non-success status, bad response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        /// HTTP status returned by the provider, if the request got that far.
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Binary transport errors (socket I/O, closed session, full writer queue).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A PDU could not be framed or decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A webhook body could not be parsed.
    #[error("malformed callback: {message}")]
    MalformedCallback {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The session handle is not present in the registry.
    #[error("unknown session {0}")]
    UnknownSession(SessionHandle),

    /// The session handle was registered twice.
    #[error("session {0} is already registered")]
    SessionAlreadyRegistered(SessionHandle),

    /// A lifecycle transition was requested from the wrong state.
    #[error("session {handle} cannot transition from {state}")]
    InvalidSessionState { handle: SessionHandle, state: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>, status: Option<u16>) -> Self {
        BridgeError::Provider {
            message: message.into(),
            status,
            source: None,
        }
    }

    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        BridgeError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if the provider rejected the request's credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            BridgeError::Provider {
                status: Some(401),
                ..
            }
        )
    }
}
