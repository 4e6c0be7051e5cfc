// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rich-messaging client trait.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::types::{MessageId, OutboundRichRequest};

/// Sends messages over the rich-messaging channel.
///
/// Implementations own authentication. A successful call returns the
/// provider-assigned message identifier; any other outcome (network error,
/// non-success status, response without an identifier) is an error.
#[async_trait]
pub trait RichMessagingClient: Send + Sync + 'static {
    /// Sends one message and returns the provider's message id.
    async fn send_message(&self, request: &OutboundRichRequest) -> Result<MessageId, BridgeError>;
}
