// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock rich-messaging client for deterministic testing.
//!
//! `MockRichClient` implements `RichMessagingClient` with a FIFO queue of
//! scripted outcomes and captures every request for assertions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use smsrcs_core::{BridgeError, MessageId, OutboundRichRequest, RichMessagingClient};

/// Scripted outcome of one send.
#[derive(Debug, Clone)]
enum Outcome {
    Accept(String),
    Reject(String),
}

/// A mock rich-messaging client.
///
/// Outcomes are popped from a queue. When the queue is empty, sends succeed
/// with ids `mock-1`, `mock-2`, ...
#[derive(Clone, Default)]
pub struct MockRichClient {
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    sent: Arc<Mutex<Vec<OutboundRichRequest>>>,
    delay: Option<Duration>,
}

impl MockRichClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every send, to simulate a slow provider.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Next send succeeds with `msg_id`.
    pub async fn push_accept(&self, msg_id: &str) {
        self.outcomes
            .lock()
            .await
            .push_back(Outcome::Accept(msg_id.to_string()));
    }

    /// Next send fails with a provider error carrying `message`.
    pub async fn push_reject(&self, message: &str) {
        self.outcomes
            .lock()
            .await
            .push_back(Outcome::Reject(message.to_string()));
    }

    /// Every request passed to `send_message`, in call order.
    pub async fn sent_requests(&self) -> Vec<OutboundRichRequest> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl RichMessagingClient for MockRichClient {
    async fn send_message(&self, request: &OutboundRichRequest) -> Result<MessageId, BridgeError> {
        let sequence = {
            let mut sent = self.sent.lock().await;
            sent.push(request.clone());
            sent.len()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.outcomes.lock().await.pop_front() {
            Some(Outcome::Accept(id)) => Ok(MessageId(id)),
            Some(Outcome::Reject(message)) => Err(BridgeError::provider(message, Some(500))),
            None => Ok(MessageId(format!("mock-{sequence}"))),
        }
    }
}
