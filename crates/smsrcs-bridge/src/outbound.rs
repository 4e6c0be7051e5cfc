// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rich-channel replies to SMPP `deliver_sm`.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use smsrcs_config::BridgeConfig;
use smsrcs_core::{BridgeError, CallbackEvent, SessionHandle, SuggestedReply};
use smsrcs_smpp::encoding::encode_text;
use smsrcs_smpp::{CommandId, Pdu, Session, SessionRegistry, ShortMessage};
use tracing::{debug, info, warn};

/// Outcome of broadcasting one reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Sessions a `deliver_sm` was attempted on.
    pub attempted: usize,
    /// Sessions that acknowledged with `ESME_ROK`.
    pub delivered: usize,
    /// Sessions that failed, with the reason.
    pub failed: Vec<(SessionHandle, String)>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delivers suggested replies to every bound, receive-capable session.
///
/// Each session is attempted independently and concurrently; a failure on
/// one session never affects the others.
pub struct OutboundForwarder {
    registry: Arc<SessionRegistry>,
    source_addr: String,
    response_timeout: Duration,
}

impl OutboundForwarder {
    /// `source_addr` is the bridge's own number, used as the `deliver_sm`
    /// source. `response_timeout` bounds the wait for each `deliver_sm_resp`.
    pub fn new(
        registry: Arc<SessionRegistry>,
        source_addr: impl Into<String>,
        response_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            source_addr: source_addr.into(),
            response_timeout,
        }
    }

    /// Uses `bridge.phone_number` as source and `smpp.response_timeout_secs`.
    pub fn from_config(registry: Arc<SessionRegistry>, config: &BridgeConfig) -> Self {
        Self::new(
            registry,
            config.bridge.phone_number.clone(),
            Duration::from_secs(config.smpp.response_timeout_secs),
        )
    }

    /// Routes a classified callback. Only suggested replies produce
    /// deliveries; everything else is logged and dropped.
    pub async fn handle_event(&self, event: CallbackEvent) -> Option<DeliveryReport> {
        match event {
            CallbackEvent::SuggestedReply(reply) => Some(self.deliver_reply(&reply).await),
            CallbackEvent::NewUser { user } => {
                info!(%user, "new RCS user, nothing to deliver");
                None
            }
            CallbackEvent::InboundText { user, text } => {
                info!(%user, chars = text.chars().count(), "free-text RCS message dropped");
                None
            }
            CallbackEvent::Ignored { event } => {
                debug!(event = event.as_deref().unwrap_or("<none>"), "callback ignored");
                None
            }
        }
    }

    /// Sends `reply.display_text` to `reply.user` on every candidate session.
    pub async fn deliver_reply(&self, reply: &SuggestedReply) -> DeliveryReport {
        let pdu = self.deliver_sm(reply);

        let targets: Vec<Session> = self
            .registry
            .find_by_address(&reply.user)
            .filter(|s| {
                let deliverable = s.is_deliverable();
                if !deliverable {
                    debug!(session = %s.handle, "skipping session bound without receive capability");
                }
                deliverable
            })
            .collect();

        let attempts = targets.iter().map(|session| {
            let pdu = pdu.clone();
            async move { (session.handle, self.deliver_one(session, pdu).await) }
        });
        let outcomes = join_all(attempts).await;

        let mut report = DeliveryReport {
            attempted: outcomes.len(),
            ..DeliveryReport::default()
        };
        for (handle, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    report.delivered += 1;
                    debug!(session = %handle, user = %reply.user, "deliver_sm acknowledged");
                }
                Err(e) => {
                    warn!(session = %handle, user = %reply.user, error = %e, "deliver_sm failed");
                    report.failed.push((handle, e.to_string()));
                }
            }
        }

        info!(
            user = %reply.user,
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed.len(),
            "suggested reply broadcast"
        );
        report
    }

    fn deliver_sm(&self, reply: &SuggestedReply) -> Pdu {
        let (data_coding, octets) = encode_text(&reply.display_text);
        let mut sm = ShortMessage {
            source_addr: self.source_addr.clone(),
            destination_addr: reply.user.clone(),
            data_coding,
            ..ShortMessage::default()
        };
        sm.set_payload(octets);
        // Sequence number is assigned per session when the request is sent.
        Pdu::deliver_sm(0, sm)
    }

    async fn deliver_one(&self, session: &Session, pdu: Pdu) -> Result<(), BridgeError> {
        let resp = session.link.request(pdu, self.response_timeout).await?;
        if resp.command_id == CommandId::GenericNack {
            return Err(BridgeError::Protocol(format!(
                "peer rejected deliver_sm with generic_nack {}",
                resp.command_status
            )));
        }
        if !resp.command_status.is_ok() {
            return Err(BridgeError::Protocol(format!(
                "peer answered deliver_sm with {}",
                resp.command_status
            )));
        }
        Ok(())
    }
}
