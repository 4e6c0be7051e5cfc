// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-connection session state and the handle used to write to it.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use smsrcs_core::{BridgeError, SessionHandle};
use tokio::sync::{mpsc, oneshot};

use crate::pdu::{CommandId, Pdu};

const MAX_SEQUENCE: u32 = 0x7FFF_FFFF;

/// Which bind operation the peer used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BindMode {
    Transceiver,
    Transmitter,
    Receiver,
}

impl BindMode {
    pub fn from_command(command_id: CommandId) -> Option<Self> {
        match command_id {
            CommandId::BindTransceiver => Some(BindMode::Transceiver),
            CommandId::BindTransmitter => Some(BindMode::Transmitter),
            CommandId::BindReceiver => Some(BindMode::Receiver),
            _ => None,
        }
    }

    /// The peer may send `submit_sm`.
    pub fn can_submit(self) -> bool {
        matches!(self, BindMode::Transceiver | BindMode::Transmitter)
    }

    /// The peer accepts `deliver_sm`.
    pub fn can_receive(self) -> bool {
        matches!(self, BindMode::Transceiver | BindMode::Receiver)
    }
}

/// Lifecycle of one connection: connected, then bound, then closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    Connected,
    Bound(BindMode),
    Closed,
}

/// Write side of a connection, shared between the reader task, the registry
/// and the forwarders.
///
/// PDUs are queued to the connection's writer task; requests originated by
/// the bridge (`deliver_sm`) are matched with their responses by sequence
/// number.
#[derive(Debug)]
pub struct SessionLink {
    outbound: mpsc::Sender<Pdu>,
    pending: DashMap<u32, oneshot::Sender<Pdu>>,
    next_sequence: AtomicU32,
}

impl SessionLink {
    /// Creates a link and the receiving end its writer task drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Pdu>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let link = Self {
            outbound,
            pending: DashMap::new(),
            next_sequence: AtomicU32::new(1),
        };
        (link, rx)
    }

    /// Allocates the next bridge-originated sequence number (1..=0x7FFFFFFF).
    pub fn next_sequence(&self) -> u32 {
        self.next_sequence
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |seq| {
                Some(if seq >= MAX_SEQUENCE { 1 } else { seq + 1 })
            })
            .unwrap_or(1)
    }

    /// Queues a PDU for writing. Fails once the connection is gone.
    pub async fn send(&self, pdu: Pdu) -> Result<(), BridgeError> {
        let command_id = pdu.command_id;
        self.outbound
            .send(pdu)
            .await
            .map_err(|_| BridgeError::transport(format!("session closed, {command_id} not written")))
    }

    /// Sends a bridge-originated request and waits for the matching response.
    ///
    /// The request's sequence number is assigned here.
    pub async fn request(&self, mut pdu: Pdu, timeout: Duration) -> Result<Pdu, BridgeError> {
        let sequence = self.next_sequence();
        pdu.sequence_number = sequence;

        let (tx, rx) = oneshot::channel();
        self.pending.insert(sequence, tx);

        if let Err(err) = self.send(pdu).await {
            self.pending.remove(&sequence);
            return Err(err);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(_)) => Err(BridgeError::transport(format!(
                "session closed before response to seq {sequence}"
            ))),
            Err(_) => {
                self.pending.remove(&sequence);
                Err(BridgeError::Timeout { duration: timeout })
            }
        }
    }

    /// Hands a response PDU to whoever is waiting on its sequence number.
    ///
    /// Returns false if nothing was waiting.
    pub fn complete(&self, resp: Pdu) -> bool {
        match self.pending.remove(&resp.sequence_number) {
            Some((_, waiter)) => waiter.send(resp).is_ok(),
            None => false,
        }
    }

    /// Drops every waiter so in-flight requests fail immediately.
    pub fn fail_pending(&self) {
        self.pending.clear();
    }
}

/// Point-in-time copy of a registry entry.
#[derive(Debug, Clone)]
pub struct Session {
    pub handle: SessionHandle,
    pub state: SessionState,
    /// Identity the peer presented in its bind.
    pub system_id: Option<String>,
    pub peer_addr: Option<SocketAddr>,
    pub connected_at: DateTime<Utc>,
    pub bound_at: Option<DateTime<Utc>>,
    pub link: std::sync::Arc<SessionLink>,
}

impl Session {
    /// Bound and accepting `deliver_sm`.
    pub fn is_deliverable(&self) -> bool {
        matches!(self.state, SessionState::Bound(mode) if mode.can_receive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::CommandStatus;

    #[test]
    fn sequence_wraps_before_high_bit() {
        let (link, _rx) = SessionLink::new(1);
        link.next_sequence.store(MAX_SEQUENCE, Ordering::Relaxed);
        assert_eq!(link.next_sequence(), MAX_SEQUENCE);
        assert_eq!(link.next_sequence(), 1);
    }

    #[tokio::test]
    async fn request_resolves_with_matching_response() {
        let (link, mut rx) = SessionLink::new(4);
        let link = std::sync::Arc::new(link);

        let peer = {
            let link = link.clone();
            tokio::spawn(async move {
                let req = rx.recv().await.unwrap();
                assert_eq!(req.command_id, CommandId::EnquireLink);
                assert!(!link.complete(Pdu::enquire_link_resp(req.sequence_number + 100)));
                assert!(link.complete(Pdu::enquire_link_resp(req.sequence_number)));
            })
        };

        let resp = link
            .request(Pdu::enquire_link(0), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(resp.command_id, CommandId::EnquireLinkResp);
        peer.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn request_times_out_without_response() {
        let (link, _rx) = SessionLink::new(4);
        let err = link
            .request(Pdu::enquire_link(0), Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Timeout { .. }));
        assert!(link.pending.is_empty());
    }

    #[tokio::test]
    async fn send_fails_after_writer_is_gone() {
        let (link, rx) = SessionLink::new(1);
        drop(rx);
        let err = link
            .send(Pdu::deliver_sm_resp(1, CommandStatus::OK))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Transport { .. }));
    }

    #[tokio::test]
    async fn fail_pending_wakes_waiters() {
        let (link, mut rx) = SessionLink::new(4);
        let link = std::sync::Arc::new(link);
        let waiter = {
            let link = link.clone();
            tokio::spawn(async move {
                link.request(Pdu::enquire_link(0), Duration::from_secs(60))
                    .await
            })
        };
        rx.recv().await.unwrap();
        link.fail_pending();
        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(err, BridgeError::Transport { .. }));
    }

    #[test]
    fn bind_modes() {
        assert!(BindMode::Transceiver.can_submit() && BindMode::Transceiver.can_receive());
        assert!(!BindMode::Receiver.can_submit());
        assert!(!BindMode::Transmitter.can_receive());
        assert_eq!(
            BindMode::from_command(CommandId::BindReceiver),
            Some(BindMode::Receiver)
        );
        assert_eq!(SessionState::Connected.to_string(), "connected");
    }
}
