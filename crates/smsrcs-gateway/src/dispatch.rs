// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background delivery of suggested replies.
//!
//! Replies for the same user are delivered in the order their callbacks
//! arrived; replies for different users run concurrently. Every delivery
//! task is tracked so shutdown can wait for in-flight fan-outs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use smsrcs_bridge::OutboundForwarder;
use smsrcs_core::{CallbackEvent, SuggestedReply};
use tokio::sync::oneshot;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

/// Completion signal of the most recent delivery queued for one user.
struct Tail {
    ticket: u64,
    done: oneshot::Receiver<()>,
}

/// Hands classified callbacks to the [`OutboundForwarder`] without making
/// the webhook acknowledgment wait on SMPP peers.
pub struct ReplyDispatcher {
    outbound: Arc<OutboundForwarder>,
    tracker: TaskTracker,
    tails: Arc<Mutex<HashMap<String, Tail>>>,
    next_ticket: AtomicU64,
}

impl ReplyDispatcher {
    pub fn new(outbound: Arc<OutboundForwarder>) -> Self {
        Self {
            outbound,
            tracker: TaskTracker::new(),
            tails: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Queues suggested replies for delivery; other events are handed to
    /// the forwarder inline since they never touch a session.
    pub async fn dispatch(&self, event: CallbackEvent) {
        match event {
            CallbackEvent::SuggestedReply(reply) => self.enqueue(reply),
            other => {
                self.outbound.handle_event(other).await;
            }
        }
    }

    /// Starts delivering `reply` once every earlier reply for the same user
    /// has finished.
    pub fn enqueue(&self, reply: SuggestedReply) {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = oneshot::channel();

        let previous = self
            .tails
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                reply.user.clone(),
                Tail {
                    ticket,
                    done: done_rx,
                },
            );

        let outbound = self.outbound.clone();
        let tails = self.tails.clone();
        self.tracker.spawn(async move {
            if let Some(previous) = previous {
                debug!(user = %reply.user, ticket, "waiting for earlier reply to the same user");
                // A dropped sender means the earlier task is gone; go ahead.
                let _ = previous.done.await;
            }

            outbound.deliver_reply(&reply).await;
            let _ = done_tx.send(());

            let mut tails = tails.lock().unwrap_or_else(PoisonError::into_inner);
            if tails.get(&reply.user).is_some_and(|tail| tail.ticket == ticket) {
                tails.remove(&reply.user);
            }
        });
    }

    /// Deliveries queued or running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stops accepting work and waits for queued deliveries to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            info!(pending, "waiting for in-flight reply deliveries");
        }
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use smsrcs_smpp::encoding::decode_text;
    use smsrcs_smpp::{BindMode, Body, CommandStatus, Pdu, SessionLink, SessionRegistry};
    use tokio::sync::mpsc;

    use super::*;

    fn dispatcher() -> (ReplyDispatcher, Arc<SessionLink>, mpsc::Receiver<Pdu>) {
        let registry = Arc::new(SessionRegistry::new());
        let handle = registry.next_handle();
        let (link, rx) = SessionLink::new(8);
        let link = Arc::new(link);
        registry.register(handle, link.clone(), None).unwrap();
        registry
            .mark_bound(handle, "esme", BindMode::Transceiver)
            .unwrap();
        let outbound = Arc::new(OutboundForwarder::new(
            registry,
            "447900550999",
            Duration::from_secs(2),
        ));
        (ReplyDispatcher::new(outbound), link, rx)
    }

    fn reply(user: &str, text: &str) -> SuggestedReply {
        SuggestedReply {
            user: user.into(),
            display_text: text.into(),
            postback: None,
        }
    }

    async fn next_deliver(rx: &mut mpsc::Receiver<Pdu>) -> (Pdu, String, String) {
        let pdu = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("deliver_sm within timeout")
            .expect("link open");
        let (user, text) = match &pdu.body {
            Body::DeliverSm(sm) => (
                sm.destination_addr.clone(),
                decode_text(sm.data_coding, sm.payload()),
            ),
            other => panic!("expected deliver_sm, got {other:?}"),
        };
        (pdu, user, text)
    }

    #[tokio::test]
    async fn same_user_replies_keep_arrival_order() {
        let (dispatcher, link, mut rx) = dispatcher();
        dispatcher.enqueue(reply("44123456789", "YES"));
        dispatcher.enqueue(reply("44123456789", "NO"));

        let (first, _, text) = next_deliver(&mut rx).await;
        assert_eq!(text, "YES");

        // The second reply waits until the first is acknowledged.
        let early = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
        assert!(early.is_err(), "second reply overtook the first");

        link.complete(Pdu::deliver_sm_resp(first.sequence_number, CommandStatus::OK));
        let (second, _, text) = next_deliver(&mut rx).await;
        assert_eq!(text, "NO");
        link.complete(Pdu::deliver_sm_resp(second.sequence_number, CommandStatus::OK));

        dispatcher.shutdown().await;
        assert!(dispatcher.tails.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn different_users_do_not_wait_on_each_other() {
        let (dispatcher, link, mut rx) = dispatcher();
        dispatcher.enqueue(reply("44111111111", "YES"));
        dispatcher.enqueue(reply("44222222222", "NO"));

        let (a, user_a, _) = next_deliver(&mut rx).await;
        let (b, user_b, _) = next_deliver(&mut rx).await;
        let mut users = [user_a, user_b];
        users.sort();
        assert_eq!(users, ["44111111111", "44222222222"]);

        link.complete(Pdu::deliver_sm_resp(a.sequence_number, CommandStatus::OK));
        link.complete(Pdu::deliver_sm_resp(b.sequence_number, CommandStatus::OK));
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_waits_for_in_flight_delivery() {
        let (dispatcher, link, mut rx) = dispatcher();
        dispatcher.enqueue(reply("44123456789", "CHANGE"));
        assert_eq!(dispatcher.in_flight(), 1);

        let peer = tokio::spawn(async move {
            let (pdu, _, text) = next_deliver(&mut rx).await;
            tokio::time::sleep(Duration::from_millis(100)).await;
            link.complete(Pdu::deliver_sm_resp(pdu.sequence_number, CommandStatus::OK));
            text
        });

        dispatcher.shutdown().await;
        assert_eq!(dispatcher.in_flight(), 0);
        assert_eq!(peer.await.unwrap(), "CHANGE");
    }
}
