// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMPP `submit_sm` to rich message.

use std::sync::Arc;

use async_trait::async_trait;
use smsrcs_core::{
    InboundUnit, OutboundRichRequest, QuickReply, RichMessagingClient, to_rich_address,
};
use smsrcs_smpp::encoding::decode_text;
use smsrcs_smpp::{CommandStatus, Pdu, Session, SubmitSmHandler};
use tracing::{error, info, warn};

/// Longest `message_id` an SMPP 3.4 `submit_sm_resp` carries (NUL excluded).
const MAX_MESSAGE_ID_LEN: usize = 64;

/// Sentinel phrase, chip label and postback token, in rendering order.
const QUICK_REPLY_SENTINELS: [(&str, &str, &str); 3] = [
    ("reply YES", "YES", "Choice_YES"),
    ("reply NO", "NO", "Choice_NO"),
    ("reply CHANGE", "CHANGE", "Choice_CHANGE"),
];

/// Quick-reply chips offered for `text`: one per sentinel phrase it contains.
pub fn derive_quick_replies(text: &str) -> Vec<QuickReply> {
    QUICK_REPLY_SENTINELS
        .iter()
        .filter(|(sentinel, _, _)| text.contains(sentinel))
        .map(|(_, label, postback)| QuickReply::reply(*label, *postback))
        .collect()
}

/// Builds the rich request for one inbound short message.
pub fn build_rich_request(unit: &InboundUnit) -> OutboundRichRequest {
    let text = decode_text(unit.data_coding, &unit.body);
    OutboundRichRequest {
        destination: to_rich_address(&unit.destination_addr),
        quick_replies: derive_quick_replies(&text),
        text,
    }
}

/// Forwards `submit_sm` units to the rich-messaging provider and answers
/// each with exactly one `submit_sm_resp`.
pub struct InboundForwarder {
    client: Arc<dyn RichMessagingClient>,
}

impl InboundForwarder {
    pub fn new(client: Arc<dyn RichMessagingClient>) -> Self {
        Self { client }
    }

    /// Sends `unit` as a rich message and returns the response PDU.
    ///
    /// Success carries the provider message id; any failure is
    /// `ESME_RSYSERR`. Nothing is retried here.
    pub async fn forward(&self, session: &Session, unit: &InboundUnit) -> Pdu {
        let sequence = unit.sequence_number;
        let request = build_rich_request(unit);

        match self.client.send_message(&request).await {
            Ok(msg_id) => {
                info!(
                    session = %session.handle,
                    seq = sequence,
                    user = %request.destination,
                    %msg_id,
                    chips = request.quick_replies.len(),
                    "submit_sm forwarded to MaaP"
                );
                Pdu::submit_sm_resp(sequence, CommandStatus::OK, clamp_message_id(&msg_id.0))
            }
            Err(e) => {
                error!(
                    session = %session.handle,
                    seq = sequence,
                    user = %request.destination,
                    text = %excerpt(&request.text),
                    error = %e,
                    "failed to forward submit_sm"
                );
                Pdu::submit_sm_resp(sequence, CommandStatus::SYSTEM_ERROR, "")
            }
        }
    }
}

#[async_trait]
impl SubmitSmHandler for InboundForwarder {
    async fn on_submit(&self, session: Session, unit: InboundUnit) -> Pdu {
        self.forward(&session, &unit).await
    }
}

fn clamp_message_id(id: &str) -> &str {
    if id.len() <= MAX_MESSAGE_ID_LEN {
        return id;
    }
    let mut end = MAX_MESSAGE_ID_LEN;
    while !id.is_char_boundary(end) {
        end -= 1;
    }
    warn!(msg_id = id, "provider message id truncated for submit_sm_resp");
    &id[..end]
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(80) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn labels(replies: &[QuickReply]) -> Vec<(&str, &str)> {
        replies
            .iter()
            .map(|r| (r.label.as_str(), r.postback.as_str()))
            .collect()
    }

    #[test]
    fn yes_and_no_in_fixed_order() {
        let replies = derive_quick_replies("Hello reply NO or reply YES");
        assert_eq!(labels(&replies), [("YES", "Choice_YES"), ("NO", "Choice_NO")]);
    }

    #[test]
    fn all_three_sentinels() {
        let replies = derive_quick_replies("reply CHANGE to move, reply YES to keep, reply NO to cancel");
        assert_eq!(
            labels(&replies),
            [
                ("YES", "Choice_YES"),
                ("NO", "Choice_NO"),
                ("CHANGE", "Choice_CHANGE")
            ]
        );
    }

    #[test]
    fn sentinels_are_case_sensitive() {
        assert!(derive_quick_replies("Reply yes please").is_empty());
        assert!(derive_quick_replies("plain text").is_empty());
    }

    #[test]
    fn rich_request_prefixes_destination() {
        let unit = InboundUnit {
            source_addr: "15550100".into(),
            destination_addr: "19005550100".into(),
            body: b"Hello reply YES".to_vec(),
            data_coding: 0,
            sequence_number: 1,
        };
        let request = build_rich_request(&unit);
        assert_eq!(request.destination, "+19005550100");
        assert_eq!(request.text, "Hello reply YES");
        assert_eq!(request.quick_replies.len(), 1);
    }

    #[test]
    fn ucs2_body_is_decoded() {
        let body: Vec<u8> = "Grüße reply NO"
            .encode_utf16()
            .flat_map(u16::to_be_bytes)
            .collect();
        let unit = InboundUnit {
            source_addr: "1".into(),
            destination_addr: "+2".into(),
            body,
            data_coding: 0x08,
            sequence_number: 1,
        };
        let request = build_rich_request(&unit);
        assert_eq!(request.text, "Grüße reply NO");
        assert_eq!(request.destination, "+2");
        assert_eq!(labels(&request.quick_replies), [("NO", "Choice_NO")]);
    }

    #[test]
    fn long_message_ids_are_clamped_on_char_boundary() {
        let id = "é".repeat(40);
        let clamped = clamp_message_id(&id);
        assert!(clamped.len() <= MAX_MESSAGE_ID_LEN);
        assert_eq!(clamped.chars().count(), 32);
        assert_eq!(clamp_message_id("m-123"), "m-123");
    }

    proptest! {
        #[test]
        fn quick_replies_are_deterministic_and_ordered(text in ".{0,40}(reply (YES|NO|CHANGE))?.{0,40}(reply (YES|NO|CHANGE))?") {
            let first = derive_quick_replies(&text);
            let second = derive_quick_replies(&text);
            prop_assert_eq!(&first, &second);

            let order = ["YES", "NO", "CHANGE"];
            let positions: Vec<usize> = first
                .iter()
                .map(|r| order.iter().position(|l| *l == r.label).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));

            for (sentinel, label, _) in QUICK_REPLY_SENTINELS {
                prop_assert_eq!(text.contains(sentinel), first.iter().any(|r| r.label == label));
            }
        }
    }
}
