// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared between the SMPP side and the rich-messaging side.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Marker the rich-messaging channel puts in front of an international number.
pub const RICH_ADDRESS_PREFIX: char = '+';

/// Opaque handle for one binary-transport connection.
///
/// Handles are allocated from a monotonically increasing counter and are never
/// reused, so a reconnecting peer always gets a fresh handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub u64);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Provider-assigned identifier of a sent rich message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts an SMPP address into the rich channel's addressing convention.
///
/// `447700900123` becomes `+447700900123`. An address that already carries the
/// marker is returned unchanged.
pub fn to_rich_address(sms_address: &str) -> String {
    if sms_address.starts_with(RICH_ADDRESS_PREFIX) {
        sms_address.to_string()
    } else {
        format!("{RICH_ADDRESS_PREFIX}{sms_address}")
    }
}

/// Converts a rich-channel user identity into an SMPP address by stripping
/// one leading `+`.
pub fn to_sms_address(rich_address: &str) -> String {
    rich_address
        .strip_prefix(RICH_ADDRESS_PREFIX)
        .unwrap_or(rich_address)
        .to_string()
}

/// One decoded `submit_sm` from a bound session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundUnit {
    pub source_addr: String,
    pub destination_addr: String,
    /// Raw short message octets.
    pub body: Vec<u8>,
    /// SMPP `data_coding` describing how `body` is encoded.
    pub data_coding: u8,
    /// Sequence number that the response must echo.
    pub sequence_number: u32,
}

/// A quick-reply option offered to the rich-messaging user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReply {
    /// Label shown on the chip.
    pub label: String,
    /// Opaque token echoed back in the `suggested-reply` callback.
    pub postback: String,
    /// When set, the chip opens this URL instead of sending a plain reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl QuickReply {
    /// A plain reply chip.
    pub fn reply(label: impl Into<String>, postback: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            postback: postback.into(),
            url: None,
        }
    }

    /// A chip that opens a URL.
    pub fn url_action(
        label: impl Into<String>,
        postback: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            postback: postback.into(),
            url: Some(url.into()),
        }
    }
}

/// A message to send over the rich-messaging channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRichRequest {
    /// Destination identity in rich-channel format (`+44…`).
    pub destination: String,
    pub text: String,
    /// Ordered quick-reply chips; empty means none.
    pub quick_replies: Vec<QuickReply>,
}

/// Kind of a provider callback, used for logging and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum CallbackKind {
    NewUser,
    InboundText,
    SuggestedReply,
    Ignored,
}

/// A user's selection of a quick-reply chip, already normalized for SMPP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedReply {
    /// User address with the leading `+` stripped.
    pub user: String,
    /// Human-readable text of the chosen chip.
    pub display_text: String,
    /// Postback token that produced the reply.
    pub postback: Option<String>,
}

/// A classified provider webhook callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEvent {
    /// A user opened a conversation with the bot.
    NewUser { user: String },
    /// Free text typed by the user.
    InboundText { user: String, text: String },
    /// A quick-reply chip was tapped.
    SuggestedReply(SuggestedReply),
    /// Anything else (status reports, typing indicators, unknown events).
    Ignored { event: Option<String> },
}

impl CallbackEvent {
    /// Returns the kind discriminator of this event.
    pub fn kind(&self) -> CallbackKind {
        match self {
            CallbackEvent::NewUser { .. } => CallbackKind::NewUser,
            CallbackEvent::InboundText { .. } => CallbackKind::InboundText,
            CallbackEvent::SuggestedReply(_) => CallbackKind::SuggestedReply,
            CallbackEvent::Ignored { .. } => CallbackKind::Ignored,
        }
    }
}
