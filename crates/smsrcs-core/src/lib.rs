// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the smsrcs SMS/RCS bridge.
//!
//! This crate holds the error type, the domain types that cross the bridge
//! (inbound units, rich requests, quick replies, callback events) and the
//! trait seam to the rich-messaging provider.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BridgeError;
pub use traits::RichMessagingClient;
pub use types::{
    CallbackEvent, CallbackKind, InboundUnit, MessageId, OutboundRichRequest, QuickReply,
    SessionHandle, SuggestedReply, to_rich_address, to_sms_address,
};
