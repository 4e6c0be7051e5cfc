// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The two forwarding paths of the bridge.
//!
//! [`InboundForwarder`] turns SMPP `submit_sm` into rich messages and
//! answers the peer; [`OutboundForwarder`] turns suggested-reply callbacks
//! into `deliver_sm` on every bound session.

pub mod inbound;
pub mod outbound;

pub use inbound::{InboundForwarder, build_rich_request, derive_quick_replies};
pub use outbound::{DeliveryReport, OutboundForwarder};
