// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP webhook receiver for the smsrcs bridge.
//!
//! MaaP posts callbacks to `POST /`; suggested replies are fanned out to
//! bound SMPP sessions in per-user arrival order.

pub mod dispatch;
pub mod handlers;
pub mod server;

pub use dispatch::ReplyDispatcher;
pub use server::{WebhookServer, WebhookState, router};
