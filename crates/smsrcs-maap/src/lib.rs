// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MaaP (RCS Business Messaging) side of the smsrcs bridge.
//!
//! - [`CredentialManager`]: OAuth2 client-credentials token, cached and
//!   refreshed ahead of expiry.
//! - [`MaapClient`]: the [`RichMessagingClient`](smsrcs_core::RichMessagingClient)
//!   implementation that sends bot messages with quick-reply chips.
//! - [`classify`]: turns webhook callback bodies into
//!   [`CallbackEvent`](smsrcs_core::CallbackEvent)s.

pub mod client;
pub mod oauth;
pub mod types;
pub mod webhook;

pub use client::{MaapClient, http_client};
pub use oauth::{Credential, CredentialManager};
pub use webhook::classify;
