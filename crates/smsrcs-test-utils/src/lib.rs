// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for smsrcs integration tests.
//!
//! - [`MockRichClient`] - scripted rich-messaging client that records requests
//! - [`TestEsme`] - SMPP client speaking to the bridge over real TCP

pub mod esme;
pub mod mock_rich;

pub use esme::{TestEsme, deliver_text};
pub use mock_rich::MockRichClient;
