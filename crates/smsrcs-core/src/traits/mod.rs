// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the bridge and its external collaborators.
//!
//! Traits use `#[async_trait]` so they can be held as `Arc<dyn …>`.

pub mod rich;

pub use rich::RichMessagingClient;
