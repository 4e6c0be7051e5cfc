// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-level wiring for the smsrcs bridge: startup, tracing and shutdown.

pub mod serve;
pub mod shutdown;

pub use serve::{Bridge, run_serve};
