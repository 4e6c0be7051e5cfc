// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMPP v3.4 side of the smsrcs bridge.
//!
//! Provides the PDU model and framing codec, the registry of live sessions,
//! and the TCP listener that runs the per-connection bind/submit/unbind
//! state machine.

pub mod codec;
pub mod encoding;
pub mod error;
pub mod pdu;
pub mod registry;
pub mod server;
pub mod session;

pub use codec::{Frame, SmppCodec};
pub use error::PduError;
pub use pdu::{Bind, Body, CommandId, CommandStatus, Pdu, ShortMessage};
pub use registry::SessionRegistry;
pub use server::{SmppServer, SubmitSmHandler};
pub use session::{BindMode, Session, SessionLink, SessionState};
