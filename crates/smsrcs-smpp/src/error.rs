// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Framing and decoding errors.

use smsrcs_core::BridgeError;
use thiserror::Error;

use crate::pdu::CommandId;

/// Errors raised while reading PDUs off the wire.
///
/// `UnknownCommand` and `InvalidBody` are recoverable: the frame was fully
/// consumed and the peer can be answered with `generic_nack`. The framing
/// variants leave the stream in an unknown position and close the connection.
#[derive(Debug, Error)]
pub enum PduError {
    #[error("command_length {0} is smaller than the 16-byte header")]
    LengthTooSmall(u32),

    #[error("command_length {length} exceeds the {max}-byte limit")]
    LengthTooLarge { length: u32, max: usize },

    #[error("truncated {0}")]
    Truncated(&'static str),

    #[error("unsupported command_id 0x{command_id:08X} (seq {sequence_number})")]
    UnknownCommand {
        command_id: u32,
        sequence_number: u32,
    },

    #[error("invalid {command_id} body (seq {sequence_number}): {reason}")]
    InvalidBody {
        command_id: CommandId,
        sequence_number: u32,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PduError {
    /// True when the connection can continue after answering the peer.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PduError::UnknownCommand { .. } | PduError::InvalidBody { .. }
        )
    }
}

impl From<PduError> for BridgeError {
    fn from(err: PduError) -> Self {
        match err {
            PduError::Io(source) => BridgeError::Transport {
                message: "SMPP socket I/O failed".to_string(),
                source: Some(Box::new(source)),
            },
            other => BridgeError::Protocol(other.to_string()),
        }
    }
}
