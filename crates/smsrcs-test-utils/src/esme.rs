// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A minimal SMPP client (ESME) for driving the bridge in tests.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use smsrcs_core::BridgeError;
use smsrcs_smpp::encoding::decode_text;
use smsrcs_smpp::{Bind, Body, CommandId, CommandStatus, Frame, Pdu, ShortMessage, SmppCodec};

/// How long `recv` waits before failing the test.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// An SMPP peer connected to the bridge over TCP.
pub struct TestEsme {
    framed: Framed<TcpStream, SmppCodec>,
    next_sequence: u32,
}

impl TestEsme {
    pub async fn connect(addr: SocketAddr) -> Result<Self, BridgeError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| BridgeError::Transport {
                message: format!("failed to connect to {addr}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            framed: Framed::new(stream, SmppCodec::default()),
            next_sequence: 1,
        })
    }

    fn sequence(&mut self) -> u32 {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }

    pub async fn send(&mut self, pdu: Pdu) -> Result<(), BridgeError> {
        self.framed.send(pdu).await.map_err(BridgeError::from)
    }

    /// Next PDU from the bridge, failing after a few seconds of silence.
    pub async fn recv(&mut self) -> Result<Pdu, BridgeError> {
        let next = tokio::time::timeout(RECV_TIMEOUT, self.framed.next())
            .await
            .map_err(|_| BridgeError::Timeout {
                duration: RECV_TIMEOUT,
            })?;
        match next {
            Some(Ok(Frame::Pdu(pdu))) => Ok(pdu),
            Some(Ok(Frame::Rejected(err))) => Err(err.into()),
            Some(Err(err)) => Err(err.into()),
            None => Err(BridgeError::transport("bridge closed the connection")),
        }
    }

    /// True if the bridge closes the connection within the receive timeout.
    pub async fn closed_by_peer(&mut self) -> bool {
        matches!(
            tokio::time::timeout(RECV_TIMEOUT, self.framed.next()).await,
            Ok(None)
        )
    }

    /// Binds as a transceiver and returns the bind response.
    pub async fn bind_transceiver(
        &mut self,
        system_id: &str,
        password: &str,
    ) -> Result<Pdu, BridgeError> {
        let seq = self.sequence();
        self.send(Pdu::bind_transceiver(seq, bind(system_id, password)))
            .await?;
        self.recv().await
    }

    /// Binds as a receiver and returns the bind response.
    pub async fn bind_receiver(&mut self, system_id: &str, password: &str) -> Result<Pdu, BridgeError> {
        let seq = self.sequence();
        self.send(Pdu::bind_receiver(seq, bind(system_id, password)))
            .await?;
        self.recv().await
    }

    /// Sends a `submit_sm` and returns its sequence number without waiting.
    pub async fn submit(&mut self, source: &str, destination: &str, text: &str) -> Result<u32, BridgeError> {
        let seq = self.sequence();
        let sm = ShortMessage {
            source_addr: source.to_string(),
            destination_addr: destination.to_string(),
            short_message: text.as_bytes().to_vec(),
            ..ShortMessage::default()
        };
        self.send(Pdu::submit_sm(seq, sm)).await?;
        Ok(seq)
    }

    /// Waits for the next `deliver_sm`, acknowledges it with `status`, and
    /// returns its body.
    pub async fn expect_deliver(&mut self, status: CommandStatus) -> Result<ShortMessage, BridgeError> {
        loop {
            let pdu = self.recv().await?;
            if pdu.command_id != CommandId::DeliverSm {
                continue;
            }
            self.send(Pdu::deliver_sm_resp(pdu.sequence_number, status))
                .await?;
            return match pdu.body {
                Body::DeliverSm(sm) => Ok(sm),
                _ => Err(BridgeError::Protocol("deliver_sm without body".to_string())),
            };
        }
    }

    /// Sends `unbind` and returns the response.
    pub async fn unbind(&mut self) -> Result<Pdu, BridgeError> {
        let seq = self.sequence();
        self.send(Pdu::unbind(seq)).await?;
        self.recv().await
    }
}

fn bind(system_id: &str, password: &str) -> Bind {
    Bind {
        system_id: system_id.to_string(),
        password: password.to_string(),
        system_type: String::new(),
        interface_version: smsrcs_smpp::pdu::INTERFACE_VERSION,
        addr_ton: 0,
        addr_npi: 0,
        address_range: String::new(),
    }
}

/// Decoded text of a delivered short message.
pub fn deliver_text(sm: &ShortMessage) -> String {
    decode_text(sm.data_coding, sm.payload())
}
