// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMPP TCP listener and per-connection state machine.
//!
//! Each accepted connection gets a reader loop (this module) and a writer
//! task that drains the connection's [`SessionLink`] queue. Every
//! `submit_sm` is handed to the [`SubmitSmHandler`] in its own task, so
//! responses may go out in a different order than requests arrived.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use smsrcs_config::model::SmppConfig;
use smsrcs_core::{BridgeError, InboundUnit, SessionHandle};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::codec::{Frame, SmppCodec};
use crate::error::PduError;
use crate::pdu::{Bind, Body, CommandId, CommandStatus, Pdu, ShortMessage};
use crate::registry::SessionRegistry;
use crate::session::{BindMode, Session, SessionLink};

/// Receives `submit_sm` units from bound sessions.
#[async_trait]
pub trait SubmitSmHandler: Send + Sync + 'static {
    /// Produces the `submit_sm_resp` for `unit`.
    ///
    /// The returned PDU must echo `unit.sequence_number`; the server writes
    /// it to the originating session.
    async fn on_submit(&self, session: Session, unit: InboundUnit) -> Pdu;
}

/// State shared by every connection of one listener.
struct Shared {
    config: SmppConfig,
    registry: Arc<SessionRegistry>,
    handler: Arc<dyn SubmitSmHandler>,
}

/// Bound SMPP listener.
pub struct SmppServer {
    listener: TcpListener,
    shared: Arc<Shared>,
}

impl SmppServer {
    /// Binds the listener on `config.host:config.port`.
    pub async fn bind(
        config: SmppConfig,
        registry: Arc<SessionRegistry>,
        handler: Arc<dyn SubmitSmHandler>,
    ) -> Result<Self, BridgeError> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| BridgeError::Transport {
            message: format!("failed to bind SMPP listener to {addr}"),
            source: Some(Box::new(e)),
        })?;
        Ok(Self {
            listener,
            shared: Arc::new(Shared {
                config,
                registry,
                handler,
            }),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
        self.listener.local_addr().map_err(|e| BridgeError::Transport {
            message: "SMPP listener has no local address".to_string(),
            source: Some(Box::new(e)),
        })
    }

    /// Accepts connections until `cancel` fires.
    ///
    /// Open connections are closed when the token is cancelled.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), BridgeError> {
        let addr = self.local_addr()?;
        info!(%addr, "SMPP listener started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let shared = self.shared.clone();
                        let cancel = cancel.child_token();
                        tokio::spawn(async move {
                            serve_connection(shared, stream, peer, cancel).await;
                        });
                    }
                    Err(e) => warn!(error = %e, "failed to accept SMPP connection"),
                },
            }
        }

        info!(%addr, "SMPP listener stopped");
        Ok(())
    }
}

/// What the reader loop does after a PDU.
enum Flow {
    Continue,
    Close,
}

struct Connection {
    shared: Arc<Shared>,
    handle: SessionHandle,
    link: Arc<SessionLink>,
    mode: Option<BindMode>,
}

async fn serve_connection(
    shared: Arc<Shared>,
    stream: TcpStream,
    peer: SocketAddr,
    cancel: CancellationToken,
) {
    let handle = shared.registry.next_handle();
    let (link, outbound_rx) = SessionLink::new(shared.config.outbound_queue);
    let link = Arc::new(link);

    if let Err(e) = shared.registry.register(handle, link.clone(), Some(peer)) {
        error!(session = %handle, error = %e, "failed to register session");
        return;
    }
    info!(session = %handle, %peer, "SMPP session connected");

    let (read_half, write_half) = stream.into_split();
    let mut frames = FramedRead::new(read_half, SmppCodec::new(shared.config.max_pdu_len));
    let sink = FramedWrite::new(write_half, SmppCodec::new(shared.config.max_pdu_len));

    let closing = CancellationToken::new();
    let writer = tokio::spawn(write_loop(handle, sink, outbound_rx, closing.clone()));

    let mut conn = Connection {
        shared: shared.clone(),
        handle,
        link: link.clone(),
        mode: None,
    };

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            _ = closing.cancelled() => break,
            frame = frames.next() => frame,
        };

        match frame {
            None => {
                debug!(session = %handle, "peer closed the connection");
                break;
            }
            Some(Err(e)) => {
                warn!(session = %handle, error = %e, "SMPP framing error, closing session");
                break;
            }
            Some(Ok(Frame::Rejected(err))) => conn.reject(err).await,
            Some(Ok(Frame::Pdu(pdu))) => {
                if let Flow::Close = conn.dispatch(pdu).await {
                    break;
                }
            }
        }
    }

    closing.cancel();
    link.fail_pending();
    shared.registry.unregister(handle);
    if let Err(e) = writer.await {
        warn!(session = %handle, error = %e, "SMPP writer task failed");
    }
    info!(session = %handle, "SMPP session closed");
}

/// Drains queued PDUs onto the socket until `closing` fires.
///
/// PDUs already queued when `closing` fires are still written, so an
/// `unbind_resp` goes out before the socket closes.
async fn write_loop(
    handle: SessionHandle,
    mut sink: FramedWrite<tokio::net::tcp::OwnedWriteHalf, SmppCodec>,
    mut outbound: mpsc::Receiver<Pdu>,
    closing: CancellationToken,
) {
    loop {
        let pdu = tokio::select! {
            biased;
            pdu = outbound.recv() => match pdu {
                Some(pdu) => pdu,
                None => break,
            },
            _ = closing.cancelled() => break,
        };
        let command_id = pdu.command_id;
        let sequence = pdu.sequence_number;
        if let Err(e) = sink.send(pdu).await {
            warn!(session = %handle, %command_id, sequence, error = %e, "failed to write PDU");
            closing.cancel();
            break;
        }
    }
    outbound.close();
    let _ = sink.close().await;
}

impl Connection {
    async fn dispatch(&mut self, pdu: Pdu) -> Flow {
        let sequence = pdu.sequence_number;
        match pdu.command_id {
            CommandId::BindTransceiver | CommandId::BindTransmitter | CommandId::BindReceiver => {
                let command_id = pdu.command_id;
                if let Body::Bind(bind) = pdu.body {
                    self.bind(command_id, sequence, bind).await;
                }
                Flow::Continue
            }
            CommandId::SubmitSm => {
                if let Body::SubmitSm(sm) = pdu.body {
                    self.submit(sequence, sm).await;
                }
                Flow::Continue
            }
            CommandId::EnquireLink => {
                self.respond(Pdu::enquire_link_resp(sequence)).await;
                Flow::Continue
            }
            CommandId::Unbind => {
                self.respond(Pdu::unbind_resp(sequence)).await;
                info!(session = %self.handle, "peer requested unbind");
                Flow::Close
            }
            CommandId::DeliverSm => {
                self.respond(Pdu::generic_nack(sequence, CommandStatus::INVALID_CMD_ID))
                    .await;
                Flow::Continue
            }
            id if id.is_response() => {
                if !self.link.complete(pdu) {
                    debug!(session = %self.handle, command_id = %id, sequence, "unsolicited response ignored");
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    async fn bind(&mut self, command_id: CommandId, sequence: u32, bind: Bind) {
        let status = self.check_bind(command_id, &bind);
        let system_id = self.shared.config.system_id.clone();
        if let Some(resp) = Pdu::bind_resp(command_id, sequence, status, &system_id) {
            self.respond(resp).await;
        }
    }

    fn check_bind(&mut self, command_id: CommandId, bind: &Bind) -> CommandStatus {
        if self.mode.is_some() {
            return CommandStatus::ALREADY_BOUND;
        }
        let Some(mode) = BindMode::from_command(command_id) else {
            return CommandStatus::BIND_FAILED;
        };

        let config = &self.shared.config;
        if let Some(expected) = config.bind_system_id.as_deref() {
            if expected != bind.system_id {
                warn!(session = %self.handle, system_id = %bind.system_id, "bind rejected: unknown system_id");
                return CommandStatus::INVALID_SYSTEM_ID;
            }
        }
        if let Some(expected) = config.bind_password.as_deref() {
            if expected != bind.password {
                warn!(session = %self.handle, system_id = %bind.system_id, "bind rejected: wrong password");
                return CommandStatus::INVALID_PASSWORD;
            }
        }

        match self.shared.registry.mark_bound(self.handle, &bind.system_id, mode) {
            Ok(_) => {
                self.mode = Some(mode);
                info!(session = %self.handle, system_id = %bind.system_id, %mode, "SMPP session bound");
                CommandStatus::OK
            }
            Err(e) => {
                warn!(session = %self.handle, error = %e, "bind failed");
                CommandStatus::BIND_FAILED
            }
        }
    }

    async fn submit(&self, sequence: u32, sm: ShortMessage) {
        let can_submit = self.mode.is_some_and(BindMode::can_submit);
        let session = match self.shared.registry.get(self.handle) {
            Some(session) if can_submit => session,
            _ => {
                debug!(session = %self.handle, sequence, "submit_sm outside a transmit-capable bind");
                self.respond(Pdu::submit_sm_resp(sequence, CommandStatus::INVALID_BIND_STATUS, ""))
                    .await;
                return;
            }
        };

        let body = sm.payload().to_vec();
        let unit = InboundUnit {
            source_addr: sm.source_addr,
            destination_addr: sm.destination_addr,
            body,
            data_coding: sm.data_coding,
            sequence_number: sequence,
        };

        let handler = self.shared.handler.clone();
        let link = self.link.clone();
        let handle = self.handle;
        tokio::spawn(async move {
            let resp = handler.on_submit(session, unit).await;
            let status = resp.command_status;
            if let Err(e) = link.send(resp).await {
                error!(session = %handle, sequence, %status, error = %e, "submit_sm_resp not delivered");
            }
        });
    }

    async fn reject(&self, err: PduError) {
        let (sequence, status) = match &err {
            PduError::UnknownCommand {
                sequence_number, ..
            } => (*sequence_number, CommandStatus::INVALID_CMD_ID),
            PduError::InvalidBody {
                sequence_number, ..
            } => (*sequence_number, CommandStatus::INVALID_CMD_LEN),
            _ => return,
        };
        warn!(session = %self.handle, error = %err, "rejecting PDU with generic_nack");
        self.respond(Pdu::generic_nack(sequence, status)).await;
    }

    async fn respond(&self, pdu: Pdu) {
        let command_id = pdu.command_id;
        if let Err(e) = self.link.send(pdu).await {
            warn!(session = %self.handle, %command_id, error = %e, "response not written");
        }
    }
}
