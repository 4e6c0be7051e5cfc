// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMPP v3.4 protocol data units.
//!
//! Only the operations the bridge speaks are modelled: the three bind
//! flavours, `submit_sm`, `deliver_sm`, `unbind`, `enquire_link` and
//! `generic_nack`, together with their responses.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::PduError;

/// Size of the fixed SMPP header.
pub const HEADER_LEN: usize = 16;

/// Interface version the bridge reports (SMPP 3.4).
pub const INTERFACE_VERSION: u8 = 0x34;

/// TLV tag carrying a message body longer than `short_message` allows.
pub const TAG_MESSAGE_PAYLOAD: u16 = 0x0424;

/// Largest body that fits the `short_message` field.
pub const MAX_SHORT_MESSAGE_LEN: usize = 254;

const RESPONSE_BIT: u32 = 0x8000_0000;

/// SMPP operation identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CommandId {
    GenericNack,
    BindReceiver,
    BindReceiverResp,
    BindTransmitter,
    BindTransmitterResp,
    SubmitSm,
    SubmitSmResp,
    DeliverSm,
    DeliverSmResp,
    Unbind,
    UnbindResp,
    BindTransceiver,
    BindTransceiverResp,
    EnquireLink,
    EnquireLinkResp,
}

impl CommandId {
    /// Wire value of this command.
    pub fn code(self) -> u32 {
        match self {
            CommandId::GenericNack => 0x8000_0000,
            CommandId::BindReceiver => 0x0000_0001,
            CommandId::BindReceiverResp => 0x8000_0001,
            CommandId::BindTransmitter => 0x0000_0002,
            CommandId::BindTransmitterResp => 0x8000_0002,
            CommandId::SubmitSm => 0x0000_0004,
            CommandId::SubmitSmResp => 0x8000_0004,
            CommandId::DeliverSm => 0x0000_0005,
            CommandId::DeliverSmResp => 0x8000_0005,
            CommandId::Unbind => 0x0000_0006,
            CommandId::UnbindResp => 0x8000_0006,
            CommandId::BindTransceiver => 0x0000_0009,
            CommandId::BindTransceiverResp => 0x8000_0009,
            CommandId::EnquireLink => 0x0000_0015,
            CommandId::EnquireLinkResp => 0x8000_0015,
        }
    }

    /// Parses a wire value, returning `None` for operations the bridge does not speak.
    pub fn from_code(code: u32) -> Option<Self> {
        let id = match code {
            0x8000_0000 => CommandId::GenericNack,
            0x0000_0001 => CommandId::BindReceiver,
            0x8000_0001 => CommandId::BindReceiverResp,
            0x0000_0002 => CommandId::BindTransmitter,
            0x8000_0002 => CommandId::BindTransmitterResp,
            0x0000_0004 => CommandId::SubmitSm,
            0x8000_0004 => CommandId::SubmitSmResp,
            0x0000_0005 => CommandId::DeliverSm,
            0x8000_0005 => CommandId::DeliverSmResp,
            0x0000_0006 => CommandId::Unbind,
            0x8000_0006 => CommandId::UnbindResp,
            0x0000_0009 => CommandId::BindTransceiver,
            0x8000_0009 => CommandId::BindTransceiverResp,
            0x0000_0015 => CommandId::EnquireLink,
            0x8000_0015 => CommandId::EnquireLinkResp,
            _ => return None,
        };
        Some(id)
    }

    /// True for `*_resp` operations and `generic_nack`.
    pub fn is_response(self) -> bool {
        self.code() & RESPONSE_BIT != 0
    }
}

/// SMPP `command_status` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandStatus(pub u32);

impl CommandStatus {
    pub const OK: Self = Self(0x0000_0000);
    pub const INVALID_MSG_LEN: Self = Self(0x0000_0001);
    pub const INVALID_CMD_LEN: Self = Self(0x0000_0002);
    pub const INVALID_CMD_ID: Self = Self(0x0000_0003);
    pub const INVALID_BIND_STATUS: Self = Self(0x0000_0004);
    pub const ALREADY_BOUND: Self = Self(0x0000_0005);
    pub const SYSTEM_ERROR: Self = Self(0x0000_0008);
    pub const BIND_FAILED: Self = Self(0x0000_000D);
    pub const INVALID_PASSWORD: Self = Self(0x0000_000E);
    pub const INVALID_SYSTEM_ID: Self = Self(0x0000_000F);

    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::OK => "ESME_ROK",
            Self::INVALID_MSG_LEN => "ESME_RINVMSGLEN",
            Self::INVALID_CMD_LEN => "ESME_RINVCMDLEN",
            Self::INVALID_CMD_ID => "ESME_RINVCMDID",
            Self::INVALID_BIND_STATUS => "ESME_RINVBNDSTS",
            Self::ALREADY_BOUND => "ESME_RALYBND",
            Self::SYSTEM_ERROR => "ESME_RSYSERR",
            Self::BIND_FAILED => "ESME_RBINDFAIL",
            Self::INVALID_PASSWORD => "ESME_RINVPASWD",
            Self::INVALID_SYSTEM_ID => "ESME_RINVSYSID",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

/// Body of any of the three bind requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bind {
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub interface_version: u8,
    pub addr_ton: u8,
    pub addr_npi: u8,
    pub address_range: String,
}

/// Body shared by `submit_sm` and `deliver_sm`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShortMessage {
    pub service_type: String,
    pub source_addr_ton: u8,
    pub source_addr_npi: u8,
    pub source_addr: String,
    pub dest_addr_ton: u8,
    pub dest_addr_npi: u8,
    pub destination_addr: String,
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: u8,
    pub sm_default_msg_id: u8,
    pub short_message: Vec<u8>,
    /// `message_payload` TLV, used instead of `short_message` for long bodies.
    pub message_payload: Option<Vec<u8>>,
}

impl ShortMessage {
    /// The message octets, wherever the peer put them.
    pub fn payload(&self) -> &[u8] {
        match &self.message_payload {
            Some(payload) if self.short_message.is_empty() => payload,
            _ => &self.short_message,
        }
    }

    /// Stores `body`, spilling into the `message_payload` TLV when it is too
    /// long for `short_message`.
    pub fn set_payload(&mut self, body: Vec<u8>) {
        if body.len() > MAX_SHORT_MESSAGE_LEN {
            self.short_message = Vec::new();
            self.message_payload = Some(body);
        } else {
            self.short_message = body;
            self.message_payload = None;
        }
    }
}

/// Operation-specific body of a PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// `unbind`, `unbind_resp`, `enquire_link`, `enquire_link_resp`, `generic_nack`,
    /// and error responses whose body is omitted.
    Empty,
    Bind(Bind),
    BindResp { system_id: String },
    SubmitSm(ShortMessage),
    DeliverSm(ShortMessage),
    /// Body of `submit_sm_resp` and `deliver_sm_resp`.
    MessageId(String),
}

/// One decoded SMPP PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub body: Body,
}

impl Pdu {
    fn new(command_id: CommandId, sequence_number: u32, body: Body) -> Self {
        Self {
            command_id,
            command_status: CommandStatus::OK,
            sequence_number,
            body,
        }
    }

    fn response(command_id: CommandId, status: CommandStatus, sequence_number: u32, body: Body) -> Self {
        Self {
            command_id,
            command_status: status,
            sequence_number,
            body,
        }
    }

    pub fn bind_transceiver(sequence_number: u32, bind: Bind) -> Self {
        Self::new(CommandId::BindTransceiver, sequence_number, Body::Bind(bind))
    }

    pub fn bind_transmitter(sequence_number: u32, bind: Bind) -> Self {
        Self::new(CommandId::BindTransmitter, sequence_number, Body::Bind(bind))
    }

    pub fn bind_receiver(sequence_number: u32, bind: Bind) -> Self {
        Self::new(CommandId::BindReceiver, sequence_number, Body::Bind(bind))
    }

    /// Response to a bind request of any flavour.
    ///
    /// Returns `None` if `request_id` is not a bind request.
    pub fn bind_resp(
        request_id: CommandId,
        sequence_number: u32,
        status: CommandStatus,
        system_id: &str,
    ) -> Option<Self> {
        let resp_id = match request_id {
            CommandId::BindTransceiver => CommandId::BindTransceiverResp,
            CommandId::BindTransmitter => CommandId::BindTransmitterResp,
            CommandId::BindReceiver => CommandId::BindReceiverResp,
            _ => return None,
        };
        let body = Body::BindResp {
            system_id: system_id.to_string(),
        };
        Some(Self::response(resp_id, status, sequence_number, body))
    }

    pub fn submit_sm(sequence_number: u32, sm: ShortMessage) -> Self {
        Self::new(CommandId::SubmitSm, sequence_number, Body::SubmitSm(sm))
    }

    /// `submit_sm_resp`; the message id is only carried on success.
    pub fn submit_sm_resp(sequence_number: u32, status: CommandStatus, message_id: &str) -> Self {
        let body = if status.is_ok() {
            Body::MessageId(message_id.to_string())
        } else {
            Body::Empty
        };
        Self::response(CommandId::SubmitSmResp, status, sequence_number, body)
    }

    pub fn deliver_sm(sequence_number: u32, sm: ShortMessage) -> Self {
        Self::new(CommandId::DeliverSm, sequence_number, Body::DeliverSm(sm))
    }

    pub fn deliver_sm_resp(sequence_number: u32, status: CommandStatus) -> Self {
        let body = Body::MessageId(String::new());
        Self::response(CommandId::DeliverSmResp, status, sequence_number, body)
    }

    pub fn unbind(sequence_number: u32) -> Self {
        Self::new(CommandId::Unbind, sequence_number, Body::Empty)
    }

    pub fn unbind_resp(sequence_number: u32) -> Self {
        Self::response(CommandId::UnbindResp, CommandStatus::OK, sequence_number, Body::Empty)
    }

    pub fn enquire_link(sequence_number: u32) -> Self {
        Self::new(CommandId::EnquireLink, sequence_number, Body::Empty)
    }

    pub fn enquire_link_resp(sequence_number: u32) -> Self {
        Self::response(
            CommandId::EnquireLinkResp,
            CommandStatus::OK,
            sequence_number,
            Body::Empty,
        )
    }

    pub fn generic_nack(sequence_number: u32, status: CommandStatus) -> Self {
        Self::response(CommandId::GenericNack, status, sequence_number, Body::Empty)
    }

    /// Message id carried by a `submit_sm_resp`/`deliver_sm_resp`, if any.
    pub fn message_id(&self) -> Option<&str> {
        match &self.body {
            Body::MessageId(id) => Some(id),
            _ => None,
        }
    }

    /// Serializes the PDU, header included, onto `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        let start = dst.len();
        dst.put_u32(0); // patched below
        dst.put_u32(self.command_id.code());
        dst.put_u32(self.command_status.0);
        dst.put_u32(self.sequence_number);

        match &self.body {
            Body::Empty => {}
            Body::Bind(bind) => {
                put_cstr(dst, &bind.system_id);
                put_cstr(dst, &bind.password);
                put_cstr(dst, &bind.system_type);
                dst.put_u8(bind.interface_version);
                dst.put_u8(bind.addr_ton);
                dst.put_u8(bind.addr_npi);
                put_cstr(dst, &bind.address_range);
            }
            Body::BindResp { system_id } => put_cstr(dst, system_id),
            Body::SubmitSm(sm) | Body::DeliverSm(sm) => encode_short_message(dst, sm),
            Body::MessageId(id) => put_cstr(dst, id),
        }

        let len = (dst.len() - start) as u32;
        dst[start..start + 4].copy_from_slice(&len.to_be_bytes());
    }

    /// Decodes one complete frame (header included).
    pub fn decode(mut frame: Bytes) -> Result<Self, PduError> {
        if frame.len() < HEADER_LEN {
            return Err(PduError::Truncated("header"));
        }
        let _command_length = frame.get_u32();
        let code = frame.get_u32();
        let command_status = CommandStatus(frame.get_u32());
        let sequence_number = frame.get_u32();

        let command_id = CommandId::from_code(code).ok_or(PduError::UnknownCommand {
            command_id: code,
            sequence_number,
        })?;

        let body = decode_body(command_id, command_status, &mut frame).map_err(|reason| {
            PduError::InvalidBody {
                command_id,
                sequence_number,
                reason,
            }
        })?;

        Ok(Self {
            command_id,
            command_status,
            sequence_number,
            body,
        })
    }
}

fn decode_body(
    command_id: CommandId,
    status: CommandStatus,
    buf: &mut Bytes,
) -> Result<Body, String> {
    let body = match command_id {
        CommandId::BindReceiver | CommandId::BindTransmitter | CommandId::BindTransceiver => {
            Body::Bind(Bind {
                system_id: get_cstr(buf, 16, "system_id")?,
                password: get_cstr(buf, 9, "password")?,
                system_type: get_cstr(buf, 13, "system_type")?,
                interface_version: get_u8(buf, "interface_version")?,
                addr_ton: get_u8(buf, "addr_ton")?,
                addr_npi: get_u8(buf, "addr_npi")?,
                address_range: get_cstr(buf, 41, "address_range")?,
            })
        }
        CommandId::BindReceiverResp
        | CommandId::BindTransmitterResp
        | CommandId::BindTransceiverResp => {
            if !buf.has_remaining() && !status.is_ok() {
                Body::Empty
            } else {
                Body::BindResp {
                    system_id: get_cstr(buf, 16, "system_id")?,
                }
            }
        }
        CommandId::SubmitSm => Body::SubmitSm(decode_short_message(buf)?),
        CommandId::DeliverSm => Body::DeliverSm(decode_short_message(buf)?),
        CommandId::SubmitSmResp | CommandId::DeliverSmResp => {
            if buf.has_remaining() {
                Body::MessageId(get_cstr(buf, 65, "message_id")?)
            } else {
                Body::Empty
            }
        }
        CommandId::GenericNack
        | CommandId::Unbind
        | CommandId::UnbindResp
        | CommandId::EnquireLink
        | CommandId::EnquireLinkResp => Body::Empty,
    };
    Ok(body)
}

fn decode_short_message(buf: &mut Bytes) -> Result<ShortMessage, String> {
    let mut sm = ShortMessage {
        service_type: get_cstr(buf, 6, "service_type")?,
        source_addr_ton: get_u8(buf, "source_addr_ton")?,
        source_addr_npi: get_u8(buf, "source_addr_npi")?,
        source_addr: get_cstr(buf, 21, "source_addr")?,
        dest_addr_ton: get_u8(buf, "dest_addr_ton")?,
        dest_addr_npi: get_u8(buf, "dest_addr_npi")?,
        destination_addr: get_cstr(buf, 21, "destination_addr")?,
        esm_class: get_u8(buf, "esm_class")?,
        protocol_id: get_u8(buf, "protocol_id")?,
        priority_flag: get_u8(buf, "priority_flag")?,
        schedule_delivery_time: get_cstr(buf, 17, "schedule_delivery_time")?,
        validity_period: get_cstr(buf, 17, "validity_period")?,
        registered_delivery: get_u8(buf, "registered_delivery")?,
        replace_if_present_flag: get_u8(buf, "replace_if_present_flag")?,
        data_coding: get_u8(buf, "data_coding")?,
        sm_default_msg_id: get_u8(buf, "sm_default_msg_id")?,
        ..ShortMessage::default()
    };

    let sm_length = get_u8(buf, "sm_length")? as usize;
    if buf.remaining() < sm_length {
        return Err(format!(
            "short_message declares {sm_length} octets, {} remain",
            buf.remaining()
        ));
    }
    sm.short_message = buf.split_to(sm_length).to_vec();

    // Optional TLVs: only message_payload matters to the bridge.
    while buf.remaining() >= 4 {
        let tag = buf.get_u16();
        let len = buf.get_u16() as usize;
        if buf.remaining() < len {
            return Err(format!("TLV 0x{tag:04X} declares {len} octets, {} remain", buf.remaining()));
        }
        let value = buf.split_to(len);
        if tag == TAG_MESSAGE_PAYLOAD {
            sm.message_payload = Some(value.to_vec());
        }
    }

    Ok(sm)
}

fn encode_short_message(dst: &mut BytesMut, sm: &ShortMessage) {
    put_cstr(dst, &sm.service_type);
    dst.put_u8(sm.source_addr_ton);
    dst.put_u8(sm.source_addr_npi);
    put_cstr(dst, &sm.source_addr);
    dst.put_u8(sm.dest_addr_ton);
    dst.put_u8(sm.dest_addr_npi);
    put_cstr(dst, &sm.destination_addr);
    dst.put_u8(sm.esm_class);
    dst.put_u8(sm.protocol_id);
    dst.put_u8(sm.priority_flag);
    put_cstr(dst, &sm.schedule_delivery_time);
    put_cstr(dst, &sm.validity_period);
    dst.put_u8(sm.registered_delivery);
    dst.put_u8(sm.replace_if_present_flag);
    dst.put_u8(sm.data_coding);
    dst.put_u8(sm.sm_default_msg_id);

    let short = &sm.short_message[..sm.short_message.len().min(MAX_SHORT_MESSAGE_LEN)];
    dst.put_u8(short.len() as u8);
    dst.put_slice(short);

    if let Some(payload) = &sm.message_payload {
        let len = payload.len().min(u16::MAX as usize);
        dst.put_u16(TAG_MESSAGE_PAYLOAD);
        dst.put_u16(len as u16);
        dst.put_slice(&payload[..len]);
    }
}

fn put_cstr(dst: &mut BytesMut, value: &str) {
    dst.put_slice(value.as_bytes());
    dst.put_u8(0);
}

fn get_u8(buf: &mut Bytes, field: &str) -> Result<u8, String> {
    if buf.has_remaining() {
        Ok(buf.get_u8())
    } else {
        Err(format!("missing {field}"))
    }
}

/// Reads a NUL-terminated string of at most `max` octets (terminator included).
fn get_cstr(buf: &mut Bytes, max: usize, field: &str) -> Result<String, String> {
    let nul = buf
        .iter()
        .take(max)
        .position(|b| *b == 0)
        .ok_or_else(|| format!("{field} is not NUL-terminated within {max} octets"))?;
    let raw = buf.split_to(nul);
    buf.advance(1);
    Ok(String::from_utf8_lossy(&raw).into_owned())
}
