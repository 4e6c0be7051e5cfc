// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Length-prefixed framing of SMPP PDUs for `tokio_util::codec`.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::PduError;
use crate::pdu::{HEADER_LEN, Pdu};

/// One item read off an SMPP connection.
///
/// Recoverable decode failures are surfaced as `Rejected` instead of `Err`
/// so the framed stream keeps running after a bad PDU.
#[derive(Debug)]
pub enum Frame {
    Pdu(Pdu),
    Rejected(PduError),
}

/// SMPP codec bounded by a maximum `command_length`.
#[derive(Debug, Clone)]
pub struct SmppCodec {
    max_pdu_len: usize,
}

impl SmppCodec {
    pub fn new(max_pdu_len: usize) -> Self {
        Self {
            max_pdu_len: max_pdu_len.max(HEADER_LEN),
        }
    }
}

impl Default for SmppCodec {
    fn default() -> Self {
        Self::new(65_536)
    }
}

impl Decoder for SmppCodec {
    type Item = Frame;
    type Error = PduError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, PduError> {
        if src.len() < 4 {
            return Ok(None);
        }
        let length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]);
        if (length as usize) < HEADER_LEN {
            return Err(PduError::LengthTooSmall(length));
        }
        if length as usize > self.max_pdu_len {
            return Err(PduError::LengthTooLarge {
                length,
                max: self.max_pdu_len,
            });
        }

        let length = length as usize;
        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let frame = src.split_to(length).freeze();
        match Pdu::decode(frame) {
            Ok(pdu) => Ok(Some(Frame::Pdu(pdu))),
            Err(err) if err.is_recoverable() => Ok(Some(Frame::Rejected(err))),
            Err(err) => Err(err),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, PduError> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.has_remaining() => Err(PduError::Truncated("PDU at end of stream")),
            None => Ok(None),
        }
    }
}

impl Encoder<Pdu> for SmppCodec {
    type Error = PduError;

    fn encode(&mut self, item: Pdu, dst: &mut BytesMut) -> Result<(), PduError> {
        item.encode(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;
    use proptest::prelude::*;

    use super::*;
    use crate::pdu::{CommandId, CommandStatus, ShortMessage};

    fn encode(pdu: Pdu) -> BytesMut {
        let mut buf = BytesMut::new();
        SmppCodec::default().encode(pdu, &mut buf).unwrap();
        buf
    }

    #[test]
    fn partial_frame_waits_for_more() {
        let full = encode(Pdu::enquire_link(1));
        let mut partial = BytesMut::from(&full[..10]);
        let mut codec = SmppCodec::default();
        assert!(codec.decode(&mut partial).unwrap().is_none());

        partial.extend_from_slice(&full[10..]);
        match codec.decode(&mut partial).unwrap() {
            Some(Frame::Pdu(pdu)) => assert_eq!(pdu.command_id, CommandId::EnquireLink),
            other => panic!("unexpected {other:?}"),
        }
        assert!(partial.is_empty());
    }

    #[test]
    fn two_frames_in_one_read() {
        let mut buf = encode(Pdu::enquire_link(1));
        buf.extend_from_slice(&encode(Pdu::unbind(2)));
        let mut codec = SmppCodec::default();

        let first = codec.decode(&mut buf).unwrap();
        let second = codec.decode(&mut buf).unwrap();
        assert!(matches!(first, Some(Frame::Pdu(p)) if p.sequence_number == 1));
        assert!(matches!(second, Some(Frame::Pdu(p)) if p.command_id == CommandId::Unbind));
    }

    #[test]
    fn undersized_length_is_fatal() {
        let mut buf = BytesMut::new();
        buf.put_u32(8);
        buf.put_u32(0x15);
        assert!(matches!(
            SmppCodec::default().decode(&mut buf),
            Err(PduError::LengthTooSmall(8))
        ));
    }

    #[test]
    fn oversized_length_is_fatal() {
        let mut buf = BytesMut::new();
        buf.put_u32(1_000_000);
        assert!(matches!(
            SmppCodec::new(4096).decode(&mut buf),
            Err(PduError::LengthTooLarge { .. })
        ));
    }

    #[test]
    fn unknown_command_is_rejected_not_fatal() {
        let mut buf = BytesMut::new();
        buf.put_u32(16);
        buf.put_u32(0x0000_0103);
        buf.put_u32(0);
        buf.put_u32(4);
        buf.extend_from_slice(&encode(Pdu::enquire_link(5)));

        let mut codec = SmppCodec::default();
        assert!(matches!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Rejected(PduError::UnknownCommand {
                sequence_number: 4,
                ..
            }))
        ));
        assert!(matches!(codec.decode(&mut buf).unwrap(), Some(Frame::Pdu(_))));
    }

    #[test]
    fn truncated_stream_end_is_an_error() {
        let full = encode(Pdu::submit_sm_resp(3, CommandStatus::OK, "abc"));
        let mut buf = BytesMut::from(&full[..full.len() - 2]);
        assert!(SmppCodec::default().decode_eof(&mut buf).is_err());
    }

    proptest! {
        #[test]
        fn decoder_never_panics_on_arbitrary_input(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut buf = BytesMut::from(&data[..]);
            let mut codec = SmppCodec::new(1024);
            while let Ok(Some(_)) = codec.decode(&mut buf) {}
        }

        #[test]
        fn submit_sm_survives_framing(
            source in "[0-9]{1,20}",
            dest in "[0-9]{1,20}",
            body in proptest::collection::vec(any::<u8>(), 0..600),
        ) {
            let mut sm = ShortMessage {
                source_addr: source.clone(),
                destination_addr: dest.clone(),
                ..ShortMessage::default()
            };
            sm.set_payload(body.clone());
            let mut buf = encode(Pdu::submit_sm(11, sm));
            match SmppCodec::default().decode(&mut buf).unwrap() {
                Some(Frame::Pdu(Pdu { body: crate::pdu::Body::SubmitSm(decoded), .. })) => {
                    prop_assert_eq!(&decoded.source_addr, &source);
                    prop_assert_eq!(&decoded.destination_addr, &dest);
                    prop_assert_eq!(decoded.payload(), &body[..]);
                }
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }
    }
}
