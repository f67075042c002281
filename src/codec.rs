// SMPP v3.4 codec
//
// Separates the wire format from the PDU structs. Each PDU implements
// Encodable/Decodable and the registry maps a command_id onto the decoder
// that turns a body into a `Frame`.

use crate::datatypes::{
    AlertNotification, Bind, BindResponse, CommandId, CommandStatus, DeliverSm,
    DeliverSmResponse, EnquireLink, EnquireLinkResponse, GenericNack, SubmitSm, SubmitSmResponse,
    Unbind, UnbindResponse,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::LazyLock;
use thiserror::Error;

/// Maximum allowed PDU size to prevent memory exhaustion attacks
pub const MAX_PDU_SIZE: u32 = 65536; // 64KB

/// SMPP v3.4 PDU Header (16 bytes, common to all PDUs)
#[derive(Debug, Clone, PartialEq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Decode PDU header from buffer with validation
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = buf.get_u32();
        let command_id_raw = buf.get_u32();
        let command_id = CommandId::try_from(command_id_raw)
            .map_err(|_| CodecError::InvalidCommandId(command_id_raw))?;
        let command_status = CommandStatus::from_wire(buf.get_u32());
        let sequence_number = buf.get_u32();

        check_length(command_length)?;

        // Requests must have command_status = 0
        if !command_id.is_response() && command_status != CommandStatus::Ok {
            return Err(CodecError::InvalidRequestStatus {
                command_id,
                command_status,
            });
        }

        // Some SMSCs answer an unparsable header with generic_nack and sequence 0
        let reserved = sequence_number == 0 && command_id != CommandId::GenericNack;
        if reserved || sequence_number > MAX_SEQUENCE_NUMBER {
            return Err(CodecError::ReservedSequenceNumber(sequence_number));
        }

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    /// Encode PDU header to buffer. `command_length` is patched by `to_bytes`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id as u32);
        buf.put_u32(self.command_status as u32);
        buf.put_u32(self.sequence_number);
    }

    pub(crate) fn for_pdu(
        command_id: CommandId,
        command_status: CommandStatus,
        sequence_number: u32,
    ) -> Self {
        PduHeader {
            command_length: 0,
            command_id,
            command_status,
            sequence_number,
        }
    }
}

/// Largest sequence number allowed on the wire (0x80000000 and above are reserved)
pub const MAX_SEQUENCE_NUMBER: u32 = 0x7FFF_FFFF;

fn check_length(command_length: u32) -> Result<(), CodecError> {
    if command_length < PduHeader::SIZE as u32 || command_length > MAX_PDU_SIZE {
        return Err(CodecError::InvalidPduLength {
            length: command_length,
            min: PduHeader::SIZE as u32,
            max: MAX_PDU_SIZE,
        });
    }
    Ok(())
}

/// Trait for types that can be encoded to bytes
pub trait Encodable {
    /// Encode this PDU, header included, to the buffer
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Encode into a fresh buffer and fix the command_length field.
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(64);
        self.encode(&mut buf)?;

        let length = buf.len() as u32;
        if length > MAX_PDU_SIZE {
            return Err(CodecError::InvalidPduLength {
                length,
                min: PduHeader::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }
        buf[0..4].copy_from_slice(&length.to_be_bytes());

        Ok(buf.freeze())
    }
}

/// Trait for types that can be decoded from bytes
pub trait Decodable: Sized {
    /// Decode this PDU from its body. `buf` covers exactly the body octets.
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;
}

/// Codec errors with detailed context for debugging
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Incomplete PDU: need more data")]
    Incomplete,

    #[error("Invalid command_id: {0:#x}")]
    InvalidCommandId(u32),

    #[error("Invalid PDU length: {length}, must be {min}-{max}")]
    InvalidPduLength { length: u32, min: u32, max: u32 },

    #[error("Request PDU {command_id:?} has non-zero status: {command_status:?}")]
    InvalidRequestStatus {
        command_id: CommandId,
        command_status: CommandStatus,
    },

    #[error("Reserved sequence number: {0}")]
    ReservedSequenceNumber(u32),

    #[error("Field '{field}' validation failed: {reason}")]
    FieldValidation { field: &'static str, reason: String },

    #[error("TLV parsing error: {0}")]
    TlvError(String),

    #[error("UTF-8 decoding error in field '{field}': {source}")]
    Utf8Error {
        field: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Convert codec errors to appropriate SMPP command_status codes
impl CodecError {
    pub fn to_command_status(&self) -> CommandStatus {
        match self {
            CodecError::InvalidPduLength { .. } => CommandStatus::InvalidCommandLength,
            CodecError::InvalidCommandId(_) => CommandStatus::InvalidCommandId,
            CodecError::FieldValidation { field, .. } => match *field {
                "source_addr" => CommandStatus::InvalidSourceAddress,
                "destination_addr" => CommandStatus::InvalidDestinationAddress,
                "short_message" => CommandStatus::InvalidMsgLength,
                _ => CommandStatus::SystemError,
            },
            CodecError::TlvError(_) => CommandStatus::ErrorInOptionalPartofPduBody,
            _ => CommandStatus::SystemError,
        }
    }
}

/// Read a NUL terminated C-octet string of at most `max_len` octets,
/// terminator included.
pub fn decode_cstring(
    buf: &mut Cursor<&[u8]>,
    max_len: usize,
    field: &'static str,
) -> Result<String, CodecError> {
    let chunk = buf.chunk();
    let window = &chunk[..chunk.len().min(max_len)];

    let Some(end) = window.iter().position(|&b| b == 0) else {
        return Err(CodecError::FieldValidation {
            field,
            reason: format!("no NUL terminator within {max_len} octets"),
        });
    };

    let value = window[..end].to_vec();
    buf.advance(end + 1);

    String::from_utf8(value).map_err(|source| CodecError::Utf8Error { field, source })
}

/// Write `value` followed by a NUL terminator.
pub fn encode_cstring(
    buf: &mut BytesMut,
    value: &str,
    max_len: usize,
    field: &'static str,
) -> Result<(), CodecError> {
    if value.len() + 1 > max_len {
        return Err(CodecError::FieldValidation {
            field,
            reason: format!("{} octets exceeds limit of {}", value.len(), max_len - 1),
        });
    }
    buf.put_slice(value.as_bytes());
    buf.put_u8(0);
    Ok(())
}

/// Decode a single byte
pub fn decode_u8(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::FieldValidation {
            field,
            reason: "body ends before field".to_string(),
        });
    }
    Ok(buf.get_u8())
}

/// Decode `len` raw octets
pub fn decode_octets(
    buf: &mut Cursor<&[u8]>,
    len: usize,
    field: &'static str,
) -> Result<Bytes, CodecError> {
    if buf.remaining() < len {
        return Err(CodecError::FieldValidation {
            field,
            reason: format!("declares {len} octets but only {} remain", buf.remaining()),
        });
    }
    Ok(buf.copy_to_bytes(len))
}

/// Generic frame type that can hold any PDU this gateway exchanges
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Bind(Bind),
    BindResp(BindResponse),

    SubmitSm(Box<SubmitSm>),
    SubmitSmResp(SubmitSmResponse),
    DeliverSm(Box<DeliverSm>),
    DeliverSmResp(DeliverSmResponse),

    EnquireLink(EnquireLink),
    EnquireLinkResp(EnquireLinkResponse),
    Unbind(Unbind),
    UnbindResp(UnbindResponse),

    GenericNack(GenericNack),
    AlertNotification(AlertNotification),

    /// Any command_id outside the supported set, kept as opaque data
    Unknown {
        command_id: u32,
        sequence_number: u32,
        body: Bytes,
    },
}

type DecoderFn = Box<dyn Fn(PduHeader, &mut Cursor<&[u8]>) -> Result<Frame, CodecError> + Send + Sync>;

/// Registry of PDU decoders keyed by command_id
pub struct PduRegistry {
    decoders: HashMap<CommandId, DecoderFn>,
}

static REGISTRY: LazyLock<PduRegistry> = LazyLock::new(PduRegistry::new);

impl PduRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
        };

        for id in [
            CommandId::BindTransmitter,
            CommandId::BindReceiver,
            CommandId::BindTransceiver,
        ] {
            registry.register::<Bind, _>(id, Frame::Bind);
        }
        for id in [
            CommandId::BindTransmitterResp,
            CommandId::BindReceiverResp,
            CommandId::BindTransceiverResp,
        ] {
            registry.register::<BindResponse, _>(id, Frame::BindResp);
        }

        registry.register::<SubmitSm, _>(CommandId::SubmitSm, |pdu| Frame::SubmitSm(Box::new(pdu)));
        registry.register::<SubmitSmResponse, _>(CommandId::SubmitSmResp, Frame::SubmitSmResp);
        registry.register::<DeliverSm, _>(CommandId::DeliverSm, |pdu| Frame::DeliverSm(Box::new(pdu)));
        registry.register::<DeliverSmResponse, _>(CommandId::DeliverSmResp, Frame::DeliverSmResp);

        registry.register::<EnquireLink, _>(CommandId::EnquireLink, Frame::EnquireLink);
        registry.register::<EnquireLinkResponse, _>(CommandId::EnquireLinkResp, Frame::EnquireLinkResp);
        registry.register::<Unbind, _>(CommandId::Unbind, Frame::Unbind);
        registry.register::<UnbindResponse, _>(CommandId::UnbindResp, Frame::UnbindResp);

        registry.register::<GenericNack, _>(CommandId::GenericNack, Frame::GenericNack);
        registry.register::<AlertNotification, _>(CommandId::AlertNotification, Frame::AlertNotification);

        registry
    }

    fn register<T, F>(&mut self, command_id: CommandId, frame_constructor: F)
    where
        T: Decodable + 'static,
        F: Fn(T) -> Frame + Send + Sync + 'static,
    {
        let decoder = Box::new(move |header: PduHeader, buf: &mut Cursor<&[u8]>| {
            let pdu = T::decode(header, buf)?;
            Ok(frame_constructor(pdu))
        });
        self.decoders.insert(command_id, decoder);
    }

    /// Decode a PDU body given its header
    pub fn decode_pdu(&self, header: PduHeader, body: &[u8]) -> Result<Frame, CodecError> {
        let mut cursor = Cursor::new(body);
        match self.decoders.get(&header.command_id) {
            Some(decoder) => decoder(header, &mut cursor),
            None => Ok(Frame::Unknown {
                command_id: header.command_id as u32,
                sequence_number: header.sequence_number,
                body: Bytes::copy_from_slice(body),
            }),
        }
    }

    pub fn is_registered(&self, command_id: CommandId) -> bool {
        self.decoders.contains_key(&command_id)
    }
}

impl Default for PduRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// Raw command_id of this frame
    pub fn command_id(&self) -> u32 {
        let id = match self {
            Frame::Bind(pdu) => pdu.command_id(),
            Frame::BindResp(pdu) => pdu.command_id(),
            Frame::SubmitSm(_) => CommandId::SubmitSm,
            Frame::SubmitSmResp(_) => CommandId::SubmitSmResp,
            Frame::DeliverSm(_) => CommandId::DeliverSm,
            Frame::DeliverSmResp(_) => CommandId::DeliverSmResp,
            Frame::EnquireLink(_) => CommandId::EnquireLink,
            Frame::EnquireLinkResp(_) => CommandId::EnquireLinkResp,
            Frame::Unbind(_) => CommandId::Unbind,
            Frame::UnbindResp(_) => CommandId::UnbindResp,
            Frame::GenericNack(_) => CommandId::GenericNack,
            Frame::AlertNotification(_) => CommandId::AlertNotification,
            Frame::Unknown { command_id, .. } => return *command_id,
        };
        id as u32
    }

    pub fn sequence_number(&self) -> u32 {
        match self {
            Frame::Bind(pdu) => pdu.sequence_number,
            Frame::BindResp(pdu) => pdu.sequence_number,
            Frame::SubmitSm(pdu) => pdu.sequence_number,
            Frame::SubmitSmResp(pdu) => pdu.sequence_number,
            Frame::DeliverSm(pdu) => pdu.sequence_number,
            Frame::DeliverSmResp(pdu) => pdu.sequence_number,
            Frame::EnquireLink(pdu) => pdu.sequence_number,
            Frame::EnquireLinkResp(pdu) => pdu.sequence_number,
            Frame::Unbind(pdu) => pdu.sequence_number,
            Frame::UnbindResp(pdu) => pdu.sequence_number,
            Frame::GenericNack(pdu) => pdu.sequence_number,
            Frame::AlertNotification(pdu) => pdu.sequence_number,
            Frame::Unknown {
                sequence_number, ..
            } => *sequence_number,
        }
    }

    /// Check if this frame is a response PDU
    pub fn is_response(&self) -> bool {
        self.command_id() & 0x8000_0000 != 0
    }

    /// Check whether a complete frame is buffered. On success returns its length.
    pub fn check(buf: &mut Cursor<&[u8]>) -> Result<usize, CodecError> {
        if buf.remaining() < PduHeader::SIZE {
            return Err(CodecError::Incomplete);
        }

        // Peek at command_length without advancing cursor
        let pos = buf.position();
        let command_length = buf.get_u32();
        buf.set_position(pos);

        check_length(command_length)?;

        if buf.remaining() < command_length as usize {
            return Err(CodecError::Incomplete);
        }

        Ok(command_length as usize)
    }

    /// Parse one complete frame and advance the cursor past it.
    pub fn parse(buf: &mut Cursor<&[u8]>) -> Result<Frame, CodecError> {
        let start = buf.position() as usize;
        let len = Frame::check(buf)?;
        let inner: &[u8] = *buf.get_ref();
        let data = &inner[start..start + len];
        buf.set_position((start + len) as u64);

        let raw_id = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if CommandId::try_from(raw_id).is_err() {
            let sequence_number = u32::from_be_bytes([data[12], data[13], data[14], data[15]]);
            return Ok(Frame::Unknown {
                command_id: raw_id,
                sequence_number,
                body: Bytes::copy_from_slice(&data[PduHeader::SIZE..]),
            });
        }

        let header = PduHeader::decode(&mut Cursor::new(data))?;
        REGISTRY.decode_pdu(header, &data[PduHeader::SIZE..])
    }
}

impl Encodable for Frame {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        match self {
            Frame::Bind(pdu) => pdu.encode(buf),
            Frame::BindResp(pdu) => pdu.encode(buf),
            Frame::SubmitSm(pdu) => pdu.encode(buf),
            Frame::SubmitSmResp(pdu) => pdu.encode(buf),
            Frame::DeliverSm(pdu) => pdu.encode(buf),
            Frame::DeliverSmResp(pdu) => pdu.encode(buf),
            Frame::EnquireLink(pdu) => pdu.encode(buf),
            Frame::EnquireLinkResp(pdu) => pdu.encode(buf),
            Frame::Unbind(pdu) => pdu.encode(buf),
            Frame::UnbindResp(pdu) => pdu.encode(buf),
            Frame::GenericNack(pdu) => pdu.encode(buf),
            Frame::AlertNotification(pdu) => pdu.encode(buf),
            Frame::Unknown {
                command_id,
                sequence_number,
                body,
            } => {
                buf.put_u32(0);
                buf.put_u32(*command_id);
                buf.put_u32(0);
                buf.put_u32(*sequence_number);
                buf.put_slice(body);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_bytes(bytes: &[u8]) -> Result<Frame, CodecError> {
        let mut cursor = Cursor::new(bytes);
        Frame::parse(&mut cursor)
    }

    #[test]
    fn pdu_header_encode_decode() {
        let header = PduHeader {
            command_length: 16,
            command_id: CommandId::EnquireLink,
            command_status: CommandStatus::Ok,
            sequence_number: 42,
        };

        let mut buf = BytesMut::new();
        header.encode(&mut buf);

        let mut cursor = Cursor::new(buf.as_ref());
        let decoded = PduHeader::decode(&mut cursor).unwrap();

        assert_eq!(header, decoded);
    }

    #[test]
    fn header_rejects_status_on_request() {
        let bytes = [
            0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x15, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00,
            0x00, 0x01,
        ];
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(matches!(
            PduHeader::decode(&mut cursor),
            Err(CodecError::InvalidRequestStatus { .. })
        ));
    }

    #[test]
    fn generic_nack_may_carry_sequence_zero() {
        let bytes = [
            0x00, 0x00, 0x00, 0x10, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00,
            0x00, 0x00,
        ];
        match parse_bytes(&bytes).unwrap() {
            Frame::GenericNack(nack) => {
                assert_eq!(nack.sequence_number, 0);
                assert_eq!(nack.command_status, CommandStatus::InvalidCommandId);
            }
            other => panic!("Expected GenericNack, got {other:?}"),
        }
    }

    #[test]
    fn decode_cstring_stops_at_terminator() {
        let data = b"hello\0world\0";
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(decode_cstring(&mut cursor, 16, "test").unwrap(), "hello");
        assert_eq!(cursor.position(), 6);
        assert_eq!(decode_cstring(&mut cursor, 16, "test").unwrap(), "world");
    }

    #[test]
    fn decode_cstring_enforces_max_len() {
        let data = b"0123456789\0";
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            decode_cstring(&mut cursor, 5, "system_id"),
            Err(CodecError::FieldValidation {
                field: "system_id",
                ..
            })
        ));
    }

    #[test]
    fn encode_cstring_appends_terminator() {
        let mut buf = BytesMut::new();
        encode_cstring(&mut buf, "hello", 10, "test").unwrap();
        assert_eq!(buf.as_ref(), b"hello\0");

        assert!(encode_cstring(&mut buf, "toolong", 7, "test").is_err());
    }

    #[test]
    fn check_reports_incomplete_and_length() {
        let pdu = EnquireLink::new(7).to_bytes().unwrap();

        let mut partial = Cursor::new(&pdu[..10]);
        assert!(matches!(Frame::check(&mut partial), Err(CodecError::Incomplete)));

        let mut full = Cursor::new(pdu.as_ref());
        assert_eq!(Frame::check(&mut full).unwrap(), 16);
        assert_eq!(full.position(), 0);
    }

    #[test]
    fn check_rejects_oversized_length() {
        let mut bytes = vec![0u8; 16];
        bytes[0..4].copy_from_slice(&(MAX_PDU_SIZE + 1).to_be_bytes());
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(matches!(
            Frame::check(&mut cursor),
            Err(CodecError::InvalidPduLength { .. })
        ));
    }

    #[test]
    fn unknown_command_id_is_preserved() {
        // query_sm is not part of the supported set
        let bytes = [
            0x00, 0x00, 0x00, 0x12, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x09, 0xAA, 0xBB,
        ];
        let mut cursor = Cursor::new(&bytes[..]);
        let frame = Frame::parse(&mut cursor).unwrap();

        assert_eq!(cursor.position(), 18);
        assert_eq!(frame.command_id(), 0x0000_0003);
        assert_eq!(frame.sequence_number(), 9);
        assert!(!frame.is_response());
        assert!(matches!(frame, Frame::Unknown { ref body, .. } if body.as_ref() == [0xAA, 0xBB]));
    }

    #[test]
    fn parse_consumes_exactly_one_frame() {
        let mut bytes = EnquireLink::new(1).to_bytes().unwrap().to_vec();
        bytes.extend_from_slice(&Unbind::new(2).to_bytes().unwrap());

        let mut cursor = Cursor::new(&bytes[..]);
        assert_eq!(Frame::parse(&mut cursor).unwrap(), Frame::EnquireLink(EnquireLink::new(1)));
        assert_eq!(Frame::parse(&mut cursor).unwrap(), Frame::Unbind(Unbind::new(2)));
    }

    #[test]
    fn registry_knows_supported_commands() {
        let registry = PduRegistry::new();
        assert!(registry.is_registered(CommandId::DeliverSm));
        assert!(registry.is_registered(CommandId::BindTransceiverResp));
    }

    #[test]
    fn codec_errors_map_to_status() {
        let err = CodecError::FieldValidation {
            field: "destination_addr",
            reason: "too long".into(),
        };
        assert_eq!(err.to_command_status(), CommandStatus::InvalidDestinationAddress);
        assert_eq!(
            CodecError::InvalidCommandId(3).to_command_status(),
            CommandStatus::InvalidCommandId
        );
    }
}
