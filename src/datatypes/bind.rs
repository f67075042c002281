// ABOUTME: bind_transmitter / bind_receiver / bind_transceiver requests and their responses
// ABOUTME: One struct per direction, the bind type selects the command_id on the wire

use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
};
use crate::datatypes::{
    CommandId, CommandStatus, InterfaceVersion, NumericPlanIndicator, Tlv, TypeOfNumber,
    decode_tlvs, find_tlv, tags,
};
use bytes::{BufMut, BytesMut};
use serde::Deserialize;
use std::io::Cursor;

// Field sizes including the NUL terminator
const SYSTEM_ID_SIZE: usize = 16;
const PASSWORD_SIZE: usize = 9;
const SYSTEM_TYPE_SIZE: usize = 13;
const ADDRESS_RANGE_SIZE: usize = 41;

/// Role requested from the SMSC when binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindType {
    /// Submit only
    #[default]
    Transmitter,
    /// Receive deliver_sm only
    Receiver,
    /// Both directions over one session
    Transceiver,
}

impl BindType {
    pub fn request_id(&self) -> CommandId {
        match self {
            BindType::Transmitter => CommandId::BindTransmitter,
            BindType::Receiver => CommandId::BindReceiver,
            BindType::Transceiver => CommandId::BindTransceiver,
        }
    }

    pub fn response_id(&self) -> CommandId {
        match self {
            BindType::Transmitter => CommandId::BindTransmitterResp,
            BindType::Receiver => CommandId::BindReceiverResp,
            BindType::Transceiver => CommandId::BindTransceiverResp,
        }
    }

    fn from_command_id(command_id: CommandId) -> Result<Self, CodecError> {
        match command_id {
            CommandId::BindTransmitter | CommandId::BindTransmitterResp => Ok(BindType::Transmitter),
            CommandId::BindReceiver | CommandId::BindReceiverResp => Ok(BindType::Receiver),
            CommandId::BindTransceiver | CommandId::BindTransceiverResp => Ok(BindType::Transceiver),
            other => Err(CodecError::FieldValidation {
                field: "command_id",
                reason: format!("{other:?} is not a bind operation"),
            }),
        }
    }

    /// Whether the SMSC may send deliver_sm over a session bound this way
    pub fn receives(&self) -> bool {
        !matches!(self, BindType::Transmitter)
    }

    /// Whether submit_sm may be sent over a session bound this way
    pub fn transmits(&self) -> bool {
        !matches!(self, BindType::Receiver)
    }
}

/// Bind request sent by the ESME to open a session.
#[derive(Clone, Debug, PartialEq)]
pub struct Bind {
    pub bind_type: BindType,
    pub sequence_number: u32,

    /// Identifies the ESME requesting to bind, up to 15 characters.
    pub system_id: String,
    /// Up to 8 characters, empty when the SMSC does not require one.
    pub password: String,
    /// Categorises the ESME (e.g. "VMS", "OTA"), up to 12 characters.
    pub system_type: String,
    pub interface_version: InterfaceVersion,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,
    /// Range of SME addresses served by this ESME, empty matches any.
    pub address_range: String,
}

impl Bind {
    pub fn command_id(&self) -> CommandId {
        self.bind_type.request_id()
    }
}

impl Encodable for Bind {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_pdu(self.command_id(), CommandStatus::Ok, self.sequence_number).encode(buf);

        encode_cstring(buf, &self.system_id, SYSTEM_ID_SIZE, "system_id")?;
        encode_cstring(buf, &self.password, PASSWORD_SIZE, "password")?;
        encode_cstring(buf, &self.system_type, SYSTEM_TYPE_SIZE, "system_type")?;
        buf.put_u8(self.interface_version as u8);
        buf.put_u8(self.addr_ton as u8);
        buf.put_u8(self.addr_npi as u8);
        encode_cstring(buf, &self.address_range, ADDRESS_RANGE_SIZE, "address_range")?;
        Ok(())
    }
}

impl Decodable for Bind {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let bind_type = BindType::from_command_id(header.command_id)?;
        let system_id = decode_cstring(buf, SYSTEM_ID_SIZE, "system_id")?;
        let password = decode_cstring(buf, PASSWORD_SIZE, "password")?;
        let system_type = decode_cstring(buf, SYSTEM_TYPE_SIZE, "system_type")?;
        let version = decode_u8(buf, "interface_version")?;
        let interface_version =
            InterfaceVersion::try_from(version).map_err(|_| CodecError::FieldValidation {
                field: "interface_version",
                reason: format!("unsupported version {version:#04x}"),
            })?;
        let addr_ton = TypeOfNumber::from_wire(decode_u8(buf, "addr_ton")?);
        let addr_npi = NumericPlanIndicator::from_wire(decode_u8(buf, "addr_npi")?);
        let address_range = decode_cstring(buf, ADDRESS_RANGE_SIZE, "address_range")?;

        Ok(Bind {
            bind_type,
            sequence_number: header.sequence_number,
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }
}

/// Response to any of the three bind requests. The body is only present when
/// the bind succeeded.
#[derive(Clone, Debug, PartialEq)]
pub struct BindResponse {
    pub bind_type: BindType,
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    /// Identifies the SMSC to the ESME.
    pub system_id: String,
    /// SMPP version supported by the SMSC, when advertised.
    pub sc_interface_version: Option<u8>,
}

impl BindResponse {
    pub fn new(bind_type: BindType, sequence_number: u32, system_id: impl Into<String>) -> Self {
        Self {
            bind_type,
            command_status: CommandStatus::Ok,
            sequence_number,
            system_id: system_id.into(),
            sc_interface_version: None,
        }
    }

    pub fn error(bind_type: BindType, sequence_number: u32, status: CommandStatus) -> Self {
        Self {
            bind_type,
            command_status: status,
            sequence_number,
            system_id: String::new(),
            sc_interface_version: None,
        }
    }

    pub fn command_id(&self) -> CommandId {
        self.bind_type.response_id()
    }
}

impl Encodable for BindResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_pdu(self.command_id(), self.command_status, self.sequence_number)
            .encode(buf);

        if self.command_status.is_ok() {
            encode_cstring(buf, &self.system_id, SYSTEM_ID_SIZE, "system_id")?;
            if let Some(version) = self.sc_interface_version {
                Tlv::from_u8(tags::SC_INTERFACE_VERSION, version).encode(buf)?;
            }
        }
        Ok(())
    }
}

impl Decodable for BindResponse {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        use bytes::Buf;

        let bind_type = BindType::from_command_id(header.command_id)?;
        let mut response = BindResponse::error(bind_type, header.sequence_number, header.command_status);

        if buf.has_remaining() {
            response.system_id = decode_cstring(buf, SYSTEM_ID_SIZE, "system_id")?;
            let tlvs = decode_tlvs(buf)?;
            response.sc_interface_version =
                find_tlv(&tlvs, tags::SC_INTERFACE_VERSION).and_then(Tlv::as_u8);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Frame;

    fn bind(bind_type: BindType) -> Bind {
        Bind {
            bind_type,
            sequence_number: 1,
            system_id: "SMPP3TEST".to_string(),
            password: "secret08".to_string(),
            system_type: "SUBMIT1".to_string(),
            interface_version: InterfaceVersion::SmppV34,
            addr_ton: TypeOfNumber::International,
            addr_npi: NumericPlanIndicator::Isdn,
            address_range: String::new(),
        }
    }

    #[test]
    fn bind_transmitter_to_bytes() {
        let bytes = bind(BindType::Transmitter).to_bytes().unwrap();

        let parts: [&[u8]; 9] = [
            &[0x00, 0x00, 0x00, 0x2F], // command_length = 47
            &[0x00, 0x00, 0x00, 0x02],     // bind_transmitter
            &[0x00, 0x00, 0x00, 0x00],
            &[0x00, 0x00, 0x00, 0x01],
            b"SMPP3TEST\0",
            b"secret08\0",
            b"SUBMIT1\0",
            &[0x34, 0x01, 0x01],
            b"\0",
        ];
        assert_eq!(bytes.as_ref(), parts.concat().as_slice());
    }

    #[test]
    fn bind_type_selects_command_id() {
        let bytes = bind(BindType::Transceiver).to_bytes().unwrap();
        assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x00, 0x09]);

        let bytes = bind(BindType::Receiver).to_bytes().unwrap();
        assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn oversized_password_is_rejected() {
        let mut request = bind(BindType::Transmitter);
        request.password = "ninechars".to_string();
        assert!(matches!(
            request.to_bytes(),
            Err(CodecError::FieldValidation {
                field: "password",
                ..
            })
        ));
    }

    #[test]
    fn bind_request_parses_back() {
        let request = bind(BindType::Transceiver);
        let bytes = request.to_bytes().unwrap();
        let frame = Frame::parse(&mut Cursor::new(bytes.as_ref())).unwrap();
        assert_eq!(frame, Frame::Bind(request));
    }

    #[test]
    fn bind_response_with_interface_version() {
        let mut response = BindResponse::new(BindType::Transmitter, 1, "SMSC");
        response.sc_interface_version = Some(0x34);

        let bytes = response.to_bytes().unwrap();
        let frame = Frame::parse(&mut Cursor::new(bytes.as_ref())).unwrap();
        assert_eq!(frame, Frame::BindResp(response));
    }

    #[test]
    fn failed_bind_response_has_no_body() {
        let response = BindResponse::error(BindType::Receiver, 3, CommandStatus::InvalidPassword);
        let bytes = response.to_bytes().unwrap();
        assert_eq!(bytes.len(), 16);

        match Frame::parse(&mut Cursor::new(bytes.as_ref())).unwrap() {
            Frame::BindResp(parsed) => {
                assert_eq!(parsed.bind_type, BindType::Receiver);
                assert_eq!(parsed.command_status, CommandStatus::InvalidPassword);
                assert!(parsed.system_id.is_empty());
            }
            other => panic!("Expected BindResp, got {other:?}"),
        }
    }
}
