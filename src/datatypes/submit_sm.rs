use crate::codec::{CodecError, Decodable, Encodable, PduHeader, decode_cstring, encode_cstring};
use crate::datatypes::{
    CommandId, CommandStatus, EsmClass, NumericPlanIndicator, RegisteredDelivery, Tlv,
    TypeOfNumber,
};
use crate::macros::{builder_setters, impl_short_message_pdu};
use bytes::{Bytes, BytesMut};
use std::io::Cursor;

const MESSAGE_ID_SIZE: usize = 65;

/// This operation is used by an ESME to submit a short message to the SMSC for onward transmission
/// to a specified short message entity (SME).
///
/// `sequence_number` is assigned by the session when the PDU is written, so
/// callers build the body and leave it at zero.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSm {
    pub sequence_number: u32,

    /// SMS application service associated with the message, empty for the default.
    pub service_type: String,
    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    /// Address of the SME which originated this message, up to 20 characters.
    pub source_addr: String,
    pub dest_addr_ton: TypeOfNumber,
    pub dest_addr_npi: NumericPlanIndicator,
    /// Directory number of the recipient, up to 20 characters.
    pub destination_addr: String,
    pub esm_class: EsmClass,
    pub protocol_id: u8,
    pub priority_flag: u8,
    /// Empty for immediate delivery.
    pub schedule_delivery_time: String,
    /// Empty for the SMSC default validity period.
    pub validity_period: String,
    pub registered_delivery: RegisteredDelivery,
    pub replace_if_present_flag: u8,
    pub data_coding: u8,
    pub sm_default_msg_id: u8,
    /// Up to 254 octets of user data. Longer payloads travel in message_payload.
    pub short_message: Bytes,

    /// Optional parameters in the order they are written
    pub tlvs: Vec<Tlv>,
}

impl SubmitSm {
    pub fn new(source_addr: impl Into<String>, destination_addr: impl Into<String>) -> Self {
        Self {
            sequence_number: 0,
            service_type: String::new(),
            source_addr_ton: TypeOfNumber::default(),
            source_addr_npi: NumericPlanIndicator::default(),
            source_addr: source_addr.into(),
            dest_addr_ton: TypeOfNumber::default(),
            dest_addr_npi: NumericPlanIndicator::default(),
            destination_addr: destination_addr.into(),
            esm_class: EsmClass::default_submit(),
            protocol_id: 0,
            priority_flag: 0,
            schedule_delivery_time: String::new(),
            validity_period: String::new(),
            registered_delivery: RegisteredDelivery::NONE,
            replace_if_present_flag: 0,
            data_coding: 0,
            sm_default_msg_id: 0,
            short_message: Bytes::new(),
            tlvs: Vec::new(),
        }
    }

    builder_setters! {
        service_type: String,
        source_addr_ton: TypeOfNumber,
        source_addr_npi: NumericPlanIndicator,
        dest_addr_ton: TypeOfNumber,
        dest_addr_npi: NumericPlanIndicator,
        esm_class: EsmClass,
        registered_delivery: RegisteredDelivery,
        data_coding: u8,
    }

    /// Builder form of [`SubmitSm::set_user_data`]
    pub fn user_data_octets(mut self, octets: impl Into<Bytes>) -> Self {
        self.set_user_data(octets);
        self
    }

    /// Builder form of [`SubmitSm::push_tlv`]
    pub fn with_tlv(mut self, tlv: Tlv) -> Self {
        self.push_tlv(tlv);
        self
    }
}

impl_short_message_pdu!(SubmitSm, CommandId::SubmitSm);

/// Response to submit_sm. The body, carrying the SMSC assigned message id, is
/// only present when command_status is ESME_ROK.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    /// Unique identifier assigned by the SMSC, used to correlate delivery
    /// receipts. Empty when the SMSC returned none.
    pub message_id: String,
}

impl SubmitSmResponse {
    pub fn new(sequence_number: u32, message_id: impl Into<String>) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            message_id: message_id.into(),
        }
    }

    pub fn error(sequence_number: u32, status: CommandStatus) -> Self {
        Self {
            command_status: status,
            sequence_number,
            message_id: String::new(),
        }
    }

    /// The message id, or `None` when the SMSC left it empty
    pub fn message_id(&self) -> Option<&str> {
        Some(self.message_id.as_str()).filter(|id| !id.is_empty())
    }
}

impl Encodable for SubmitSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_pdu(CommandId::SubmitSmResp, self.command_status, self.sequence_number)
            .encode(buf);
        if self.command_status.is_ok() {
            encode_cstring(buf, &self.message_id, MESSAGE_ID_SIZE, "message_id")?;
        }
        Ok(())
    }
}

impl Decodable for SubmitSmResponse {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        use bytes::Buf;

        // Some SMSCs send a body on error responses as well, it is read the same way
        let message_id = if buf.has_remaining() {
            decode_cstring(buf, MESSAGE_ID_SIZE, "message_id")?
        } else {
            String::new()
        };

        Ok(SubmitSmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Frame;
    use crate::datatypes::tags;

    #[test]
    fn submit_sm_to_bytes_basic() {
        let mut submit_sm = SubmitSm::new("1234567890", "0987654321").user_data_octets("Hello World");
        submit_sm.sequence_number = 1;

        let bytes = submit_sm.to_bytes().unwrap();

        // Verify header
        assert_eq!(&bytes[0..4], &(bytes.len() as u32).to_be_bytes());
        assert_eq!(&bytes[4..8], &(CommandId::SubmitSm as u32).to_be_bytes());
        assert_eq!(&bytes[8..12], &0u32.to_be_bytes());
        assert_eq!(&bytes[12..16], &1u32.to_be_bytes());

        let body_start = 16;
        assert_eq!(bytes[body_start], 0); // service_type null terminator
        assert_eq!(bytes[body_start + 1], TypeOfNumber::International as u8);
        assert_eq!(bytes[body_start + 2], NumericPlanIndicator::Isdn as u8);
        assert_eq!(&bytes[body_start + 3..body_start + 14], b"1234567890\0");

        // sm_length followed by the text closes the body
        let tail = &bytes[bytes.len() - 12..];
        assert_eq!(tail[0], 11);
        assert_eq!(&tail[1..], b"Hello World");
    }

    #[test]
    fn submit_sm_with_sar_tlvs_parses_back() {
        let mut submit_sm = SubmitSm::new("sender", "27831234567")
            .registered_delivery(RegisteredDelivery::SMSC_RECEIPT)
            .data_coding(0x08)
            .user_data_octets(vec![0x00, 0x41])
            .with_tlv(Tlv::from_u16(tags::SAR_MSG_REF_NUM, 0x1234))
            .with_tlv(Tlv::from_u8(tags::SAR_TOTAL_SEGMENTS, 2))
            .with_tlv(Tlv::from_u8(tags::SAR_SEGMENT_SEQNUM, 1));
        submit_sm.sequence_number = 77;

        let bytes = submit_sm.to_bytes().unwrap();
        let frame = Frame::parse(&mut Cursor::new(bytes.as_ref())).unwrap();
        assert_eq!(frame, Frame::SubmitSm(Box::new(submit_sm)));
    }

    #[test]
    fn long_user_data_moves_to_message_payload() {
        let text = vec![b'x'; 300];
        let submit_sm = SubmitSm::new("a", "b").user_data_octets(text.clone());

        assert!(submit_sm.short_message.is_empty());
        assert_eq!(submit_sm.tlv(tags::MESSAGE_PAYLOAD).map(|t| t.value.len()), Some(300));
        assert_eq!(submit_sm.user_data(), text.as_slice());
        assert!(submit_sm.to_bytes().is_ok());
    }

    #[test]
    fn oversized_short_message_fails_to_encode() {
        let mut submit_sm = SubmitSm::new("a", "b");
        submit_sm.short_message = Bytes::from(vec![b'x'; 255]);
        assert!(matches!(
            submit_sm.to_bytes(),
            Err(CodecError::FieldValidation {
                field: "short_message",
                ..
            })
        ));
    }

    #[test]
    fn oversized_destination_fails_to_encode() {
        let submit_sm = SubmitSm::new("a", "123456789012345678901");
        assert_eq!(
            submit_sm.to_bytes().unwrap_err().to_command_status(),
            CommandStatus::InvalidDestinationAddress
        );
    }

    #[test]
    fn submit_sm_response_to_bytes() {
        let bytes = SubmitSmResponse::new(2, "msg-1").to_bytes().unwrap();
        let expected: [u8; 22] = [
            0x00, 0x00, 0x00, 0x16, 0x80, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x02, b'm', b's', b'g', b'-', b'1', 0x00,
        ];
        assert_eq!(bytes.as_ref(), expected);
    }

    #[test]
    fn submit_sm_response_error_has_no_body() {
        let response = SubmitSmResponse::error(9, CommandStatus::ThrottlingError);
        let bytes = response.to_bytes().unwrap();
        assert_eq!(bytes.len(), 16);

        let frame = Frame::parse(&mut Cursor::new(bytes.as_ref())).unwrap();
        match frame {
            Frame::SubmitSmResp(parsed) => {
                assert_eq!(parsed.command_status, CommandStatus::ThrottlingError);
                assert_eq!(parsed.message_id(), None);
            }
            other => panic!("Expected SubmitSmResp, got {other:?}"),
        }
    }
}
