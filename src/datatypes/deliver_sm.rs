use crate::codec::{CodecError, Decodable, Encodable, PduHeader, decode_cstring, encode_cstring};
use crate::datatypes::{
    CommandId, CommandStatus, EsmClass, NumericPlanIndicator, RegisteredDelivery, Tlv,
    TypeOfNumber,
};
use crate::macros::impl_short_message_pdu;
use bytes::{Bytes, BytesMut};
use std::io::Cursor;

/// Issued by the SMSC to route a mobile originated message, or a delivery
/// receipt for an earlier submit_sm, to the ESME.
///
/// A receipt is flagged through `esm_class` and carries the receipt text in
/// `short_message`.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSm {
    pub sequence_number: u32,

    pub service_type: String,
    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    pub source_addr: String,
    pub dest_addr_ton: TypeOfNumber,
    pub dest_addr_npi: NumericPlanIndicator,
    pub destination_addr: String,
    pub esm_class: EsmClass,
    pub protocol_id: u8,
    pub priority_flag: u8,
    /// Always empty on deliver_sm
    pub schedule_delivery_time: String,
    /// Always empty on deliver_sm
    pub validity_period: String,
    pub registered_delivery: RegisteredDelivery,
    pub replace_if_present_flag: u8,
    pub data_coding: u8,
    pub sm_default_msg_id: u8,
    pub short_message: Bytes,

    pub tlvs: Vec<Tlv>,
}

impl DeliverSm {
    pub fn new(sequence_number: u32, source_addr: impl Into<String>, destination_addr: impl Into<String>) -> Self {
        Self {
            sequence_number,
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

    /// Whether the SMSC flagged this PDU as a delivery receipt
    pub fn is_delivery_receipt(&self) -> bool {
        self.esm_class.is_delivery_receipt()
    }
}

impl_short_message_pdu!(DeliverSm, CommandId::DeliverSm);

/// Response to deliver_sm. The message_id field is unused and always empty.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl DeliverSmResponse {
    pub fn new(sequence_number: u32) -> Self {
        Self::error(sequence_number, CommandStatus::Ok)
    }

    pub fn error(sequence_number: u32, status: CommandStatus) -> Self {
        Self {
            command_status: status,
            sequence_number,
        }
    }
}

impl Encodable for DeliverSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_pdu(CommandId::DeliverSmResp, self.command_status, self.sequence_number)
            .encode(buf);
        encode_cstring(buf, "", 1, "message_id")
    }
}

impl Decodable for DeliverSmResponse {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        use bytes::Buf;

        if buf.has_remaining() {
            decode_cstring(buf, 65, "message_id")?;
        }
        Ok(DeliverSmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Frame;
    use crate::datatypes::tags;

    fn receipt_bytes() -> Vec<u8> {
        let text = b"id:0123456789 sub:001 dlvrd:001 submit date:2401011200 done date:2401011201 stat:DELIVRD err:000 text:Hello";
        let parts: [&[u8]; 12] = [
            &[0x00, 0x00, 0x00, 0x00], // patched below
            &[0x00, 0x00, 0x00, 0x05],
            &[0x00, 0x00, 0x00, 0x00],
            &[0x00, 0x00, 0x00, 0x2A],
            b"\0",                     // service_type
            &[0x01, 0x01],
            b"27831234567\0",
            &[0x00, 0x00],
            b"1234\0",
            &[0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // esm_class .. sm_default_msg_id
            &[text.len() as u8],
            text,
        ];
        let mut bytes = parts.concat();
        let length = bytes.len() as u32;
        bytes[0..4].copy_from_slice(&length.to_be_bytes());
        bytes
    }

    #[test]
    fn delivery_receipt_parses() {
        let bytes = receipt_bytes();
        let frame = Frame::parse(&mut Cursor::new(&bytes[..])).unwrap();

        let Frame::DeliverSm(deliver_sm) = frame else {
            panic!("Expected DeliverSm");
        };
        assert_eq!(deliver_sm.sequence_number, 42);
        assert!(deliver_sm.is_delivery_receipt());
        assert_eq!(deliver_sm.source_addr, "27831234567");
        assert_eq!(deliver_sm.dest_addr_ton, TypeOfNumber::Unknown);
        assert_eq!(deliver_sm.destination_addr, "1234");
        assert!(deliver_sm.user_data().starts_with(b"id:0123456789"));
        assert!(deliver_sm.tlvs.is_empty());
    }

    #[test]
    fn message_payload_is_used_when_short_message_empty() {
        let mut deliver_sm = DeliverSm::new(3, "a", "b");
        deliver_sm.push_tlv(Tlv::new(tags::MESSAGE_PAYLOAD, &b"payload text"[..]));
        assert_eq!(deliver_sm.user_data(), b"payload text");

        let bytes = deliver_sm.to_bytes().unwrap();
        let frame = Frame::parse(&mut Cursor::new(bytes.as_ref())).unwrap();
        assert_eq!(frame, Frame::DeliverSm(Box::new(deliver_sm)));
    }

    #[test]
    fn truncated_short_message_is_rejected() {
        let mut bytes = receipt_bytes();
        bytes.truncate(bytes.len() - 10);
        let length = bytes.len() as u32;
        bytes[0..4].copy_from_slice(&length.to_be_bytes());

        assert!(matches!(
            Frame::parse(&mut Cursor::new(&bytes[..])),
            Err(CodecError::FieldValidation {
                field: "short_message",
                ..
            })
        ));
    }

    #[test]
    fn deliver_sm_response_to_bytes() {
        let bytes = DeliverSmResponse::error(42, CommandStatus::ReceiverPermanentAppError)
            .to_bytes()
            .unwrap();
        let expected: [u8; 17] = [
            0x00, 0x00, 0x00, 0x11, 0x80, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x65, 0x00, 0x00,
            0x00, 0x2A, 0x00,
        ];
        assert_eq!(bytes.as_ref(), expected);
    }
}
