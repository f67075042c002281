// ABOUTME: alert_notification sent by an SMSC when a subscriber becomes reachable again
// ABOUTME: Decoded so the session can log and drop it, it has no response PDU

use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
};
use crate::datatypes::{
    CommandId, CommandStatus, NumericPlanIndicator, Tlv, TypeOfNumber, decode_tlvs,
};
use bytes::{BufMut, BytesMut};
use std::io::Cursor;

const ADDR_SIZE: usize = 65;

#[derive(Clone, Debug, PartialEq)]
pub struct AlertNotification {
    pub sequence_number: u32,

    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    /// Subscriber that became available
    pub source_addr: String,
    pub esme_addr_ton: TypeOfNumber,
    pub esme_addr_npi: NumericPlanIndicator,
    /// ESME that asked to be alerted
    pub esme_addr: String,

    pub tlvs: Vec<Tlv>,
}

impl Encodable for AlertNotification {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::for_pdu(CommandId::AlertNotification, CommandStatus::Ok, self.sequence_number)
            .encode(buf);
        buf.put_u8(self.source_addr_ton as u8);
        buf.put_u8(self.source_addr_npi as u8);
        encode_cstring(buf, &self.source_addr, ADDR_SIZE, "source_addr")?;
        buf.put_u8(self.esme_addr_ton as u8);
        buf.put_u8(self.esme_addr_npi as u8);
        encode_cstring(buf, &self.esme_addr, ADDR_SIZE, "esme_addr")?;
        for tlv in &self.tlvs {
            tlv.encode(buf)?;
        }
        Ok(())
    }
}

impl Decodable for AlertNotification {
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Ok(AlertNotification {
            sequence_number: header.sequence_number,
            source_addr_ton: TypeOfNumber::from_wire(decode_u8(buf, "source_addr_ton")?),
            source_addr_npi: NumericPlanIndicator::from_wire(decode_u8(buf, "source_addr_npi")?),
            source_addr: decode_cstring(buf, ADDR_SIZE, "source_addr")?,
            esme_addr_ton: TypeOfNumber::from_wire(decode_u8(buf, "esme_addr_ton")?),
            esme_addr_npi: NumericPlanIndicator::from_wire(decode_u8(buf, "esme_addr_npi")?),
            esme_addr: decode_cstring(buf, ADDR_SIZE, "esme_addr")?,
            tlvs: decode_tlvs(buf)?,
        })
    }
}
