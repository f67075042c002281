use crate::codec::CodecError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Optional parameter tags used by this gateway.
pub mod tags {
    pub const RECEIPTED_MESSAGE_ID: u16 = 0x001E;
    pub const SAR_MSG_REF_NUM: u16 = 0x020C;
    pub const SAR_TOTAL_SEGMENTS: u16 = 0x020E;
    pub const SAR_SEGMENT_SEQNUM: u16 = 0x020F;
    pub const SC_INTERFACE_VERSION: u16 = 0x0210;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
    pub const MORE_MESSAGES_TO_SEND: u16 = 0x0426;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tlv {
    /// The Tag field is used to uniquely identify the particular optional parameter in question.
    pub tag: u16,

    /// The Value field contains the actual data for the optional parameter in question.
    /// Its length is written on the wire as the Length field.
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    pub fn from_u8(tag: u16, value: u8) -> Self {
        Self::new(tag, vec![value])
    }

    pub fn from_u16(tag: u16, value: u16) -> Self {
        Self::new(tag, value.to_be_bytes().to_vec())
    }

    /// C-octet string value, written with its NUL terminator.
    pub fn from_cstring(tag: u16, value: &str) -> Self {
        let mut bytes = Vec::with_capacity(value.len() + 1);
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);
        Self::new(tag, bytes)
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self.value.as_ref() {
            [value] => Some(*value),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self.value.as_ref() {
            [hi, lo] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }

    /// Value read as a C-octet string; a missing terminator is tolerated.
    pub fn as_cstring(&self) -> String {
        let end = self
            .value
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.value.len());
        String::from_utf8_lossy(&self.value[..end]).into_owned()
    }

    pub fn encoded_size(&self) -> usize {
        4 + self.value.len()
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let length = u16::try_from(self.value.len()).map_err(|_| {
            CodecError::TlvError(format!(
                "value of tag {:#06x} is {} octets, limit is {}",
                self.tag,
                self.value.len(),
                u16::MAX
            ))
        })?;
        buf.put_u16(self.tag);
        buf.put_u16(length);
        buf.put_slice(&self.value);
        Ok(())
    }

    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < 4 {
            return Err(CodecError::TlvError(format!(
                "{} trailing octets cannot hold a TLV header",
                buf.remaining()
            )));
        }
        let tag = buf.get_u16();
        let length = buf.get_u16() as usize;
        if buf.remaining() < length {
            return Err(CodecError::TlvError(format!(
                "tag {tag:#06x} declares {length} octets but only {} remain",
                buf.remaining()
            )));
        }
        let value = buf.copy_to_bytes(length);
        Ok(Self { tag, value })
    }
}

/// Decode every TLV left in the PDU body.
pub fn decode_tlvs(buf: &mut Cursor<&[u8]>) -> Result<Vec<Tlv>, CodecError> {
    let mut tlvs = Vec::new();
    while buf.has_remaining() {
        tlvs.push(Tlv::decode(buf)?);
    }
    Ok(tlvs)
}

pub fn find_tlv(tlvs: &[Tlv], tag: u16) -> Option<&Tlv> {
    tlvs.iter().find(|tlv| tlv.tag == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_u16_tlv() {
        let mut buf = BytesMut::new();
        Tlv::from_u16(tags::SAR_MSG_REF_NUM, 0xBEEF)
            .encode(&mut buf)
            .unwrap();
        assert_eq!(buf.as_ref(), &[0x02, 0x0C, 0x00, 0x02, 0xBE, 0xEF]);
    }

    #[test]
    fn decode_sequence_of_tlvs() {
        let data = [
            0x02, 0x0E, 0x00, 0x01, 0x03, // sar_total_segments = 3
            0x00, 0x1E, 0x00, 0x04, b'a', b'b', b'c', 0x00, // receipted_message_id = "abc"
        ];
        let mut cursor = Cursor::new(&data[..]);
        let tlvs = decode_tlvs(&mut cursor).unwrap();

        assert_eq!(tlvs.len(), 2);
        assert_eq!(tlvs[0].as_u8(), Some(3));
        assert_eq!(
            find_tlv(&tlvs, tags::RECEIPTED_MESSAGE_ID).map(Tlv::as_cstring),
            Some("abc".to_string())
        );
    }

    #[test]
    fn truncated_value_is_rejected() {
        let data = [0x04, 0x24, 0x00, 0x05, b'h', b'i'];
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            decode_tlvs(&mut cursor),
            Err(CodecError::TlvError(_))
        ));
    }

    #[test]
    fn width_mismatch_yields_none() {
        let tlv = Tlv::from_u8(tags::MORE_MESSAGES_TO_SEND, 1);
        assert_eq!(tlv.as_u8(), Some(1));
        assert_eq!(tlv.as_u16(), None);
    }
}
