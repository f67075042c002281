use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_complete_header_only_pdu;

/// Link liveness probe. Either side may send it once bound.
#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLink {
    // Always ESME_ROK on a request
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLinkResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl_complete_header_only_pdu!(EnquireLink, CommandId::EnquireLink);
impl_complete_header_only_pdu!(EnquireLinkResponse, CommandId::EnquireLinkResp, response);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Encodable, Frame};
    use std::io::Cursor;

    #[test]
    fn enquire_link_to_bytes() {
        let bytes = EnquireLink::new(5).to_bytes().unwrap();
        let expected: [u8; 16] = [
            0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x15, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x05,
        ];
        assert_eq!(bytes.as_ref(), expected);
    }

    #[test]
    fn enquire_link_response_parses() {
        let bytes = EnquireLinkResponse::new(5).to_bytes().unwrap();
        let frame = Frame::parse(&mut Cursor::new(bytes.as_ref())).unwrap();
        assert_eq!(frame, Frame::EnquireLinkResp(EnquireLinkResponse::new(5)));
    }

    #[test]
    fn enquire_link_with_body_is_rejected() {
        let mut bytes = EnquireLink::new(5).to_bytes().unwrap().to_vec();
        bytes.push(0x00);
        bytes[3] = 0x11;
        assert!(Frame::parse(&mut Cursor::new(&bytes[..])).is_err());
    }
}
