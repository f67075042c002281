use num_enum::TryFromPrimitive;

/// SMPP protocol version sent in bind and reported back in the
/// sc_interface_version TLV of the bind response.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum InterfaceVersion {
    SmppV33 = 0x33,
    #[default]
    SmppV34 = 0x34,
}

impl InterfaceVersion {
    /// Optional parameters, and with them SAR segmentation and
    /// more_messages_to_send, were introduced in v3.4.
    pub fn supports_tlvs(&self) -> bool {
        *self >= InterfaceVersion::SmppV34
    }
}

impl PartialOrd for InterfaceVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        (*self as u8).partial_cmp(&(*other as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_v34_carries_tlvs() {
        assert!(InterfaceVersion::SmppV34.supports_tlvs());
        assert!(!InterfaceVersion::SmppV33.supports_tlvs());
        assert_eq!(InterfaceVersion::try_from(0x33).ok(), Some(InterfaceVersion::SmppV33));
        assert!(InterfaceVersion::try_from(0x50).is_err());
    }
}
