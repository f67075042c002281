/// registered_delivery octet of submit_sm / deliver_sm.
///
/// Only the SMSC delivery receipt bits (1..0) are interpreted; the SME
/// acknowledgement and intermediate notification bits pass through untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct RegisteredDelivery(u8);

impl RegisteredDelivery {
    /// No SMSC delivery receipt requested
    pub const NONE: RegisteredDelivery = RegisteredDelivery(0x00);
    /// SMSC delivery receipt requested on final success or failure
    pub const SMSC_RECEIPT: RegisteredDelivery = RegisteredDelivery(0x01);

    pub fn from_byte(value: u8) -> Self {
        Self(value)
    }

    /// Receipt on success or failure when `requested`, none otherwise
    pub fn receipt(requested: bool) -> Self {
        if requested {
            Self::SMSC_RECEIPT
        } else {
            Self::NONE
        }
    }

    pub fn to_byte(&self) -> u8 {
        self.0
    }

    pub fn requests_receipt(&self) -> bool {
        self.0 & 0b0000_0011 != 0
    }
}
