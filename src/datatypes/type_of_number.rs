use num_enum::TryFromPrimitive;
use serde::Deserialize;

/// Type of Number (TON) used in addressing.
#[derive(TryFromPrimitive, Deserialize)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TypeOfNumber {
    Unknown = 0b0000_0000,
    #[default]
    International = 0b0000_0001,
    National = 0b0000_0010,
    NetworkSpecific = 0b0000_0011,
    SubscriberNumber = 0b0000_0100,
    Alphanumeric = 0b0000_0101,
    Abbreviated = 0b0000_0110,
}

impl TypeOfNumber {
    /// Reserved values received from a peer are read as `Unknown`.
    pub fn from_wire(raw: u8) -> Self {
        TypeOfNumber::try_from(raw).unwrap_or(TypeOfNumber::Unknown)
    }
}
