use num_enum::TryFromPrimitive;
use serde::Deserialize;

/// Numbering Plan Indicator (NPI) used in addressing.
#[derive(TryFromPrimitive, Deserialize)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumericPlanIndicator {
    Unknown = 0b0000_0000,
    #[default]
    Isdn = 0b0000_0001,
    Data = 0b0000_0011,
    Telex = 0b0000_0100,
    LandMobile = 0b0000_0110,
    National = 0b0000_1000,
    Private = 0b0000_1001,
    Ermes = 0b0000_1010,
    Internet = 0b0000_1110,
    WapClientId = 0b0001_0010,
}

impl NumericPlanIndicator {
    /// Reserved values received from a peer are read as `Unknown`.
    pub fn from_wire(raw: u8) -> Self {
        NumericPlanIndicator::try_from(raw).unwrap_or(NumericPlanIndicator::Unknown)
    }
}
