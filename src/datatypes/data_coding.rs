// ABOUTME: SMPP data_coding built from an alphabet and an optional GSM message class
// ABOUTME: Mirrors the "general data coding" group (bits 7..6 = 00) used for plain text submissions

use serde::Deserialize;
use std::fmt;

/// Character alphabet of the short message user data (data_coding bits 3..2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alphabet {
    /// SMSC default alphabet (typically GSM 7-bit)
    #[default]
    Default,
    /// 8-bit binary data
    EightBit,
    /// UCS-2 (ISO/IEC-10646)
    Ucs2,
}

impl Alphabet {
    fn to_bits(self) -> u8 {
        match self {
            Alphabet::Default => 0x00,
            Alphabet::EightBit => 0x04,
            Alphabet::Ucs2 => 0x08,
        }
    }
}

/// GSM message class (data_coding bits 1..0, only meaningful when bit 4 is set)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageClass {
    /// Class 0: displayed immediately (flash SMS)
    Flash,
    /// Class 1: mobile equipment specific
    MobileEquipment,
    /// Class 2: SIM specific
    SimSpecific,
    /// Class 3: terminal equipment specific
    TerminalEquipment,
}

impl MessageClass {
    fn to_bits(self) -> u8 {
        match self {
            MessageClass::Flash => 0x00,
            MessageClass::MobileEquipment => 0x01,
            MessageClass::SimSpecific => 0x02,
            MessageClass::TerminalEquipment => 0x03,
        }
    }
}

/// Data coding scheme sent with every submitted segment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DataCoding {
    alphabet: Alphabet,
    message_class: Option<MessageClass>,
}

impl DataCoding {
    /// General data coding with no compression.
    pub fn general(alphabet: Alphabet, message_class: Option<MessageClass>) -> Self {
        Self {
            alphabet,
            message_class,
        }
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn message_class(&self) -> Option<MessageClass> {
        self.message_class
    }

    /// Returns the raw u8 value for wire protocol
    pub fn to_byte(&self) -> u8 {
        let class_bits = match self.message_class {
            Some(class) => 0x10 | class.to_bits(),
            None => 0x00,
        };
        self.alphabet.to_bits() | class_bits
    }

    /// Encode text into the octets carried by short_message/message_payload.
    ///
    /// UCS2 is sent as UTF-16BE; every other alphabet passes the UTF-8 bytes
    /// through and leaves transcoding to the SMSC.
    pub fn encode_text(&self, text: &str) -> Vec<u8> {
        match self.alphabet {
            Alphabet::Ucs2 => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Alphabet::Default | Alphabet::EightBit => text.as_bytes().to_vec(),
        }
    }
}

/// Decode the user data of an inbound PDU according to its raw data_coding.
/// Invalid sequences are replaced rather than rejected.
pub fn decode_text(data_coding: u8, octets: &[u8]) -> String {
    if data_coding & 0xC0 == 0 && data_coding & 0x0C == 0x08 {
        let units: Vec<u16> = octets
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8_lossy(octets).into_owned()
}

impl fmt::Debug for DataCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataCoding")
            .field("alphabet", &self.alphabet)
            .field("message_class", &self.message_class)
            .field("byte", &format_args!("{:#04x}", self.to_byte()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_zero() {
        assert_eq!(DataCoding::default().to_byte(), 0x00);
    }

    #[test]
    fn alphabet_bits() {
        assert_eq!(DataCoding::general(Alphabet::EightBit, None).to_byte(), 0x04);
        assert_eq!(DataCoding::general(Alphabet::Ucs2, None).to_byte(), 0x08);
    }

    #[test]
    fn message_class_sets_class_indicator() {
        let flash = DataCoding::general(Alphabet::Default, Some(MessageClass::Flash));
        assert_eq!(flash.to_byte(), 0x10);

        let ucs2_sim = DataCoding::general(Alphabet::Ucs2, Some(MessageClass::SimSpecific));
        assert_eq!(ucs2_sim.to_byte(), 0x1A);
    }

    #[test]
    fn ucs2_text_is_utf16_big_endian() {
        let coding = DataCoding::general(Alphabet::Ucs2, None);
        assert_eq!(coding.encode_text("hé"), vec![0x00, 0x68, 0x00, 0xE9]);
        assert_eq!(decode_text(0x08, &[0x00, 0x68, 0x00, 0xE9]), "hé");
    }

    #[test]
    fn default_alphabet_passes_bytes_through() {
        assert_eq!(DataCoding::default().encode_text("abc"), b"abc".to_vec());
        assert_eq!(decode_text(0x00, b"abc"), "abc");
        assert_eq!(decode_text(0x00, &[0x61, 0xFF]), "a\u{FFFD}");
    }
}
