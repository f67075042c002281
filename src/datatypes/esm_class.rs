// ABOUTME: SMPP esm_class bitfield split into messaging mode, message type and GSM features
// ABOUTME: Lets the inbound path tell SMSC delivery receipts apart from mobile originated messages

use std::fmt;

const MODE_MASK: u8 = 0b0000_0011;
const TYPE_MASK: u8 = 0b0011_1100;
const UDHI: u8 = 0b0100_0000;
const REPLY_PATH: u8 = 0b1000_0000;

/// The esm_class octet of submit_sm / deliver_sm.
///
/// Bits 1..0 carry the messaging mode, bits 5..2 the message type and bits
/// 7..6 the GSM network specific features. Unlike the mode, the message type
/// is only meaningful on deliver_sm, where the SMSC uses it to flag receipts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EsmClass(u8);

impl EsmClass {
    pub fn from_byte(value: u8) -> Self {
        Self(value)
    }

    /// Default mode, default message type, no features.
    pub fn default_submit() -> Self {
        Self(0)
    }

    /// deliver_sm esm_class used by an SMSC for a delivery receipt
    pub fn delivery_receipt() -> Self {
        Self(MessageType::SmscDeliveryReceipt.to_bits())
    }

    pub fn to_byte(&self) -> u8 {
        self.0
    }

    pub fn messaging_mode(&self) -> MessagingMode {
        match self.0 & MODE_MASK {
            0b01 => MessagingMode::Datagram,
            0b10 => MessagingMode::Forward,
            0b11 => MessagingMode::StoreAndForward,
            _ => MessagingMode::Default,
        }
    }

    pub fn message_type(&self) -> MessageType {
        MessageType::from_bits(self.0 & TYPE_MASK)
    }

    /// Returns true when the SMSC flagged this PDU as a delivery receipt
    pub fn is_delivery_receipt(&self) -> bool {
        self.message_type() == MessageType::SmscDeliveryReceipt
    }

    pub fn has_udhi(&self) -> bool {
        self.0 & UDHI != 0
    }

    pub fn has_reply_path(&self) -> bool {
        self.0 & REPLY_PATH != 0
    }
}

impl fmt::Debug for EsmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EsmClass")
            .field("mode", &self.messaging_mode())
            .field("type", &self.message_type())
            .field("udhi", &self.has_udhi())
            .finish()
    }
}

/// Messaging mode (bits 1..0)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MessagingMode {
    Default,
    Datagram,
    Forward,
    StoreAndForward,
}

/// Message type (bits 5..2)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MessageType {
    Default,
    SmscDeliveryReceipt,
    SmeDeliveryAcknowledgement,
    SmeManualAcknowledgement,
    ConversationAbort,
    IntermediateDeliveryNotification,
    Reserved(u8),
}

impl MessageType {
    fn from_bits(bits: u8) -> Self {
        match bits >> 2 {
            0b0000 => MessageType::Default,
            0b0001 => MessageType::SmscDeliveryReceipt,
            0b0010 => MessageType::SmeDeliveryAcknowledgement,
            0b0100 => MessageType::SmeManualAcknowledgement,
            0b0110 => MessageType::ConversationAbort,
            0b1000 => MessageType::IntermediateDeliveryNotification,
            other => MessageType::Reserved(other),
        }
    }

    fn to_bits(self) -> u8 {
        let value = match self {
            MessageType::Default => 0b0000,
            MessageType::SmscDeliveryReceipt => 0b0001,
            MessageType::SmeDeliveryAcknowledgement => 0b0010,
            MessageType::SmeManualAcknowledgement => 0b0100,
            MessageType::ConversationAbort => 0b0110,
            MessageType::IntermediateDeliveryNotification => 0b1000,
            MessageType::Reserved(bits) => bits & 0b1111,
        };
        value << 2
    }
}
