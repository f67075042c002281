// ABOUTME: Delivery receipts reported by the SMSC in deliver_sm, and the parser for their text body
// ABOUTME: Dates in the body are read as local calendar time

use crate::datatypes::{DeliverSm, decode_text};
use chrono::{Local, NaiveDateTime, TimeZone};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Terminal (or interim) state of a submitted message, as reported in `stat:`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeliveryState {
    Enroute,
    Delivered,
    Expired,
    Deleted,
    Undeliverable,
    Accepted,
    Unknown,
    Rejected,
}

impl DeliveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::Enroute => "ENROUTE",
            DeliveryState::Delivered => "DELIVRD",
            DeliveryState::Expired => "EXPIRED",
            DeliveryState::Deleted => "DELETED",
            DeliveryState::Undeliverable => "UNDELIV",
            DeliveryState::Accepted => "ACCEPTD",
            DeliveryState::Unknown => "UNKNOWN",
            DeliveryState::Rejected => "REJECTD",
        }
    }

    /// No further receipts will follow for the message.
    pub fn is_final(&self) -> bool {
        !matches!(self, DeliveryState::Enroute | DeliveryState::Accepted)
    }
}

impl FromStr for DeliveryState {
    type Err = ReceiptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let state = match value.to_ascii_uppercase().as_str() {
            "ENROUTE" => DeliveryState::Enroute,
            "DELIVRD" => DeliveryState::Delivered,
            "EXPIRED" => DeliveryState::Expired,
            "DELETED" => DeliveryState::Deleted,
            "UNDELIV" => DeliveryState::Undeliverable,
            "ACCEPTD" => DeliveryState::Accepted,
            "UNKNOWN" => DeliveryState::Unknown,
            "REJECTD" => DeliveryState::Rejected,
            _ => return Err(ReceiptError::UnknownState(value.to_string())),
        };
        Ok(state)
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReceiptError {
    #[error("receipt has no `{0}` field")]
    MissingField(&'static str),

    #[error("receipt field `{field}` is not a valid date: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("receipt state {0:?} is not recognised")]
    UnknownState(String),
}

/// Fields carried in the text of a delivery receipt:
///
/// `id:<id> sub:<n> dlvrd:<n> submit date:<YYMMDDhhmm[ss]> done date:<YYMMDDhhmm[ss]> stat:<STATE> err:<code> text:<...>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptBody {
    pub id: String,
    pub submitted: NaiveDateTime,
    pub done: NaiveDateTime,
    pub state: DeliveryState,
    pub error: Option<String>,
    /// First characters of the original message, if the SMSC echoed them
    pub text: Option<String>,
}

impl FromStr for ReceiptBody {
    type Err = ReceiptError;

    fn from_str(body: &str) -> Result<Self, Self::Err> {
        // ASCII lowercasing keeps byte offsets identical to `body`
        let lower = body.to_ascii_lowercase();
        let text_at = key_offset(&lower, "text:");
        let fields_end = text_at.unwrap_or(body.len());

        let field = |key| field_value(body, &lower[..fields_end], key);

        let id = field("id:")
            .filter(|id| !id.is_empty())
            .ok_or(ReceiptError::MissingField("id"))?
            .to_string();
        let submitted = parse_date(
            "submit date",
            field("submit date:").ok_or(ReceiptError::MissingField("submit date"))?,
        )?;
        let done = parse_date(
            "done date",
            field("done date:").ok_or(ReceiptError::MissingField("done date"))?,
        )?;
        let state = field("stat:")
            .filter(|stat| !stat.is_empty())
            .ok_or(ReceiptError::MissingField("stat"))?
            .parse()?;
        let error = field("err:")
            .filter(|err| !err.is_empty())
            .map(str::to_string);
        let text = text_at.map(|at| body[at + "text:".len()..].trim().to_string());

        Ok(Self {
            id,
            submitted,
            done,
            state,
            error,
            text,
        })
    }
}

/// First whitespace-delimited token after `key`, looked up in the lowercased
/// copy but sliced from the original body.
fn field_value<'a>(body: &'a str, lower: &str, key: &str) -> Option<&'a str> {
    let start = key_offset(lower, key)? + key.len();
    let rest = &body[start..lower.len()];
    Some(rest.split_whitespace().next().unwrap_or(""))
}

/// Offset of `key` where it starts the haystack or follows whitespace.
fn key_offset(haystack: &str, key: &str) -> Option<usize> {
    let mut search = 0;
    while let Some(found) = haystack[search..].find(key) {
        let at = search + found;
        let boundary = haystack[..at]
            .chars()
            .next_back()
            .is_none_or(char::is_whitespace);
        if boundary {
            return Some(at);
        }
        search = at + key.len();
    }
    None
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDateTime, ReceiptError> {
    let invalid = || ReceiptError::InvalidDate {
        field,
        value: value.to_string(),
    };
    let digits = match value.len() {
        10 => format!("{value}00"),
        12 => value.to_string(),
        _ => return Err(invalid()),
    };
    let naive = NaiveDateTime::parse_from_str(&digits, "%y%m%d%H%M%S").map_err(|_| invalid())?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.naive_local())
        .ok_or_else(invalid)
}

/// A delivery receipt handed to the registered receipt handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReceipt {
    source: String,
    destination: String,
    text: String,
    message_id: String,
    submitted: NaiveDateTime,
    done: NaiveDateTime,
    state: DeliveryState,
    error: Option<String>,
}

impl DeliveryReceipt {
    /// Build a receipt from a deliver_sm flagged as an SMSC delivery receipt.
    pub(crate) fn from_pdu(pdu: &DeliverSm) -> Result<Self, ReceiptError> {
        let text = decode_text(pdu.data_coding, pdu.user_data());
        let body: ReceiptBody = text.parse()?;
        Ok(Self {
            source: pdu.source_addr.clone(),
            destination: pdu.destination_addr.clone(),
            text,
            message_id: body.id,
            submitted: body.submitted,
            done: body.done,
            state: body.state,
            error: body.error,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Full receipt text as received
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Identifier the SMSC returned when the message was submitted
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn submitted(&self) -> NaiveDateTime {
        self.submitted
    }

    pub fn done(&self) -> NaiveDateTime {
        self.done
    }

    pub fn state(&self) -> DeliveryState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::EsmClass;
    use chrono::NaiveDate;

    const BODY: &str = "id:0a1b2c3d sub:001 dlvrd:001 submit date:2310161230 done date:231016123145 stat:DELIVRD err:000 text:Hello there";

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn parses_standard_body() {
        let body: ReceiptBody = BODY.parse().unwrap();
        assert_eq!(body.id, "0a1b2c3d");
        assert_eq!(body.submitted, at(2023, 10, 16, 12, 30, 0));
        assert_eq!(body.done, at(2023, 10, 16, 12, 31, 45));
        assert_eq!(body.state, DeliveryState::Delivered);
        assert_eq!(body.error.as_deref(), Some("000"));
        assert_eq!(body.text.as_deref(), Some("Hello there"));
    }

    #[test]
    fn keys_are_case_insensitive() {
        let body: ReceiptBody =
            "ID:77 Submit Date:2401020304 Done Date:2401020305 Stat:undeliv Err:012"
                .parse()
                .unwrap();
        assert_eq!(body.id, "77");
        assert_eq!(body.state, DeliveryState::Undeliverable);
        assert_eq!(body.error.as_deref(), Some("012"));
        assert_eq!(body.text, None);
    }

    #[test]
    fn keys_inside_text_are_ignored() {
        let body: ReceiptBody =
            "id:1 submit date:2401020304 done date:2401020305 stat:EXPIRED text:stat:DELIVRD"
                .parse()
                .unwrap();
        assert_eq!(body.state, DeliveryState::Expired);
        assert_eq!(body.text.as_deref(), Some("stat:DELIVRD"));
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert_eq!(
            "submit date:2401020304 done date:2401020305 stat:DELIVRD".parse::<ReceiptBody>(),
            Err(ReceiptError::MissingField("id"))
        );
        assert_eq!(
            "id:1 submit date:2401020304 stat:DELIVRD".parse::<ReceiptBody>(),
            Err(ReceiptError::MissingField("done date"))
        );
        assert_eq!(
            "id:1 submit date:2401020304 done date:2401020305".parse::<ReceiptBody>(),
            Err(ReceiptError::MissingField("stat"))
        );
        assert!("hello, are you there?".parse::<ReceiptBody>().is_err());
    }

    #[test]
    fn bad_dates_and_states_are_rejected() {
        assert!(matches!(
            "id:1 submit date:24010203 done date:2401020305 stat:DELIVRD".parse::<ReceiptBody>(),
            Err(ReceiptError::InvalidDate { field: "submit date", .. })
        ));
        assert!(matches!(
            "id:1 submit date:2413020304 done date:2401020305 stat:DELIVRD".parse::<ReceiptBody>(),
            Err(ReceiptError::InvalidDate { .. })
        ));
        assert_eq!(
            "id:1 submit date:2401020304 done date:2401020305 stat:LOST".parse::<ReceiptBody>(),
            Err(ReceiptError::UnknownState("LOST".to_string()))
        );
    }

    #[test]
    fn receipt_from_deliver_sm() {
        let mut pdu = DeliverSm::new(9, "27820000001", "40404");
        pdu.esm_class = EsmClass::delivery_receipt();
        pdu.set_user_data(BODY.as_bytes().to_vec());

        let receipt = DeliveryReceipt::from_pdu(&pdu).unwrap();
        assert_eq!(receipt.source(), "27820000001");
        assert_eq!(receipt.destination(), "40404");
        assert_eq!(receipt.text(), BODY);
        assert_eq!(receipt.message_id(), "0a1b2c3d");
        assert_eq!(receipt.submitted(), at(2023, 10, 16, 12, 30, 0));
        assert_eq!(receipt.state(), DeliveryState::Delivered);
        assert!(receipt.state().is_final());
        assert_eq!(receipt.error(), Some("000"));
    }
}
