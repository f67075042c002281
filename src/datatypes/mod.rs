mod alert_notification;
mod bind;
mod command_id;
mod command_status;
mod data_coding;
mod deliver_sm;
mod enquire_link;
mod esm_class;
mod generic_nack;
mod interface_version;
mod numeric_plan_indicator;
mod registered_delivery;
mod submit_sm;
mod tlv;
mod type_of_number;
mod unbind;

pub use alert_notification::AlertNotification;
pub use bind::{Bind, BindResponse, BindType};
pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use data_coding::{Alphabet, DataCoding, MessageClass, decode_text};
pub use deliver_sm::{DeliverSm, DeliverSmResponse};
pub use enquire_link::{EnquireLink, EnquireLinkResponse};
pub use esm_class::{EsmClass, MessageType, MessagingMode};
pub use generic_nack::GenericNack;
pub use interface_version::InterfaceVersion;
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use registered_delivery::RegisteredDelivery;
pub use submit_sm::{SubmitSm, SubmitSmResponse};
pub use tlv::{Tlv, decode_tlvs, find_tlv, tags};
pub use type_of_number::TypeOfNumber;
pub use unbind::{Unbind, UnbindResponse};

/// Largest user data carried in the short_message field itself
pub const MAX_SHORT_MESSAGE_LENGTH: usize = 254;
