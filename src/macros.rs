// ABOUTME: This module provides macros to reduce boilerplate in SMPP PDU implementations
// ABOUTME: Covers header-only PDUs, the shared submit_sm/deliver_sm body and builder setters

/// Macro for implementing codec traits on header-only PDUs (no body)
///
/// # Arguments
/// * `$pdu_type` - The PDU struct name (e.g., EnquireLink)
/// * `$command_id` - The CommandId variant (e.g., CommandId::EnquireLink)
macro_rules! impl_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        impl $crate::codec::Decodable for $pdu_type {
            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use bytes::Buf;

                // Header-only PDUs should have no body
                if buf.has_remaining() {
                    return Err($crate::codec::CodecError::FieldValidation {
                        field: concat!(stringify!($pdu_type), "_body"),
                        reason: concat!(stringify!($pdu_type), " PDU should have no body")
                            .to_string(),
                    });
                }

                Ok($pdu_type {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                })
            }
        }

        impl $crate::codec::Encodable for $pdu_type {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                $crate::codec::PduHeader::for_pdu($command_id, self.command_status, self.sequence_number)
                    .encode(buf);
                Ok(())
            }
        }
    };
}

/// Macro for generating constructor methods for header-only PDUs
///
/// - `new(sequence_number)` - Creates PDU with Ok status
/// - `error(sequence_number, status)` - Creates PDU with error status (responses only)
macro_rules! impl_header_only_constructors {
    ($pdu_type:ident) => {
        impl $pdu_type {
            /// Create a new PDU with Ok status
            pub fn new(sequence_number: u32) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                }
            }
        }
    };
    ($pdu_type:ident, response) => {
        $crate::macros::impl_header_only_constructors!($pdu_type);

        impl $pdu_type {
            /// Create a PDU with error status
            pub fn error(sequence_number: u32, status: $crate::datatypes::CommandStatus) -> Self {
                Self {
                    command_status: status,
                    sequence_number,
                }
            }
        }
    };
}

/// Codec plus constructors for a header-only PDU
macro_rules! impl_complete_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        $crate::macros::impl_header_only_pdu!($pdu_type, $command_id);
        $crate::macros::impl_header_only_constructors!($pdu_type);
    };
    ($pdu_type:ident, $command_id:expr, response) => {
        $crate::macros::impl_header_only_pdu!($pdu_type, $command_id);
        $crate::macros::impl_header_only_constructors!($pdu_type, response);
    };
}

/// Macro for the short message body shared by submit_sm and deliver_sm
///
/// Both PDUs carry the same mandatory fields followed by TLVs, so the codec,
/// the user data accessors and the TLV lookups are generated once.
macro_rules! impl_short_message_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        impl $pdu_type {
            /// Octets the SMSC treats as the message text: short_message, or the
            /// message_payload TLV when short_message is empty.
            pub fn user_data(&self) -> &[u8] {
                if self.short_message.is_empty() {
                    if let Some(payload) = self.tlv($crate::datatypes::tags::MESSAGE_PAYLOAD) {
                        return &payload.value;
                    }
                }
                &self.short_message
            }

            /// Store user data, moving it into message_payload when it does not
            /// fit the 254 octet short_message field.
            pub fn set_user_data(&mut self, octets: impl Into<bytes::Bytes>) {
                let octets: bytes::Bytes = octets.into();
                self.tlvs.retain(|tlv| tlv.tag != $crate::datatypes::tags::MESSAGE_PAYLOAD);
                if octets.len() > $crate::datatypes::MAX_SHORT_MESSAGE_LENGTH {
                    self.short_message = bytes::Bytes::new();
                    self.tlvs.push($crate::datatypes::Tlv::new(
                        $crate::datatypes::tags::MESSAGE_PAYLOAD,
                        octets,
                    ));
                } else {
                    self.short_message = octets;
                }
            }

            pub fn tlv(&self, tag: u16) -> Option<&$crate::datatypes::Tlv> {
                $crate::datatypes::find_tlv(&self.tlvs, tag)
            }

            /// Add a TLV, replacing any earlier one with the same tag
            pub fn push_tlv(&mut self, tlv: $crate::datatypes::Tlv) {
                self.tlvs.retain(|existing| existing.tag != tlv.tag);
                self.tlvs.push(tlv);
            }
        }

        impl $crate::codec::Encodable for $pdu_type {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                use bytes::BufMut;
                use $crate::codec::encode_cstring;

                if self.short_message.len() > $crate::datatypes::MAX_SHORT_MESSAGE_LENGTH {
                    return Err($crate::codec::CodecError::FieldValidation {
                        field: "short_message",
                        reason: format!(
                            "{} octets exceeds limit of {}",
                            self.short_message.len(),
                            $crate::datatypes::MAX_SHORT_MESSAGE_LENGTH
                        ),
                    });
                }

                $crate::codec::PduHeader::for_pdu(
                    $command_id,
                    $crate::datatypes::CommandStatus::Ok,
                    self.sequence_number,
                )
                .encode(buf);

                encode_cstring(buf, &self.service_type, 6, "service_type")?;
                buf.put_u8(self.source_addr_ton as u8);
                buf.put_u8(self.source_addr_npi as u8);
                encode_cstring(buf, &self.source_addr, 21, "source_addr")?;
                buf.put_u8(self.dest_addr_ton as u8);
                buf.put_u8(self.dest_addr_npi as u8);
                encode_cstring(buf, &self.destination_addr, 21, "destination_addr")?;
                buf.put_u8(self.esm_class.to_byte());
                buf.put_u8(self.protocol_id);
                buf.put_u8(self.priority_flag);
                encode_cstring(buf, &self.schedule_delivery_time, 17, "schedule_delivery_time")?;
                encode_cstring(buf, &self.validity_period, 17, "validity_period")?;
                buf.put_u8(self.registered_delivery.to_byte());
                buf.put_u8(self.replace_if_present_flag);
                buf.put_u8(self.data_coding);
                buf.put_u8(self.sm_default_msg_id);
                buf.put_u8(self.short_message.len() as u8);
                buf.put_slice(&self.short_message);

                for tlv in &self.tlvs {
                    tlv.encode(buf)?;
                }
                Ok(())
            }
        }

        impl $crate::codec::Decodable for $pdu_type {
            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use $crate::codec::{decode_cstring, decode_octets, decode_u8};
                use $crate::datatypes::{NumericPlanIndicator, TypeOfNumber};

                let service_type = decode_cstring(buf, 6, "service_type")?;
                let source_addr_ton = TypeOfNumber::from_wire(decode_u8(buf, "source_addr_ton")?);
                let source_addr_npi =
                    NumericPlanIndicator::from_wire(decode_u8(buf, "source_addr_npi")?);
                let source_addr = decode_cstring(buf, 21, "source_addr")?;
                let dest_addr_ton = TypeOfNumber::from_wire(decode_u8(buf, "dest_addr_ton")?);
                let dest_addr_npi =
                    NumericPlanIndicator::from_wire(decode_u8(buf, "dest_addr_npi")?);
                let destination_addr = decode_cstring(buf, 21, "destination_addr")?;
                let esm_class = $crate::datatypes::EsmClass::from_byte(decode_u8(buf, "esm_class")?);
                let protocol_id = decode_u8(buf, "protocol_id")?;
                let priority_flag = decode_u8(buf, "priority_flag")?;
                let schedule_delivery_time = decode_cstring(buf, 17, "schedule_delivery_time")?;
                let validity_period = decode_cstring(buf, 17, "validity_period")?;
                let registered_delivery = $crate::datatypes::RegisteredDelivery::from_byte(
                    decode_u8(buf, "registered_delivery")?,
                );
                let replace_if_present_flag = decode_u8(buf, "replace_if_present_flag")?;
                let data_coding = decode_u8(buf, "data_coding")?;
                let sm_default_msg_id = decode_u8(buf, "sm_default_msg_id")?;
                let sm_length = decode_u8(buf, "sm_length")? as usize;
                let short_message = decode_octets(buf, sm_length, "short_message")?;
                let tlvs = $crate::datatypes::decode_tlvs(buf)?;

                Ok($pdu_type {
                    sequence_number: header.sequence_number,
                    service_type,
                    source_addr_ton,
                    source_addr_npi,
                    source_addr,
                    dest_addr_ton,
                    dest_addr_npi,
                    destination_addr,
                    esm_class,
                    protocol_id,
                    priority_flag,
                    schedule_delivery_time,
                    validity_period,
                    registered_delivery,
                    replace_if_present_flag,
                    data_coding,
                    sm_default_msg_id,
                    short_message,
                    tlvs,
                })
            }
        }
    };
}

/// Macro for generating builder setter methods
///
/// For each field, generates:
/// ```ignore
/// pub fn $field(mut self, $field: $type) -> Self {
///     self.$field = $field;
///     self
/// }
/// ```
macro_rules! builder_setters {
    ($($field:ident: $type:ty),* $(,)?) => {
        $(
            pub fn $field(mut self, $field: $type) -> Self {
                self.$field = $field;
                self
            }
        )*
    };
}

// Make macros available to the rest of the crate
pub(crate) use {
    builder_setters, impl_complete_header_only_pdu, impl_header_only_constructors,
    impl_header_only_pdu, impl_short_message_pdu,
};
