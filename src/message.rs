use crate::datatypes::{DeliverSm, decode_text, tags};

/// A message to submit through the [`OutboundGateway`](crate::gateway::OutboundGateway).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    source: String,
    destination: String,
    text: String,
    id: Option<String>,
}

impl OutboundMessage {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            text: text.into(),
            id: None,
        }
    }

    /// Attach an identifier assigned by the calling application.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// A mobile originated message delivered by the SMSC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    source: String,
    destination: String,
    text: String,
    id: String,
}

impl InboundMessage {
    pub(crate) fn from_pdu(pdu: &DeliverSm) -> Self {
        let id = pdu
            .tlv(tags::RECEIPTED_MESSAGE_ID)
            .map(|tlv| tlv.as_cstring())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| pdu.sequence_number.to_string());

        Self {
            source: pdu.source_addr.clone(),
            destination: pdu.destination_addr.clone(),
            text: decode_text(pdu.data_coding, pdu.user_data()),
            id,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Provider assigned identifier
    pub fn id(&self) -> &str {
        &self.id
    }
}
