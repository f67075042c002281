// ABOUTME: Outbound gateway submitting messages over pooled sessions
// ABOUTME: Texts over 160 characters go out as SAR-tagged segments sharing one reference number

pub mod segment;

use crate::config::{Endpoint, EndpointConfig};
use crate::datatypes::{BindType, RegisteredDelivery, SubmitSm, Tlv, tags};
use crate::error::GatewayError;
use crate::message::OutboundMessage;
use crate::session::{SessionFactory, SessionHandle, SessionPool};
use crate::transport::{Connector, InboundListener, TcpConnector};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Submits messages to one SMSC over a fixed pool of bound sessions.
///
/// ```rust,no_run
/// use smpp_gateway::config::EndpointConfig;
/// use smpp_gateway::gateway::OutboundGateway;
/// use smpp_gateway::message::OutboundMessage;
///
/// # async fn run() -> Result<(), smpp_gateway::GatewayError> {
/// let config = EndpointConfig::new("smpp://smsc.example.com:2775", "system_id", "secret");
/// let gateway = OutboundGateway::builder(config).build();
/// gateway.start().await?;
///
/// let message = OutboundMessage::new("40404", "27820000001", "Your code is 1234");
/// let message_id = gateway.send(&message, true).await?;
/// println!("accepted as {message_id:?}");
///
/// gateway.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct OutboundGateway<C: Connector = TcpConnector> {
    pool: SessionPool<C>,
    flip_mmts: bool,
    endpoint: OnceCell<Endpoint>,
}

impl OutboundGateway<TcpConnector> {
    pub fn builder(config: EndpointConfig) -> GatewayBuilder<TcpConnector> {
        GatewayBuilder::new(config)
    }
}

impl<C: Connector> OutboundGateway<C> {
    fn config(&self) -> &EndpointConfig {
        self.pool.factory().config()
    }

    pub fn pool(&self) -> &SessionPool<C> {
        &self.pool
    }

    /// Validate the configuration once; later calls reuse the first result.
    async fn ensure_configured(&self) -> Result<&Endpoint, GatewayError> {
        self.endpoint
            .get_or_try_init(|| async { self.config().validate() })
            .await
    }

    /// Validate the configuration and open every pooled session, so that
    /// inbound delivery starts without waiting for the first send.
    pub async fn start(&self) -> Result<(), GatewayError> {
        let endpoint = self.ensure_configured().await?;
        self.pool.fill().await?;
        info!(
            endpoint = %endpoint,
            sessions = self.pool.settings().maximum,
            "outbound gateway started"
        );
        Ok(())
    }

    /// Submit `message`, segmenting it when needed, and return the message id
    /// assigned by the SMSC.
    ///
    /// For a segmented text the first id returned, in segment order, is the
    /// id of the whole message. `None` means the SMSC returned no id at all.
    pub async fn send(
        &self,
        message: &OutboundMessage,
        request_receipt: bool,
    ) -> Result<Option<String>, GatewayError> {
        self.ensure_configured().await?;
        debug!(?message, request_receipt, "sending message");

        let started = Instant::now();
        let segments = segment::split(message.text())?;
        let session = self.pool.lease().await?;
        let result = self
            .submit_segments(&session, message, &segments, request_receipt)
            .await;
        let held_ms = session.held_for().as_millis() as u64;
        drop(session);
        debug!(held_ms, "session released");

        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(message_id) => info!(
                duration_ms,
                segments = segments.len(),
                message_id = message_id.as_deref().unwrap_or(""),
                "message sent"
            ),
            Err(err) => warn!(
                duration_ms,
                segments = segments.len(),
                kind = %err.kind(),
                error = %err,
                "message send failed"
            ),
        }
        result
    }

    async fn submit_segments(
        &self,
        session: &SessionHandle<C::Transport>,
        message: &OutboundMessage,
        segments: &[&str],
        request_receipt: bool,
    ) -> Result<Option<String>, GatewayError> {
        if let [text] = segments {
            let more = segment::more_messages_to_send(false, self.flip_mmts);
            let pdu = self
                .submit_sm(message, text, request_receipt)
                .with_tlv(Tlv::from_u8(tags::MORE_MESSAGES_TO_SEND, more));
            let response = session.submit(pdu).await?;
            return Ok(response.message_id().map(str::to_string));
        }

        let reference: u16 = rand::random();
        // split() caps the count at 255
        let total = segments.len() as u8;
        let mut message_id = None;

        for (seqnum, text) in (1..=total).zip(segments) {
            let more = segment::more_messages_to_send(seqnum != total, self.flip_mmts);
            let pdu = self
                .submit_sm(message, text, request_receipt && seqnum == 1)
                .with_tlv(Tlv::from_u8(tags::MORE_MESSAGES_TO_SEND, more))
                .with_tlv(Tlv::from_u16(tags::SAR_MSG_REF_NUM, reference))
                .with_tlv(Tlv::from_u8(tags::SAR_SEGMENT_SEQNUM, seqnum))
                .with_tlv(Tlv::from_u8(tags::SAR_TOTAL_SEGMENTS, total));

            let response = session.submit(pdu).await?;
            debug!(reference, seqnum, total, message_id = ?response.message_id(), "segment accepted");
            if message_id.is_none() {
                message_id = response.message_id().map(str::to_string);
            }
        }

        Ok(message_id)
    }

    fn submit_sm(&self, message: &OutboundMessage, text: &str, request_receipt: bool) -> SubmitSm {
        let config = self.config();
        let data_coding = config.data_coding();
        let mut pdu = SubmitSm::new(message.source(), message.destination())
            .source_addr_ton(config.source_ton)
            .source_addr_npi(config.source_npi)
            .dest_addr_ton(config.destination_ton)
            .dest_addr_npi(config.destination_npi)
            .registered_delivery(RegisteredDelivery::receipt(request_receipt))
            .data_coding(data_coding.to_byte())
            .user_data_octets(data_coding.encode_text(text));
        pdu.priority_flag = 1;
        pdu
    }

    /// Close every idle session and refuse further sends.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
        info!("outbound gateway shut down");
    }
}

/// Options for an [`OutboundGateway`] beyond its [`EndpointConfig`].
pub struct GatewayBuilder<C> {
    config: EndpointConfig,
    bind_type: BindType,
    flip_mmts: bool,
    listener: Option<Arc<dyn InboundListener>>,
    connector: C,
}

impl GatewayBuilder<TcpConnector> {
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            bind_type: BindType::default(),
            flip_mmts: false,
            listener: None,
            connector: TcpConnector,
        }
    }
}

impl<C: Connector> GatewayBuilder<C> {
    /// Role of every pooled session, transmitter unless changed.
    pub fn bind_type(mut self, bind_type: BindType) -> Self {
        self.bind_type = bind_type;
        self
    }

    /// Invert more_messages_to_send for SMSCs that interpret it the other way.
    pub fn flip_mmts(mut self, flip: bool) -> Self {
        self.flip_mmts = flip;
        self
    }

    /// Receive deliver_sm PDUs arriving on the pooled sessions.
    pub fn listener<L: InboundListener + 'static>(mut self, listener: Arc<L>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Open sessions through a different connector.
    pub fn connector<D: Connector>(self, connector: D) -> GatewayBuilder<D> {
        GatewayBuilder {
            config: self.config,
            bind_type: self.bind_type,
            flip_mmts: self.flip_mmts,
            listener: self.listener,
            connector,
        }
    }

    pub fn build(self) -> OutboundGateway<C> {
        let factory = SessionFactory::new(self.connector, self.config, self.bind_type, self.listener);
        OutboundGateway {
            pool: SessionPool::new(factory),
            flip_mmts: self.flip_mmts,
            endpoint: OnceCell::new(),
        }
    }
}
