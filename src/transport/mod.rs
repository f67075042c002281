// ABOUTME: Seams between the gateway and the SMPP session that carries its PDUs
// ABOUTME: Connector binds a Transport, InboundListener receives every deliver_sm it reads

mod keepalive;
pub mod session;

pub use keepalive::KeepAliveConfig;
pub(crate) use keepalive::KeepAliveTracker;
pub use session::{SmppSession, TcpConnector};

use crate::codec::CodecError;
use crate::config::Endpoint;
use crate::datatypes::{
    BindType, CommandStatus, DeliverSm, NumericPlanIndicator, SubmitSm, SubmitSmResponse,
    TypeOfNumber,
};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Everything needed to open and bind one session.
#[derive(Debug, Clone)]
pub struct BindRequest {
    pub endpoint: Endpoint,
    pub bind_type: BindType,
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,
    pub address_range: String,
    pub connection_timeout: Duration,
    pub request_timeout: Duration,
    pub keep_alive: KeepAliveConfig,
    /// Concurrent inbound listener invocations, at least one
    pub threads: usize,
}

/// A bound SMPP session able to submit messages.
pub trait Transport: Send + Sync + 'static {
    /// Submit one PDU and wait for its response. A non-OK submit_sm_resp or a
    /// generic_nack is returned as [`TransportError::NegativeResponse`].
    fn submit(
        &self,
        pdu: SubmitSm,
    ) -> impl Future<Output = Result<SubmitSmResponse, TransportError>> + Send;

    /// Send unbind once, then release the connection whatever the outcome.
    fn unbind_and_close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Failure observed by background tasks (keep-alive, read loop) since
    /// the session was bound.
    fn failure(&self) -> Option<FailureKind> {
        None
    }
}

/// Opens sessions. The listener, when present, receives every deliver_sm.
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    fn connect(
        &self,
        request: &BindRequest,
        listener: Option<Arc<dyn InboundListener>>,
    ) -> impl Future<Output = Result<Self::Transport, TransportError>> + Send;
}

/// Callback invoked for each inbound deliver_sm.
///
/// It may be called concurrently from several workers; the returned status
/// is sent back in deliver_sm_resp.
pub trait InboundListener: Send + Sync {
    fn receive(&self, pdu: &DeliverSm) -> Result<(), Rejection>;
}

/// Non-OK answer to a deliver_sm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: CommandStatus,
    pub reason: String,
}

impl Rejection {
    pub fn new(status: CommandStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// Redelivery is welcome later
    pub fn temporary(reason: impl Into<String>) -> Self {
        Self::new(CommandStatus::ReceiverTemporaryAppError, reason)
    }

    /// Do not redeliver
    pub fn permanent(reason: impl Into<String>) -> Self {
        Self::new(CommandStatus::ReceiverPermanentAppError, reason)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{operation} rejected by SMSC: {status}")]
    NegativeResponse {
        operation: &'static str,
        status: CommandStatus,
    },

    /// The SMSC refused the bind, so no session exists.
    #[error("bind rejected by SMSC: {status}")]
    BindRejected { status: CommandStatus },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol violation: {0}")]
    Codec(#[from] CodecError),

    #[error("unexpected PDU {command_id:#010x} in answer to {operation}")]
    UnexpectedPdu {
        operation: &'static str,
        command_id: u32,
    },

    #[error("session closed")]
    Closed,
}

/// What kind of failure a session has seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NegativeResponse,
    Timeout,
    Io,
    Protocol,
    Closed,
}

impl FailureKind {
    /// Only a negative response leaves the session fit for reuse: the peer is
    /// reachable and simply refused one request.
    pub fn keeps_session_valid(&self) -> bool {
        matches!(self, FailureKind::NegativeResponse)
    }
}

impl TransportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TransportError::NegativeResponse { .. } => FailureKind::NegativeResponse,
            TransportError::Timeout { .. } => FailureKind::Timeout,
            TransportError::Io(_) => FailureKind::Io,
            TransportError::Codec(_) | TransportError::UnexpectedPdu { .. } => FailureKind::Protocol,
            TransportError::BindRejected { .. } | TransportError::Closed => FailureKind::Closed,
        }
    }
}
