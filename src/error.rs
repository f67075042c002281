// ABOUTME: The single error type surfaced by the outbound gateway and its setup paths
// ABOUTME: Every failure is classified into a kind so callers can tell rejections from broken links

use crate::datatypes::CommandStatus;
use crate::transport::TransportError;
use std::fmt;
use thiserror::Error;

/// Classification of a gateway failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or malformed endpoint or credentials. Retrying will not help.
    Configuration,
    /// The request could not be built locally, e.g. text too long to segment.
    LocalApplication,
    /// The SMSC answered with a negative response. The session stays usable.
    RemoteApplication,
    /// Timeout, socket failure, protocol violation or a refused bind. The
    /// session is discarded.
    Communication,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::LocalApplication => "local application error",
            ErrorKind::RemoteApplication => "remote application error",
            ErrorKind::Communication => "communication error",
        };
        f.write_str(name)
    }
}

/// Error returned by [`OutboundGateway`](crate::gateway::OutboundGateway) and
/// the configuration helpers.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    kind: ErrorKind,
    message: String,
    status: Option<CommandStatus>,
    #[source]
    source: Option<crate::Error>,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn local(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LocalApplication, message)
    }

    pub fn with_source(mut self, source: impl Into<crate::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// command_status of the negative response, or of the rejected bind
    pub fn status(&self) -> Option<CommandStatus> {
        self.status
    }
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        let (kind, status) = match &err {
            TransportError::NegativeResponse { status, .. } => {
                (ErrorKind::RemoteApplication, Some(*status))
            }
            TransportError::BindRejected { status } => (ErrorKind::Communication, Some(*status)),
            _ => (ErrorKind::Communication, None),
        };
        Self {
            kind,
            message: err.to_string(),
            status,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::time::Duration;

    #[test]
    fn negative_response_is_remote_application() {
        let err = GatewayError::from(TransportError::NegativeResponse {
            operation: "submit_sm",
            status: CommandStatus::ThrottlingError,
        });
        assert_eq!(err.kind(), ErrorKind::RemoteApplication);
        assert_eq!(err.status(), Some(CommandStatus::ThrottlingError));
        assert!(err.source().is_some());
    }

    #[test]
    fn timeout_is_communication() {
        let err = GatewayError::from(TransportError::Timeout {
            operation: "submit_sm",
            after: Duration::from_secs(60),
        });
        assert_eq!(err.kind(), ErrorKind::Communication);
        assert_eq!(err.status(), None);
        assert!(err.to_string().starts_with("communication error: "));
    }

    #[test]
    fn rejected_bind_is_communication() {
        let err = GatewayError::from(TransportError::BindRejected {
            status: CommandStatus::InvalidSystemId,
        });
        assert_eq!(err.kind(), ErrorKind::Communication);
        assert_eq!(err.status(), Some(CommandStatus::InvalidSystemId));
    }

    #[test]
    fn configuration_error_display() {
        let err = GatewayError::configuration("URL must be configured");
        assert_eq!(err.to_string(), "configuration error: URL must be configured");
        assert!(err.source().is_none());
    }
}
