use crate::datatypes::{SubmitSm, SubmitSmResponse};
use crate::transport::{FailureKind, Transport, TransportError};
use parking_lot::Mutex;
use tracing::debug;

/// One bound session plus the last failure observed on it.
pub struct SessionHandle<T> {
    transport: T,
    last_failure: Mutex<Option<FailureKind>>,
}

impl<T: Transport> SessionHandle<T> {
    pub(crate) fn new(transport: T) -> Self {
        Self {
            transport,
            last_failure: Mutex::new(None),
        }
    }

    /// Submit one PDU, remembering the kind of any failure.
    pub async fn submit(&self, pdu: SubmitSm) -> Result<SubmitSmResponse, TransportError> {
        let result = self.transport.submit(pdu).await;
        if let Err(err) = &result {
            debug!(error = %err, "submit failed on session");
            *self.last_failure.lock() = Some(err.kind());
        }
        result
    }

    /// Most recent failure, preferring one reported by the transport's
    /// background tasks when that one invalidates the session.
    pub fn last_failure(&self) -> Option<FailureKind> {
        let recorded = *self.last_failure.lock();
        match self.transport.failure() {
            Some(background) if !background.keeps_session_valid() => Some(background),
            background => recorded.or(background),
        }
    }

    /// Whether the session may go back into the pool.
    ///
    /// A session that has only seen negative responses is still valid: the
    /// SMSC is reachable and merely refused a request. Any other failure means
    /// it must be discarded. Background failures are recorded as they happen,
    /// so a full validation reads the same state as a quick one.
    pub fn is_valid(&self, _full_validation: bool) -> bool {
        self.last_failure()
            .is_none_or(|failure| failure.keeps_session_valid())
    }

    /// Unbind and release the connection. One attempt, no retry.
    pub async fn close(&self) -> Result<(), TransportError> {
        self.transport.unbind_and_close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::CommandStatus;
    use std::time::Duration;

    struct Scripted {
        answer: fn() -> Result<SubmitSmResponse, TransportError>,
        background: Option<FailureKind>,
    }

    impl Transport for Scripted {
        async fn submit(&self, _pdu: SubmitSm) -> Result<SubmitSmResponse, TransportError> {
            (self.answer)()
        }

        async fn unbind_and_close(&self) -> Result<(), TransportError> {
            Ok(())
        }

        fn failure(&self) -> Option<FailureKind> {
            self.background
        }
    }

    fn handle(answer: fn() -> Result<SubmitSmResponse, TransportError>) -> SessionHandle<Scripted> {
        SessionHandle::new(Scripted {
            answer,
            background: None,
        })
    }

    fn pdu() -> SubmitSm {
        SubmitSm::new("40404", "27820000001")
    }

    #[tokio::test]
    async fn fresh_session_is_valid() {
        let handle = handle(|| Ok(SubmitSmResponse::new(1, "id-1")));
        assert!(handle.is_valid(true));
        handle.submit(pdu()).await.unwrap();
        assert!(handle.is_valid(false));
        assert_eq!(handle.last_failure(), None);
    }

    #[tokio::test]
    async fn negative_response_keeps_session_valid() {
        let handle = handle(|| {
            Err(TransportError::NegativeResponse {
                operation: "submit_sm",
                status: CommandStatus::InvalidDestinationAddress,
            })
        });
        assert!(handle.submit(pdu()).await.is_err());
        assert_eq!(handle.last_failure(), Some(FailureKind::NegativeResponse));
        assert!(handle.is_valid(true));
    }

    #[tokio::test]
    async fn timeout_invalidates_session() {
        let handle = handle(|| {
            Err(TransportError::Timeout {
                operation: "submit_sm",
                after: Duration::from_secs(60),
            })
        });
        assert!(handle.submit(pdu()).await.is_err());
        assert!(!handle.is_valid(false));
        assert!(!handle.is_valid(true));
    }

    #[test]
    fn background_failure_invalidates_session() {
        let handle = SessionHandle::new(Scripted {
            answer: || Ok(SubmitSmResponse::new(1, "id")),
            background: Some(FailureKind::Closed),
        });
        assert_eq!(handle.last_failure(), Some(FailureKind::Closed));
        assert!(!handle.is_valid(false));
    }
}
