use std::time::{Duration, Instant};
use tracing::trace;
use uuid::Uuid;

/// State owned by a single inbound dispatch.
///
/// A fresh context, with a new correlation id, is created for every PDU and
/// dropped when the handler returns, whatever the outcome.
#[derive(Debug)]
pub struct ProcessingContext {
    transaction_id: Uuid,
    correlation_id: Uuid,
    started: Instant,
}

impl ProcessingContext {
    pub(crate) fn start() -> Self {
        let transaction_id = Uuid::new_v4();
        Self {
            transaction_id,
            correlation_id: transaction_id,
            started: Instant::now(),
        }
    }

    pub fn transaction_id(&self) -> Uuid {
        self.transaction_id
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for ProcessingContext {
    fn drop(&mut self) {
        trace!(
            correlation_id = %self.correlation_id,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "processing context closed"
        );
    }
}
