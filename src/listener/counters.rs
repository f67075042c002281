use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct Tally {
    total: AtomicU64,
    failed: AtomicU64,
}

impl Tally {
    pub(crate) fn record_total(&self) -> u64 {
        self.total.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_failure(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn load(&self) -> (u64, u64) {
        (
            self.total.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }
}

/// Inbound processing counters, zero at construction and never reset.
#[derive(Debug, Default)]
pub struct Counters {
    pub(crate) messages: Tally,
    pub(crate) receipts: Tally,
}

impl Counters {
    pub fn snapshot(&self) -> CounterSnapshot {
        let (total_messages, failed_messages) = self.messages.load();
        let (total_receipts, failed_receipts) = self.receipts.load();
        CounterSnapshot {
            total_messages,
            failed_messages,
            total_receipts,
            failed_receipts,
        }
    }
}

/// Point in time copy of [`Counters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub total_messages: u64,
    pub failed_messages: u64,
    pub total_receipts: u64,
    pub failed_receipts: u64,
}
