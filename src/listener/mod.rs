// ABOUTME: Classifies inbound deliver_sm PDUs into delivery receipts and messages
// ABOUTME: Dispatches each to its registered handler, counting totals and failures

mod context;
mod counters;
mod handler;

pub use context::ProcessingContext;
pub use counters::{CounterSnapshot, Counters};
pub use handler::Handler;

use crate::datatypes::DeliverSm;
use crate::message::InboundMessage;
use crate::receipt::DeliveryReceipt;
use crate::transport::{InboundListener, Rejection};
use counters::Tally;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info_span, warn};

/// Routes every inbound deliver_sm to at most one handler.
///
/// Categories without a handler are accepted and dropped silently.
///
/// ```rust
/// use smpp_gateway::listener::{Dispatcher, ProcessingContext};
/// use smpp_gateway::message::InboundMessage;
///
/// let dispatcher = Dispatcher::builder()
///     .message(|message: InboundMessage, context: &ProcessingContext| {
///         println!("{} from {} ({})", message.text(), message.source(), context.correlation_id());
///         Ok(())
///     })
///     .build();
/// assert_eq!(dispatcher.counters().total_messages, 0);
/// ```
pub struct Dispatcher {
    message_handler: Option<Box<dyn Handler<InboundMessage>>>,
    receipt_handler: Option<Box<dyn Handler<DeliveryReceipt>>>,
    counters: Counters,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    fn dispatch<T>(
        &self,
        category: &'static str,
        handler: Option<&dyn Handler<T>>,
        item: T,
        tally: &Tally,
    ) -> Result<(), Rejection> {
        let Some(handler) = handler else {
            debug!(category, "no handler registered, dropping");
            return Ok(());
        };

        let total = tally.record_total();
        let context = ProcessingContext::start();
        let span = info_span!("dispatch", category, correlation_id = %context.correlation_id());
        let _entered = span.enter();

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| handler.process(item, &context))) {
            Ok(result) => result,
            Err(_) => Err(format!("{category} handler panicked").into()),
        };

        match outcome {
            Ok(()) => {
                debug!(
                    total,
                    elapsed_ms = context.elapsed().as_millis() as u64,
                    "{category} processed"
                );
                Ok(())
            }
            Err(err) => {
                let failed = tally.record_failure();
                warn!(total, failed, error = %err, "{category} processing failed");
                Err(Rejection::temporary(format!("{category} processing failed")))
            }
        }
    }
}

impl InboundListener for Dispatcher {
    fn receive(&self, pdu: &DeliverSm) -> Result<(), Rejection> {
        if pdu.is_delivery_receipt() {
            let receipt = match DeliveryReceipt::from_pdu(pdu) {
                Ok(receipt) => receipt,
                Err(err) => {
                    warn!(
                        sequence = pdu.sequence_number,
                        source = %pdu.source_addr,
                        error = %err,
                        "receipt will be rejected because it cannot be understood"
                    );
                    return Err(Rejection::permanent(err.to_string()));
                }
            };
            debug!(?receipt, "receipt received");
            self.dispatch(
                "receipt",
                self.receipt_handler.as_deref(),
                receipt,
                &self.counters.receipts,
            )
        } else {
            let message = InboundMessage::from_pdu(pdu);
            debug!(?message, "message received");
            self.dispatch(
                "message",
                self.message_handler.as_deref(),
                message,
                &self.counters.messages,
            )
        }
    }
}

#[derive(Default)]
pub struct DispatcherBuilder {
    message_handler: Option<Box<dyn Handler<InboundMessage>>>,
    receipt_handler: Option<Box<dyn Handler<DeliveryReceipt>>>,
}

impl DispatcherBuilder {
    /// Handle mobile originated messages with a closure.
    pub fn message<F>(self, handler: F) -> Self
    where
        F: Fn(InboundMessage, &ProcessingContext) -> Result<(), crate::Error>
            + Send
            + Sync
            + 'static,
    {
        self.message_handler(handler)
    }

    pub fn message_handler(mut self, handler: impl Handler<InboundMessage> + 'static) -> Self {
        self.message_handler = Some(Box::new(handler));
        self
    }

    /// Handle delivery receipts with a closure.
    pub fn receipt<F>(self, handler: F) -> Self
    where
        F: Fn(DeliveryReceipt, &ProcessingContext) -> Result<(), crate::Error>
            + Send
            + Sync
            + 'static,
    {
        self.receipt_handler(handler)
    }

    pub fn receipt_handler(mut self, handler: impl Handler<DeliveryReceipt> + 'static) -> Self {
        self.receipt_handler = Some(Box::new(handler));
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            message_handler: self.message_handler,
            receipt_handler: self.receipt_handler,
            counters: Counters::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{CommandStatus, EsmClass};
    use crate::receipt::DeliveryState;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RECEIPT: &str =
        "id:abc123 sub:001 dlvrd:001 submit date:2405011200 done date:2405011201 stat:DELIVRD err:000 text:hi";

    fn message_pdu(sequence: u32, text: &str) -> DeliverSm {
        let mut pdu = DeliverSm::new(sequence, "27820000001", "40404");
        pdu.set_user_data(text.as_bytes().to_vec());
        pdu
    }

    fn receipt_pdu(sequence: u32, body: &str) -> DeliverSm {
        let mut pdu = message_pdu(sequence, body);
        pdu.esm_class = EsmClass::delivery_receipt();
        pdu
    }

    #[test]
    fn messages_reach_the_message_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let dispatcher = Dispatcher::builder()
            .message(move |message, _context| {
                sink.lock().push(message.text().to_string());
                Ok(())
            })
            .build();

        assert_eq!(dispatcher.receive(&message_pdu(1, "hello")), Ok(()));
        assert_eq!(*seen.lock(), vec!["hello".to_string()]);
        assert_eq!(
            dispatcher.counters(),
            CounterSnapshot {
                total_messages: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn receipts_reach_the_receipt_handler_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let count = calls.clone();
        let dispatcher = Dispatcher::builder()
            .receipt(move |receipt, _context| {
                assert_eq!(receipt.message_id(), "abc123");
                assert_eq!(receipt.state(), DeliveryState::Delivered);
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build();

        assert_eq!(dispatcher.receive(&receipt_pdu(2, RECEIPT)), Ok(()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.counters().total_receipts, 1);
        assert_eq!(dispatcher.counters().total_messages, 0);
    }

    #[test]
    fn malformed_receipt_is_rejected_permanently() {
        let calls = Arc::new(AtomicUsize::new(0));
        let count = calls.clone();
        let dispatcher = Dispatcher::builder()
            .receipt(move |_receipt, _context| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build();

        let rejection = dispatcher
            .receive(&receipt_pdu(3, "this is not a receipt"))
            .unwrap_err();
        assert_eq!(rejection.status, CommandStatus::ReceiverPermanentAppError);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.counters(), CounterSnapshot::default());
    }

    #[test]
    fn unregistered_categories_are_dropped_silently() {
        let dispatcher = Dispatcher::builder().build();

        assert_eq!(dispatcher.receive(&message_pdu(4, "nobody listens")), Ok(()));
        assert_eq!(dispatcher.receive(&receipt_pdu(5, RECEIPT)), Ok(()));
        assert_eq!(dispatcher.counters(), CounterSnapshot::default());
    }

    #[test]
    fn handler_failure_is_counted_and_rejected_temporarily() {
        let dispatcher = Dispatcher::builder()
            .message(|_message, _context| Err("database unavailable".into()))
            .build();

        let rejection = dispatcher.receive(&message_pdu(6, "hi")).unwrap_err();
        assert_eq!(rejection.status, CommandStatus::ReceiverTemporaryAppError);
        assert!(!rejection.reason.contains("database"));
        assert_eq!(
            dispatcher.counters(),
            CounterSnapshot {
                total_messages: 1,
                failed_messages: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn handler_panic_counts_as_failure() {
        let dispatcher = Dispatcher::builder()
            .receipt(|_receipt, _context| panic!("boom"))
            .build();

        let rejection = dispatcher.receive(&receipt_pdu(7, RECEIPT)).unwrap_err();
        assert_eq!(rejection.status, CommandStatus::ReceiverTemporaryAppError);
        assert_eq!(dispatcher.counters().failed_receipts, 1);
    }

    #[test]
    fn each_dispatch_gets_its_own_context() {
        let ids = Arc::new(Mutex::new(Vec::new()));
        let sink = ids.clone();
        let dispatcher = Dispatcher::builder()
            .message(move |_message, context| {
                sink.lock().push(context.correlation_id());
                Ok(())
            })
            .build();

        dispatcher.receive(&message_pdu(8, "one")).unwrap();
        dispatcher.receive(&message_pdu(8, "one again")).unwrap();
        let ids = ids.lock();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn concurrent_arrivals_lose_no_counts() {
        const MESSAGES: usize = 400;
        const RECEIPTS: usize = 300;

        let dispatcher = Dispatcher::builder()
            .message(|_message, _context| Ok(()))
            .receipt(|_receipt, _context| Ok(()))
            .build();

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let dispatcher = &dispatcher;
                scope.spawn(move || {
                    for n in (worker..MESSAGES).step_by(8) {
                        dispatcher.receive(&message_pdu(n as u32 + 1, "mo")).unwrap();
                    }
                    for n in (worker..RECEIPTS).step_by(8) {
                        dispatcher.receive(&receipt_pdu(n as u32 + 1, RECEIPT)).unwrap();
                    }
                });
            }
        });

        let counters = dispatcher.counters();
        assert_eq!(counters.total_messages, MESSAGES as u64);
        assert_eq!(counters.total_receipts, RECEIPTS as u64);
        assert_eq!(counters.failed_messages, 0);
        assert_eq!(counters.failed_receipts, 0);
    }
}
