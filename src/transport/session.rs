// ABOUTME: Tokio SMPP session over TCP: bind, correlated requests, inbound workers and keep-alive
// ABOUTME: One read loop owns the socket's read half, writers share the buffered write half

use super::{
    BindRequest, Connector, FailureKind, InboundListener, KeepAliveConfig, KeepAliveTracker,
    Transport, TransportError,
};
use crate::codec::{Encodable, Frame, MAX_SEQUENCE_NUMBER};
use crate::connection::{self, ConnectionError, FrameReader, FrameWriter};
use crate::datatypes::{
    Bind, CommandStatus, DeliverSm, DeliverSmResponse, EnquireLink, EnquireLinkResponse,
    GenericNack, InterfaceVersion, SubmitSm, SubmitSmResponse, Unbind, UnbindResponse,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const BIND_SEQUENCE: u32 = 1;
const INBOUND_QUEUE: usize = 256;

type Pending = oneshot::Sender<Result<Frame, TransportError>>;

/// Opens [`SmppSession`]s over TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Transport = SmppSession;

    async fn connect(
        &self,
        request: &BindRequest,
        listener: Option<Arc<dyn InboundListener>>,
    ) -> Result<SmppSession, TransportError> {
        SmppSession::connect(request, listener).await
    }
}

/// A bound SMPP session.
///
/// Requests are correlated with their responses by sequence number, so
/// several submissions may be in flight at once. Dropping the session aborts
/// its background tasks without unbinding; use
/// [`Transport::unbind_and_close`] for an orderly shutdown.
pub struct SmppSession {
    shared: Arc<Shared>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

struct Shared {
    writer: tokio::sync::Mutex<FrameWriter<OwnedWriteHalf>>,
    pending: Mutex<HashMap<u32, Pending>>,
    sequence: AtomicU32,
    failure: Mutex<Option<FailureKind>>,
    closing: AtomicBool,
    request_timeout: Duration,
    system_id: String,
}

impl SmppSession {
    /// Connect, bind and start the background tasks.
    pub async fn connect(
        request: &BindRequest,
        listener: Option<Arc<dyn InboundListener>>,
    ) -> Result<Self, TransportError> {
        let addr = request.endpoint.socket_addr();
        let socket = timeout(request.connection_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransportError::Timeout {
                operation: "connect",
                after: request.connection_timeout,
            })??;
        socket.set_nodelay(true)?;

        let (mut reader, mut writer) = connection::split(socket);

        let bind = Bind {
            bind_type: request.bind_type,
            sequence_number: BIND_SEQUENCE,
            system_id: request.system_id.clone(),
            password: request.password.clone(),
            system_type: request.system_type.clone(),
            interface_version: InterfaceVersion::SmppV34,
            addr_ton: request.addr_ton,
            addr_npi: request.addr_npi,
            address_range: request.address_range.clone(),
        };
        // Encode first so oversized credentials surface as a codec error
        bind.to_bytes()?;
        writer.write_pdu(&bind).await?;

        let operation = "bind";
        let answer = timeout(request.request_timeout, reader.read_frame())
            .await
            .map_err(|_| TransportError::Timeout {
                operation,
                after: request.request_timeout,
            })?
            .map_err(connection_error)?;

        match answer {
            Some(Frame::BindResp(resp)) if resp.sequence_number == BIND_SEQUENCE => {
                if !resp.command_status.is_ok() {
                    return Err(TransportError::BindRejected {
                        status: resp.command_status,
                    });
                }
                info!(
                    endpoint = %request.endpoint,
                    bind_type = ?request.bind_type,
                    smsc = %resp.system_id,
                    "session bound"
                );
                let reported = resp
                    .sc_interface_version
                    .and_then(|version| InterfaceVersion::try_from(version).ok());
                if reported.is_some_and(|version| !version.supports_tlvs()) {
                    warn!(
                        smsc = %resp.system_id,
                        "SMSC reports SMPP v3.3, segmentation TLVs may be ignored"
                    );
                }
            }
            Some(Frame::GenericNack(nack)) => {
                return Err(TransportError::BindRejected {
                    status: nack.command_status,
                });
            }
            Some(other) => {
                return Err(TransportError::UnexpectedPdu {
                    operation,
                    command_id: other.command_id(),
                });
            }
            None => return Err(TransportError::Closed),
        }

        let shared = Arc::new(Shared {
            writer: tokio::sync::Mutex::new(writer),
            pending: Mutex::new(HashMap::new()),
            sequence: AtomicU32::new(BIND_SEQUENCE),
            failure: Mutex::new(None),
            closing: AtomicBool::new(false),
            request_timeout: request.request_timeout,
            system_id: request.system_id.clone(),
        });

        let mut tasks = Vec::new();

        let inbound = match listener {
            Some(listener) => {
                let (tx, rx) = mpsc::channel::<Box<DeliverSm>>(INBOUND_QUEUE);
                let rx = Arc::new(tokio::sync::Mutex::new(rx));
                for worker in 0..request.threads.max(1) {
                    tasks.push(tokio::spawn(inbound_worker(
                        worker,
                        shared.clone(),
                        rx.clone(),
                        listener.clone(),
                    )));
                }
                Some(tx)
            }
            None => None,
        };

        tasks.push(tokio::spawn(read_loop(shared.clone(), reader, inbound)));

        if request.keep_alive.enabled {
            tasks.push(tokio::spawn(keep_alive(
                shared.clone(),
                request.keep_alive.clone(),
            )));
        }

        Ok(SmppSession {
            shared,
            tasks: Mutex::new(tasks),
        })
    }

    fn abort_tasks(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

impl Transport for SmppSession {
    async fn submit(&self, mut pdu: SubmitSm) -> Result<SubmitSmResponse, TransportError> {
        let operation = "submit_sm";
        pdu.sequence_number = self.shared.next_sequence();

        let limit = self.shared.request_timeout;
        let frame = self
            .shared
            .call(operation, pdu.sequence_number, &pdu, limit)
            .await?;

        match frame {
            Frame::SubmitSmResp(resp) if resp.command_status.is_ok() => Ok(resp),
            Frame::SubmitSmResp(resp) => Err(TransportError::NegativeResponse {
                operation,
                status: resp.command_status,
            }),
            Frame::GenericNack(nack) => Err(TransportError::NegativeResponse {
                operation,
                status: nack.command_status,
            }),
            other => Err(TransportError::UnexpectedPdu {
                operation,
                command_id: other.command_id(),
            }),
        }
    }

    async fn unbind_and_close(&self) -> Result<(), TransportError> {
        if self.shared.closing.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let sequence = self.shared.next_sequence();
        let limit = self.shared.request_timeout;
        let result = match self
            .shared
            .call("unbind", sequence, &Unbind::new(sequence), limit)
            .await
        {
            Ok(Frame::UnbindResp(_)) => Ok(()),
            Ok(other) => Err(TransportError::UnexpectedPdu {
                operation: "unbind",
                command_id: other.command_id(),
            }),
            Err(e) => Err(e),
        };

        if let Err(e) = self.shared.writer.lock().await.shutdown().await {
            debug!(error = %e, "socket shutdown after unbind failed");
        }
        self.abort_tasks();
        self.shared.fail_pending();

        info!(system_id = %self.shared.system_id, "session closed");
        result
    }

    fn failure(&self) -> Option<FailureKind> {
        *self.shared.failure.lock()
    }
}

impl Drop for SmppSession {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

impl Shared {
    fn next_sequence(&self) -> u32 {
        let previous = self
            .sequence
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(following_sequence(current))
            })
            .unwrap_or_else(|current| current);
        following_sequence(previous)
    }

    /// Send an enquire_link and wait at most `limit` for its response.
    async fn enquire_link(&self, limit: Duration) -> Result<(), TransportError> {
        let sequence = self.next_sequence();
        let frame = self
            .call("enquire_link", sequence, &EnquireLink::new(sequence), limit)
            .await?;
        expect_enquire_link_resp(frame)
    }

    /// Write a request and wait for the frame carrying the same sequence number.
    async fn call<P: Encodable>(
        &self,
        operation: &'static str,
        sequence: u32,
        pdu: &P,
        limit: Duration,
    ) -> Result<Frame, TransportError> {
        if self.failure.lock().is_some_and(|kind| !kind.keeps_session_valid()) {
            return Err(TransportError::Closed);
        }

        // Encoding errors must not leave a pending entry behind
        pdu.to_bytes()?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(sequence, tx);

        let written = self.writer.lock().await.write_pdu(pdu).await;
        if let Err(e) = written {
            self.pending.lock().remove(&sequence);
            self.record_failure(FailureKind::Io);
            return Err(e.into());
        }

        match timeout(limit, rx).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => {
                self.pending.lock().remove(&sequence);
                Err(TransportError::Timeout {
                    operation,
                    after: limit,
                })
            }
        }
    }

    async fn respond<P: Encodable>(&self, pdu: &P) {
        if let Err(e) = self.writer.lock().await.write_pdu(pdu).await {
            warn!(error = %e, "failed to write response");
            self.record_failure(FailureKind::Io);
        }
    }

    fn record_failure(&self, kind: FailureKind) {
        if self.closing.load(Ordering::SeqCst) {
            return;
        }
        let mut failure = self.failure.lock();
        if failure.is_none_or(|recorded| recorded.keeps_session_valid()) {
            warn!(system_id = %self.system_id, failure = ?kind, "session failure recorded");
            *failure = Some(kind);
        }
    }

    /// Wake every waiting request with `Closed`.
    fn fail_pending(&self) {
        let drained: Vec<Pending> = self.pending.lock().drain().map(|(_, tx)| tx).collect();
        for tx in drained {
            let _ = tx.send(Err(TransportError::Closed));
        }
    }

    fn complete(&self, frame: Frame) {
        let sequence = frame.sequence_number();
        match self.pending.lock().remove(&sequence) {
            Some(tx) => {
                let _ = tx.send(Ok(frame));
            }
            None => debug!(
                sequence,
                command_id = frame.command_id(),
                "response without a waiting request"
            ),
        }
    }
}

/// Sequence numbers run 1..=0x7FFFFFFF and then wrap.
fn following_sequence(current: u32) -> u32 {
    if current >= MAX_SEQUENCE_NUMBER {
        1
    } else {
        current + 1
    }
}

fn connection_error(err: ConnectionError) -> TransportError {
    match err {
        ConnectionError::Io(e) => TransportError::Io(e),
        ConnectionError::Reset => TransportError::Closed,
        ConnectionError::InvalidPdu { source, .. } | ConnectionError::Framing(source) => {
            TransportError::Codec(source)
        }
    }
}

fn expect_enquire_link_resp(frame: Frame) -> Result<(), TransportError> {
    match frame {
        Frame::EnquireLinkResp(_) => Ok(()),
        Frame::GenericNack(nack) => Err(TransportError::NegativeResponse {
            operation: "enquire_link",
            status: nack.command_status,
        }),
        other => Err(TransportError::UnexpectedPdu {
            operation: "enquire_link",
            command_id: other.command_id(),
        }),
    }
}

async fn read_loop(
    shared: Arc<Shared>,
    mut reader: FrameReader<OwnedReadHalf>,
    inbound: Option<mpsc::Sender<Box<DeliverSm>>>,
) {
    loop {
        let frame = match reader.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!(system_id = %shared.system_id, "peer closed the connection");
                shared.record_failure(FailureKind::Closed);
                break;
            }
            Err(ConnectionError::InvalidPdu {
                command_id,
                sequence_number,
                source,
            }) => {
                warn!(command_id, sequence_number, error = %source, "discarding invalid PDU");
                if command_id & 0x8000_0000 == 0 {
                    shared
                        .respond(&GenericNack::error(sequence_number, source.to_command_status()))
                        .await;
                } else if let Some(tx) = shared.pending.lock().remove(&sequence_number) {
                    let _ = tx.send(Err(TransportError::Codec(source)));
                }
                continue;
            }
            Err(e) => {
                let kind = match e {
                    ConnectionError::Io(_) => FailureKind::Io,
                    ConnectionError::Reset => FailureKind::Closed,
                    _ => FailureKind::Protocol,
                };
                warn!(system_id = %shared.system_id, error = %e, "read loop stopped");
                shared.record_failure(kind);
                break;
            }
        };

        if frame.is_response() {
            shared.complete(frame);
            continue;
        }

        match frame {
            Frame::DeliverSm(pdu) => match &inbound {
                Some(tx) => {
                    if tx.send(pdu).await.is_err() {
                        break;
                    }
                }
                None => {
                    shared.respond(&DeliverSmResponse::new(pdu.sequence_number)).await;
                }
            },
            Frame::EnquireLink(pdu) => {
                shared
                    .respond(&EnquireLinkResponse::new(pdu.sequence_number))
                    .await;
            }
            Frame::Unbind(pdu) => {
                info!(system_id = %shared.system_id, "SMSC requested unbind");
                shared.respond(&UnbindResponse::new(pdu.sequence_number)).await;
                shared.record_failure(FailureKind::Closed);
                break;
            }
            Frame::AlertNotification(alert) => {
                debug!(source_addr = %alert.source_addr, "ignoring alert_notification");
            }
            other => {
                debug!(command_id = other.command_id(), "rejecting unsupported request");
                shared
                    .respond(&GenericNack::error(
                        other.sequence_number(),
                        CommandStatus::InvalidCommandId,
                    ))
                    .await;
            }
        }
    }

    shared.fail_pending();
}

async fn inbound_worker(
    worker: usize,
    shared: Arc<Shared>,
    queue: Arc<tokio::sync::Mutex<mpsc::Receiver<Box<DeliverSm>>>>,
    listener: Arc<dyn InboundListener>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(pdu) = next else {
            break;
        };

        let sequence = pdu.sequence_number;
        // Listeners may block, keep them off the reactor threads
        let listener = listener.clone();
        let outcome = tokio::task::spawn_blocking(move || listener.receive(&pdu)).await;

        let status = match outcome {
            Ok(Ok(())) => CommandStatus::Ok,
            Ok(Err(rejection)) => {
                debug!(
                    worker,
                    sequence,
                    status = %rejection.status,
                    reason = %rejection.reason,
                    "deliver_sm rejected"
                );
                rejection.status
            }
            Err(err) => {
                warn!(worker, sequence, error = %err, "inbound listener did not complete");
                CommandStatus::ReceiverTemporaryAppError
            }
        };

        shared
            .respond(&DeliverSmResponse::error(sequence, status))
            .await;
    }
}

async fn keep_alive(shared: Arc<Shared>, config: KeepAliveConfig) {
    let mut tracker = KeepAliveTracker::new(&config);
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if shared.closing.load(Ordering::SeqCst) {
            break;
        }

        match shared.enquire_link(config.timeout).await {
            Ok(()) => tracker.on_ping_success(),
            Err(TransportError::Closed) => break,
            Err(_) => {
                tracker.on_ping_failure();
                if tracker.is_connection_failed() {
                    shared.record_failure(FailureKind::Timeout);
                    break;
                }
            }
        }
    }
}
