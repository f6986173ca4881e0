//! The collection engine (CORE): orchestrates the handshake, the frame
//! loop, the acknowledgement loop, cooperative cancellation, and keep-alive
//! reconnection for `collect_parcels`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use poweb_types::{
    NonceSigner, ParcelCollection, StreamingMode, collection::AckSink, frames::Response,
    signer::SignaturePurpose,
};

use crate::error::PoWebError;
use crate::transport::Transport;
use crate::ws_session::{CollectionSession, InboundFrame};

/// Fixed backoff applied before reconnecting after an abrupt disconnect
/// (server close with `INTERNAL_ERROR`, or the TCP stream ending without a
/// close frame) while streaming in keep-alive mode.
const RECONNECT_BACKOFF_DISCONNECT: Duration = Duration::from_secs(3);

/// Fixed backoff applied before reconnecting after a client-side read
/// timeout while streaming in keep-alive mode.
const RECONNECT_BACKOFF_TIMEOUT: Duration = Duration::from_millis(500);

/// How long the engine waits for the next frame while streaming in
/// keep-alive mode before treating the connection as silently dead and
/// reconnecting. Not applied in close-upon-completion mode, where the
/// server is expected to close once it has drained its queue.
const KEEP_ALIVE_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval at which the engine pings the server to keep NAT bindings alive
/// and detect silent disconnects sooner than [`KEEP_ALIVE_READ_TIMEOUT`]
/// would on its own (§4.1).
const PING_INTERVAL: Duration = Duration::from_secs(5);

/// Backpressure window for the channel carrying collected parcels to the
/// consumer: the engine only reads the next server frame once the consumer
/// has taken the previous one off the channel.
const COLLECTED_CHANNEL_CAPACITY: usize = 1;

struct ChannelAckSink {
    delivery_id: String,
    ack_tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl AckSink for ChannelAckSink {
    async fn ack(&self) {
        // The receiving end may already be gone (session ended, or the
        // consumer cancelled); nothing to do in that case.
        let _ = self.ack_tx.send(self.delivery_id.clone());
    }
}

/// Outcome of running a single WebSocket connection through the session
/// protocol (§4.3.2).
enum SessionOutcome {
    /// The server closed normally, or the consumer cancelled.
    Ended,
    /// A fatal, non-retryable error; the sequence terminates.
    Fatal(PoWebError),
    /// A transient disconnect in keep-alive mode; reconnect after `delay`.
    Reconnect { delay: Duration },
}

/// Starts collecting parcels addressed to any of `signers`.
///
/// Returns a lazy stream: nothing happens on the wire until it is polled.
/// See §4.3.1 for the public contract and §4.3.2/§4.3.3 for the state
/// machine this drives.
pub fn collect_parcels(
    transport: Transport,
    signers: Vec<Arc<dyn NonceSigner>>,
    mode: StreamingMode,
) -> impl Stream<Item = Result<ParcelCollection, PoWebError>> {
    async_stream::stream! {
        if signers.is_empty() {
            yield Err(PoWebError::NonceSignerError(
                "At least one nonce signer must be specified".to_string(),
            ));
            return;
        }

        let (tx, mut rx) = mpsc::channel(COLLECTED_CHANNEL_CAPACITY);
        tokio::spawn(run_collection_loop(transport, signers, mode, tx));

        while let Some(item) = rx.recv().await {
            let is_fatal = item.is_err();
            yield item;
            if is_fatal {
                return;
            }
        }
    }
}

#[tracing::instrument(level = "debug", skip_all, fields(mode = ?mode))]
async fn run_collection_loop(
    transport: Transport,
    signers: Vec<Arc<dyn NonceSigner>>,
    mode: StreamingMode,
    tx: mpsc::Sender<Result<ParcelCollection, PoWebError>>,
) {
    loop {
        if tx.is_closed() {
            tracing::debug!("consumer is gone before a new session could start, stopping");
            return;
        }
        match run_session(&transport, &signers, mode, &tx).await {
            SessionOutcome::Ended => return,
            SessionOutcome::Fatal(err) => {
                let _ = tx.send(Err(err)).await;
                return;
            }
            SessionOutcome::Reconnect { delay } => {
                tracing::warn!("collection session disconnected, reconnecting in {delay:?}");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[tracing::instrument(level = "debug", skip_all, fields(mode = ?mode))]
async fn run_session(
    transport: &Transport,
    signers: &[Arc<dyn NonceSigner>],
    mode: StreamingMode,
    tx: &mpsc::Sender<Result<ParcelCollection, PoWebError>>,
) -> SessionOutcome {
    // INIT
    let mut session = match transport.ws_connect(mode).await {
        Ok(session) => session,
        Err(err) => return SessionOutcome::Fatal(err),
    };

    // OPENING
    tracing::debug!("OPENING: awaiting handshake challenge");
    let challenge = match session.read_challenge().await {
        Ok(challenge) => challenge,
        Err(err) => return SessionOutcome::Fatal(err),
    };

    // SIGNING
    tracing::debug!(signers = signers.len(), "SIGNING: signing handshake nonce");
    let mut nonce_signatures = Vec::with_capacity(signers.len());
    for signer in signers {
        match signer.sign(&challenge.nonce, SignaturePurpose::Nonce).await {
            Ok(signature) => nonce_signatures.push(signature),
            Err(err) => return SessionOutcome::Fatal(err.into()),
        }
    }
    if let Err(err) = session.send_response(&Response { nonce_signatures }).await {
        return SessionOutcome::Fatal(err);
    }

    // STREAMING
    tracing::debug!("STREAMING: handshake complete, awaiting deliveries");
    let (ack_tx, mut ack_rx) = mpsc::unbounded_channel::<String>();
    let trusted_certificates = signers.iter().map(|s| s.certificate().clone()).collect::<Vec<_>>();
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // first tick fires immediately; consume it

    loop {
        tokio::select! {
            biased;

            // Cooperative cancellation: the consumer dropped the stream.
            () = tx.closed() => {
                session.close(CloseCode::Normal, "").await;
                return SessionOutcome::Ended;
            }

            // Forward a caller-requested ACK. Order here matches the order
            // ack_tx.send() calls happened in, i.e. the caller's ack() call
            // order (§5).
            Some(delivery_id) = ack_rx.recv() => {
                session.send_ack(&delivery_id).await;
                tracing::trace!(%delivery_id, "ACK sent");
            }

            _ = ping_interval.tick(), if mode == StreamingMode::KeepAlive => {
                session.ping().await;
            }

            frame = read_with_mode_timeout(&mut session, mode) => {
                match frame {
                    Ok(ReadOutcome::Frame(InboundFrame::Delivery(delivery))) => {
                        let sink = Arc::new(ChannelAckSink {
                            delivery_id: delivery.delivery_id,
                            ack_tx: ack_tx.clone(),
                        });
                        let collection = ParcelCollection::new(
                            delivery.parcel_serialized,
                            trusted_certificates.clone(),
                            sink,
                        );
                        if tx.send(Ok(collection)).await.is_err() {
                            // Consumer is gone; finish cancellation on the
                            // next select! turn, via the tx.closed() branch.
                            continue;
                        }
                    }
                    Ok(ReadOutcome::Frame(InboundFrame::Closed { code, reason })) => {
                        return on_closed(mode, code, reason);
                    }
                    Ok(ReadOutcome::TimedOut) => {
                        return SessionOutcome::Reconnect { delay: RECONNECT_BACKOFF_TIMEOUT };
                    }
                    Err(err) => return SessionOutcome::Fatal(err),
                }
            }
        }
    }
}

/// Outcome of one read attempt, distinguishing a genuine frame or close
/// from a client-side read timeout (only ever produced in keep-alive mode).
enum ReadOutcome {
    Frame(InboundFrame),
    TimedOut,
}

async fn read_with_mode_timeout(
    session: &mut CollectionSession,
    mode: StreamingMode,
) -> Result<ReadOutcome, PoWebError> {
    if mode == StreamingMode::KeepAlive {
        match tokio::time::timeout(KEEP_ALIVE_READ_TIMEOUT, session.read_frame()).await {
            Ok(result) => result.map(ReadOutcome::Frame),
            Err(_) => Ok(ReadOutcome::TimedOut),
        }
    } else {
        session.read_frame().await.map(ReadOutcome::Frame)
    }
}

fn on_closed(mode: StreamingMode, code: Option<CloseCode>, reason: String) -> SessionOutcome {
    match code {
        Some(CloseCode::Normal) => SessionOutcome::Ended,
        Some(CloseCode::Error) if mode == StreamingMode::KeepAlive => {
            SessionOutcome::Reconnect { delay: RECONNECT_BACKOFF_DISCONNECT }
        }
        None if mode == StreamingMode::KeepAlive => {
            SessionOutcome::Reconnect { delay: RECONNECT_BACKOFF_DISCONNECT }
        }
        other => SessionOutcome::Fatal(PoWebError::ServerConnectionError(format!(
            "Server closed the connection unexpectedly (code: {}, reason: {reason})",
            other.map(u16::from).map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string()),
        ))),
    }
}
