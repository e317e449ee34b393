//! Streaming event consumer
//!
//! One consumer owns one logical session. `start` spawns a read loop for a
//! new session; `reset` clears it. Both bump a generation counter and
//! cancel the previous loop, and every state write is checked against the
//! generation under the lock, so an abandoned connection can never touch a
//! newer session.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::StreamEvent;
use super::frame::FrameDecoder;
use super::request::StreamRequest;
use super::session::{Applied, StreamSession, StreamState};
use super::transport::Transport;

/// Generation number of a started session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionId(pub u64);

struct Inner {
    generation: u64,
    session: StreamSession,
    cancel: CancellationToken,
}

struct Shared {
    inner: Mutex<Inner>,
    tx: watch::Sender<StreamState>,
}

impl Shared {
    /// Replace the session, cancelling whatever loop owned the old one
    fn replace(&self, session: StreamSession) -> (u64, CancellationToken) {
        let mut inner = self.inner.lock();
        inner.cancel.cancel();
        inner.generation += 1;
        inner.cancel = CancellationToken::new();
        inner.session = session;
        self.publish(inner.session.state());
        (inner.generation, inner.cancel.clone())
    }

    /// The single mutation entry point for read loops. Returns `None` when
    /// `generation` is stale.
    fn update<R>(&self, generation: u64, f: impl FnOnce(&mut StreamSession) -> R) -> Option<R> {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return None;
        }
        let out = f(&mut inner.session);
        self.publish(inner.session.state());
        Some(out)
    }

    fn publish(&self, state: &StreamState) {
        self.tx.send_if_modified(|current| {
            if current == state {
                false
            } else {
                *current = state.clone();
                true
            }
        });
    }
}

/// Consumes a progress stream into observable [`StreamState`]
pub struct StreamConsumer {
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
}

impl StreamConsumer {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (tx, _rx) = watch::channel(StreamState::default());
        Self {
            transport,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    generation: 0,
                    session: StreamSession::idle(),
                    cancel: CancellationToken::new(),
                }),
                tx,
            }),
        }
    }

    /// Start a new session, superseding any current one.
    ///
    /// The state is active by the time this returns. Must be called from
    /// within a tokio runtime.
    pub fn start(&self, request: StreamRequest) -> SessionId {
        let (generation, cancel) = self.shared.replace(StreamSession::begin());
        info!(
            "Stream session {} starting: {} {}",
            generation, request.method, request.endpoint
        );
        tokio::spawn(read_loop(
            self.shared.clone(),
            self.transport.clone(),
            request,
            generation,
            cancel,
        ));
        SessionId(generation)
    }

    /// Cancel the in-flight read and clear all state
    pub fn reset(&self) {
        let (generation, _) = self.shared.replace(StreamSession::idle());
        debug!("Stream consumer reset (generation {})", generation);
    }

    /// Current snapshot
    pub fn state(&self) -> StreamState {
        self.shared.tx.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.shared.tx.subscribe()
    }

    /// Wait until the session is inactive or its stream has closed
    pub async fn settled(&self) -> StreamState {
        let mut rx = self.subscribe();
        // The sender lives in `self.shared`, so it outlives this borrow
        let settled = rx.wait_for(StreamState::is_settled).await;
        match settled {
            Ok(state) => (*state).clone(),
            Err(_) => self.state(),
        }
    }
}

impl Drop for StreamConsumer {
    fn drop(&mut self) {
        self.shared.inner.lock().cancel.cancel();
    }
}

async fn read_loop(
    shared: Arc<Shared>,
    transport: Arc<dyn Transport>,
    request: StreamRequest,
    generation: u64,
    cancel: CancellationToken,
) {
    let started = Instant::now();

    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Stream session {} cancelled while connecting", generation);
            return;
        }
        opened = transport.open(&request) => opened,
    };

    let mut body = match opened {
        Ok(body) => body,
        Err(e) => {
            warn!("Stream session {} failed to open: {}", generation, e);
            shared.update(generation, |s| s.fail(e.session_message()));
            return;
        }
    };

    let mut decoder = FrameDecoder::new();
    let mut event_count = 0usize;
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Stream session {} cancelled after {} bytes", generation, decoder.bytes_received());
                return;
            }
            next = body.next() => next,
        };

        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => {
                warn!("Stream session {} read failed: {}", generation, e);
                shared.update(generation, |s| s.fail(e.session_message()));
                return;
            }
            None => {
                if let Some(tail) = decoder.finish() {
                    debug!(
                        "Stream session {} ended mid-line, dropping {} chars",
                        generation,
                        tail.chars().count()
                    );
                }
                info!(
                    "Stream session {} closed after {:?}, {} events, {} bytes",
                    generation,
                    started.elapsed(),
                    event_count,
                    decoder.bytes_received()
                );
                shared.update(generation, StreamSession::mark_closed);
                return;
            }
        };

        debug!("Stream session {} chunk: {} bytes", generation, chunk.len());
        for frame in decoder.push(&chunk) {
            event_count += 1;
            let applied = match StreamEvent::from_frame(&frame) {
                Ok(Some(event)) => {
                    debug!("  -> {} event", frame.event);
                    shared.update(generation, |s| s.apply(event))
                }
                Ok(None) => {
                    debug!("  -> ignoring event {:?}", frame.event);
                    continue;
                }
                Err(malformed) => {
                    warn!("Stream session {}: {}", generation, malformed);
                    shared.update(generation, |s| s.fail(malformed.to_string()))
                }
            };

            match applied {
                None => {
                    debug!("Stream session {} superseded, dropping read", generation);
                    return;
                }
                Some(Applied::Terminal) => {
                    info!(
                        "Stream session {} finished after {:?}",
                        generation,
                        started.elapsed()
                    );
                    return;
                }
                Some(Applied::Progress) | Some(Applied::Ignored) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, Result};
    use crate::stream::transport::ByteStream;
    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    /// Hands out one prepared response per `open` call
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<ByteStream>>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<ByteStream>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
            })
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn open(&self, _request: &StreamRequest) -> Result<ByteStream> {
            self.responses
                .lock()
                .pop_front()
                .unwrap_or(Err(ApiError::NoBody))
        }
    }

    fn channel_body() -> (mpsc::UnboundedSender<Result<Bytes>>, ByteStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Box::pin(UnboundedReceiverStream::new(rx)))
    }

    fn fixed_body(chunks: &[&'static str]) -> ByteStream {
        let chunks: Vec<Result<Bytes>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        Box::pin(futures::stream::iter(chunks))
    }

    fn request() -> StreamRequest {
        StreamRequest::post("/api/submit")
    }

    async fn next_change(rx: &mut watch::Receiver<StreamState>) -> StreamState {
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("timed out waiting for state change")
            .expect("sender dropped");
        rx.borrow_and_update().clone()
    }

    const PROGRESS_40: &str = "event: progress\ndata: {\"stage\":\"encrypting\",\"percent\":40,\"message\":\"Encrypting files\"}\n\n";
    const COMPLETE: &str = "event: complete\ndata: {\"job_id\":\"abc123\"}\n\n";

    #[tokio::test]
    async fn test_progress_then_complete_in_order() {
        let (tx, body) = channel_body();
        let consumer = StreamConsumer::new(ScriptedTransport::new(vec![Ok(body)]));
        let mut rx = consumer.subscribe();

        consumer.start(request());
        let state = next_change(&mut rx).await;
        assert!(state.active);
        assert!(state.last_progress.is_none());

        tx.send(Ok(Bytes::from_static(PROGRESS_40.as_bytes()))).unwrap();
        let state = next_change(&mut rx).await;
        assert!(state.active);
        let progress = state.last_progress.unwrap();
        assert_eq!(progress.stage, "encrypting");
        assert_eq!(progress.percent, 40);
        assert_eq!(progress.message, "Encrypting files");

        tx.send(Ok(Bytes::from_static(COMPLETE.as_bytes()))).unwrap();
        let state = next_change(&mut rx).await;
        assert!(!state.active);
        assert_eq!(
            serde_json::Value::Object(state.result.unwrap()),
            json!({"job_id": "abc123"})
        );
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_nothing_after_complete_is_observable() {
        let body = fixed_body(&[
            COMPLETE,
            "event: progress\ndata: {\"stage\":\"late\",\"percent\":99}\n\n",
        ]);
        let consumer = StreamConsumer::new(ScriptedTransport::new(vec![Ok(body)]));
        consumer.start(request());

        let state = consumer.settled().await;
        assert!(!state.active);
        assert!(state.last_progress.is_none());
        assert!(state.result.is_some());
    }

    #[tokio::test]
    async fn test_open_error_ends_session() {
        let transport = ScriptedTransport::new(vec![Err(ApiError::Status {
            status: 400,
            detail: "bad request".to_string(),
        })]);
        let consumer = StreamConsumer::new(transport);
        consumer.start(request());

        let state = consumer.settled().await;
        assert!(!state.active);
        assert_eq!(state.error.as_deref(), Some("bad request"));
        assert!(state.result.is_none());
    }

    #[tokio::test]
    async fn test_missing_body_message() {
        let consumer = StreamConsumer::new(ScriptedTransport::new(vec![Err(ApiError::NoBody)]));
        consumer.start(request());
        let state = consumer.settled().await;
        assert_eq!(state.error.as_deref(), Some("no response body"));
    }

    #[tokio::test]
    async fn test_error_event_and_read_failure() {
        let body = fixed_body(&["event: error\ndata: {\"message\": \"Upload failed: HTTP 403\"}\n\n"]);
        let consumer = StreamConsumer::new(ScriptedTransport::new(vec![Ok(body)]));
        consumer.start(request());
        let state = consumer.settled().await;
        assert_eq!(state.error.as_deref(), Some("Upload failed: HTTP 403"));

        let body: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(Bytes::from_static(PROGRESS_40.as_bytes())),
            Err(ApiError::Interrupted("connection reset".to_string())),
        ]));
        let consumer = StreamConsumer::new(ScriptedTransport::new(vec![Ok(body)]));
        consumer.start(request());
        let state = consumer.settled().await;
        assert!(!state.active);
        assert_eq!(
            state.error.as_deref(),
            Some("stream interrupted: connection reset")
        );
        assert_eq!(state.last_progress.unwrap().percent, 40);
    }

    #[tokio::test]
    async fn test_malformed_json_fails_session() {
        let body = fixed_body(&["event: progress\ndata: {\"stage\": \n\n"]);
        let consumer = StreamConsumer::new(ScriptedTransport::new(vec![Ok(body)]));
        consumer.start(request());

        let state = consumer.settled().await;
        assert!(!state.active);
        assert!(state
            .error
            .unwrap()
            .starts_with("malformed progress event:"));
    }

    #[tokio::test]
    async fn test_close_without_outcome() {
        let body = fixed_body(&[PROGRESS_40, "event: heartbeat\ndata: {}\n"]);
        let consumer = StreamConsumer::new(ScriptedTransport::new(vec![Ok(body)]));
        consumer.start(request());

        let state = consumer.settled().await;
        assert!(state.active);
        assert!(state.closed_without_outcome());
        assert_eq!(state.last_progress.unwrap().stage, "encrypting");
    }

    #[tokio::test]
    async fn test_reset_mid_read_blocks_late_chunks() {
        let (tx, body) = channel_body();
        let consumer = StreamConsumer::new(ScriptedTransport::new(vec![Ok(body)]));
        let mut rx = consumer.subscribe();
        consumer.start(request());
        next_change(&mut rx).await;

        tx.send(Ok(Bytes::from_static(PROGRESS_40.as_bytes()))).unwrap();
        assert!(next_change(&mut rx).await.last_progress.is_some());

        consumer.reset();
        assert_eq!(consumer.state(), StreamState::default());

        // The loop has been cancelled; the receiver may already be gone
        let _ = tx.send(Ok(Bytes::from_static(COMPLETE.as_bytes())));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(consumer.state(), StreamState::default());
    }

    #[tokio::test]
    async fn test_restart_ignores_stale_loop() {
        let (old_tx, old_body) = channel_body();
        let (new_tx, new_body) = channel_body();
        let consumer = StreamConsumer::new(ScriptedTransport::new(vec![Ok(old_body), Ok(new_body)]));

        let mut rx = consumer.subscribe();
        let first = consumer.start(request());
        next_change(&mut rx).await;
        old_tx.send(Ok(Bytes::from_static(PROGRESS_40.as_bytes()))).unwrap();
        assert!(next_change(&mut rx).await.last_progress.is_some());

        let second = consumer.start(request());
        assert!(second > first);

        let state = consumer.state();
        assert!(state.active);
        assert!(state.last_progress.is_none());

        let _ = old_tx.send(Ok(Bytes::from_static(COMPLETE.as_bytes())));
        new_tx
            .send(Ok(Bytes::from_static(
                b"event: error\ndata: {\"message\":\"second\"}\n\n",
            )))
            .unwrap();

        let state = consumer.settled().await;
        assert_eq!(state.error.as_deref(), Some("second"));
        assert!(state.result.is_none());
        assert!(state.last_progress.is_none());
    }
}
