//! Server-Sent Events stream manager.
//!
//! Opens one long-lived `GET` per subscription, decodes the
//! `text/event-stream` body and hands every `(event name, payload)` pair
//! to the consumer through a [`StreamHandle`], in arrival order.
//!
//! There is no reconnection: a transport error or the server ending the
//! body closes the handle and delivers a single terminal
//! [`StreamMessage`]. Callers decide what to do next.
//!
//! # Example
//!
//! ```rust,ignore
//! use filmdeck_api::{BackendClient, StreamManager, StreamMessage, StreamSubscription};
//!
//! let manager = StreamManager::new(&client);
//! let mut handle = manager.open(StreamSubscription::new("dashboard-sse"))?;
//!
//! while let Some(message) = handle.recv().await {
//!     match message {
//!         StreamMessage::Event(event) => println!("{} = {}", event.name, event.data),
//!         StreamMessage::Ended | StreamMessage::Failed(_) => break,
//!     }
//! }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use bytes::Bytes;
use dashmap::DashSet;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::client::{BackendClient, check_status};
use crate::error::Error;

// ── Channel capacity ─────────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Name given to events without an `event:` field.
pub const DEFAULT_EVENT_NAME: &str = "message";

// ── SseEvent ─────────────────────────────────────────────────────────

/// One dispatched Server-Sent Event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, or [`DEFAULT_EVENT_NAME`].
    pub name: String,
    /// All `data:` lines joined with `\n`.
    pub data: String,
}

// ── SseDecoder ───────────────────────────────────────────────────────

/// Incremental `text/event-stream` decoder.
///
/// Feed it raw body chunks as they arrive; it buffers partial lines
/// across chunk boundaries and returns every event completed by a blank
/// line. `id:` and `retry:` fields are ignored since the stream is
/// never resumed.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line_buffer: Vec<u8>,
    event_name: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, returning the events it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.line_buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline_index) = self.line_buffer.iter().position(|byte| *byte == b'\n') {
            let mut line = self.line_buffer.drain(..=newline_index).collect::<Vec<_>>();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event_name = Some(value.to_owned()),
            "data" => self.data.push(value.to_owned()),
            "id" | "retry" => {}
            other => trace!(field = other, "ignoring unknown SSE field"),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let name = self.event_name.take();
        if self.data.is_empty() {
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();

        Some(SseEvent {
            name: name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT_NAME.to_owned()),
            data,
        })
    }
}

// ── StreamSubscription ───────────────────────────────────────────────

/// What to open: an endpoint below the backend root, plus an optional
/// name for events that arrive without an `event:` field.
///
/// Per-resource streams (`light-stream`) only send bare `data:` lines,
/// so `unnamed_as("light_active")` lets them feed the same merge path
/// as the named events of the shared dashboard stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSubscription {
    pub endpoint: String,
    pub unnamed_as: Option<String>,
}

impl StreamSubscription {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            unnamed_as: None,
        }
    }

    pub fn unnamed_as(mut self, name: impl Into<String>) -> Self {
        self.unnamed_as = Some(name.into());
        self
    }
}

// ── StreamMessage ────────────────────────────────────────────────────

/// What a [`StreamHandle`] yields.
#[derive(Debug)]
pub enum StreamMessage {
    /// A decoded event, in arrival order.
    Event(SseEvent),
    /// The backend finished the body. The handle is already closed.
    Ended,
    /// Connecting or reading failed. The handle is already closed.
    Failed(Error),
}

// ── StreamManager ────────────────────────────────────────────────────

/// Opens event streams against one backend and enforces a single open
/// stream per endpoint.
#[derive(Debug, Clone)]
pub struct StreamManager {
    http: reqwest::Client,
    base_url: Url,
    open: Arc<DashSet<String>>,
}

impl StreamManager {
    pub fn new(client: &BackendClient) -> Self {
        Self {
            http: client.http().clone(),
            base_url: client.base_url().clone(),
            open: Arc::new(DashSet::new()),
        }
    }

    /// Open a stream and spawn its reader task.
    ///
    /// Returns as soon as the task is spawned; connection failures
    /// arrive as [`StreamMessage::Failed`]. Must be called from within a
    /// Tokio runtime.
    pub fn open(&self, subscription: StreamSubscription) -> Result<StreamHandle, Error> {
        let url = self
            .base_url
            .join(subscription.endpoint.trim_start_matches('/'))?;
        let request = self
            .http
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");

        let (handle, tx) = self.register(&subscription.endpoint)?;
        let shared = Arc::clone(&handle.shared);

        tokio::spawn(async move {
            info!(url = %url, "opening event stream");
            let connected = tokio::select! {
                biased;
                () = shared.cancel.cancelled() => return,
                result = request.send() => result,
            };

            let response = match connected {
                Ok(response) => check_status(response).await,
                Err(e) => Err(Error::from(e)),
            };

            match response {
                Ok(response) => {
                    debug!(endpoint = %shared.endpoint, "event stream connected");
                    let body = response
                        .bytes_stream()
                        .map(|chunk| chunk.map_err(|e| Error::StreamRead(e.to_string())));
                    pump(body, &shared, subscription.unnamed_as, &tx).await;
                }
                Err(e) => {
                    fail(&shared, &tx, Error::StreamConnect(e.to_string())).await;
                }
            }
        });

        Ok(handle)
    }

    /// Attach an already-open byte stream as if it were the response
    /// body of `subscription`.
    ///
    /// Useful for feeding recorded streams and for tests.
    pub fn attach<S>(&self, subscription: StreamSubscription, body: S) -> Result<StreamHandle, Error>
    where
        S: Stream<Item = Result<Bytes, Error>> + Send + 'static,
    {
        let (handle, tx) = self.register(&subscription.endpoint)?;
        let shared = Arc::clone(&handle.shared);

        tokio::spawn(async move {
            pump(body, &shared, subscription.unnamed_as, &tx).await;
        });

        Ok(handle)
    }

    /// Whether a stream is currently open for `endpoint`.
    pub fn is_open(&self, endpoint: &str) -> bool {
        self.open.contains(endpoint)
    }

    fn register(
        &self,
        endpoint: &str,
    ) -> Result<(StreamHandle, mpsc::Sender<StreamMessage>), Error> {
        if !self.open.insert(endpoint.to_owned()) {
            return Err(Error::StreamAlreadyOpen {
                endpoint: endpoint.to_owned(),
            });
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let shared = Arc::new(StreamShared {
            endpoint: endpoint.to_owned(),
            closed: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            registry: Arc::clone(&self.open),
        });

        Ok((StreamHandle { shared, rx }, tx))
    }
}

// ── StreamHandle ─────────────────────────────────────────────────────

/// State shared between a handle and its reader task.
#[derive(Debug)]
struct StreamShared {
    endpoint: String,
    closed: AtomicBool,
    cancel: CancellationToken,
    registry: Arc<DashSet<String>>,
}

impl StreamShared {
    /// Close once. Returns `true` only for the call that closed.
    fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.cancel.cancel();
        self.registry.remove(&self.endpoint);
        debug!(endpoint = %self.endpoint, "event stream closed");
        true
    }
}

/// Handle to one open event stream.
///
/// Yields [`StreamMessage`]s via [`recv`](Self::recv) or as a `Stream`.
/// Dropping the handle closes the stream.
#[derive(Debug)]
pub struct StreamHandle {
    shared: Arc<StreamShared>,
    rx: mpsc::Receiver<StreamMessage>,
}

impl StreamHandle {
    /// The endpoint this handle was opened for.
    pub fn endpoint(&self) -> &str {
        &self.shared.endpoint
    }

    /// Next message, or `None` once the reader task is gone and every
    /// buffered message has been consumed.
    pub async fn recv(&mut self) -> Option<StreamMessage> {
        self.rx.recv().await
    }

    /// Close the stream. Idempotent; returns `true` only if this call
    /// did the closing (it returns `false` after the reader task already
    /// closed the handle on error).
    pub fn close(&self) -> bool {
        self.shared.close()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}

impl Stream for StreamHandle {
    type Item = StreamMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.shared.close();
    }
}

// ── Reader task ──────────────────────────────────────────────────────

/// Decode `body` and forward events until it ends, fails, or the
/// handle is closed.
async fn pump<S>(
    body: S,
    shared: &StreamShared,
    unnamed_as: Option<String>,
    tx: &mpsc::Sender<StreamMessage>,
) where
    S: Stream<Item = Result<Bytes, Error>>,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = SseDecoder::new();

    loop {
        let chunk = tokio::select! {
            biased;
            () = shared.cancel.cancelled() => return,
            chunk = body.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                for mut event in decoder.feed(&bytes) {
                    if event.name == DEFAULT_EVENT_NAME {
                        if let Some(ref name) = unnamed_as {
                            event.name.clone_from(name);
                        }
                    }
                    trace!(endpoint = %shared.endpoint, event = %event.name, "event received");

                    if tx.send(StreamMessage::Event(event)).await.is_err() {
                        // Handle dropped.
                        shared.close();
                        return;
                    }
                }
            }
            Some(Err(e)) => {
                fail(shared, tx, e).await;
                return;
            }
            None => {
                info!(endpoint = %shared.endpoint, "event stream ended by backend");
                shared.close();
                let _ = tx.send(StreamMessage::Ended).await;
                return;
            }
        }
    }
}

async fn fail(shared: &StreamShared, tx: &mpsc::Sender<StreamMessage>, error: Error) {
    warn!(endpoint = %shared.endpoint, error = %error, "event stream failed");
    shared.close();
    let _ = tx.send(StreamMessage::Failed(error)).await;
}

// ── Tests ────────────────────────────────────────────────────────────
