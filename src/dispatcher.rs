//! JSON-RPC dispatcher over a pair of byte streams.
//!
//! One reader task consumes frames from the server's output; one writer
//! task serializes every outbound frame so concurrent senders never
//! interleave partial frames. In-flight requests live in an id-keyed map
//! and are resolved individually as responses arrive, in whatever order
//! the server chooses to answer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::codec::{FrameEvent, FrameReader, FrameWriter};
use crate::error::Error;
use crate::protocol;

const WRITER_CHANNEL_CAPACITY: usize = 64;
const FIRST_REQUEST_ID: u64 = 1;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, Error>>>>>;
type NotificationSlot = Arc<StdMutex<Option<Box<dyn Fn(String, Option<Value>) + Send>>>>;
type CloseSlot = Arc<StdMutex<Option<Box<dyn Fn() + Send>>>>;

type BoxedReader = FrameReader<Box<dyn AsyncRead + Send + Unpin>>;

/// Lock a callback slot, shrugging off poisoning from a panicked callback.
fn lock<T>(slot: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn notify_close(slot: &CloseSlot) {
    if let Some(callback) = lock(slot).as_ref() {
        callback();
    }
}

/// Owns the connection to a JSON-RPC peer.
///
/// The byte streams are exclusively this dispatcher's; the pending-call
/// table is touched only from [`Dispatcher::send`], [`Dispatcher::stop`]
/// and the reader task.
pub struct Dispatcher {
    writer_tx: mpsc::Sender<Value>,
    pending: PendingMap,
    next_id: AtomicU64,
    notification_handler: NotificationSlot,
    on_close: CloseSlot,
    reader: StdMutex<Option<BoxedReader>>,
    read_task: StdMutex<Option<JoinHandle<()>>>,
    #[allow(dead_code)]
    writer_task: JoinHandle<()>,
}

impl Dispatcher {
    /// Wrap a stream pair. The writer task starts immediately; the read
    /// loop waits for [`Dispatcher::start`].
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        let (writer_tx, mut writer_rx) = mpsc::channel::<Value>(WRITER_CHANNEL_CAPACITY);
        let on_close: CloseSlot = Arc::new(StdMutex::new(None));

        let writer_close = on_close.clone();
        let writer_task = tokio::spawn(async move {
            let mut writer = FrameWriter::new(writer);
            while let Some(frame) = writer_rx.recv().await {
                if let Err(e) = writer.write_frame(&frame).await {
                    tracing::warn!("write error on server stream: {e}");
                    notify_close(&writer_close);
                    break;
                }
            }
        });

        let boxed: Box<dyn AsyncRead + Send + Unpin> = Box::new(reader);
        Self {
            writer_tx,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(FIRST_REQUEST_ID),
            notification_handler: Arc::new(StdMutex::new(None)),
            on_close,
            reader: StdMutex::new(Some(FrameReader::new(boxed))),
            read_task: StdMutex::new(None),
            writer_task,
        }
    }

    /// Begin the read loop as a background task.
    ///
    /// Calling `start` a second time is a logged no-op; the stream was
    /// already handed to the first loop.
    pub fn start(&self) {
        let Some(mut reader) = lock(&self.reader).take() else {
            tracing::warn!("dispatcher already started");
            return;
        };

        let pending = self.pending.clone();
        let writer_tx = self.writer_tx.clone();
        let notification_handler = self.notification_handler.clone();
        let on_close = self.on_close.clone();

        let handle = tokio::spawn(async move {
            loop {
                match reader.read_frame().await {
                    Ok(FrameEvent::Message(frame)) => {
                        Self::dispatch_frame(frame, &pending, &writer_tx, &notification_handler)
                            .await;
                    }
                    Ok(FrameEvent::Malformed(defect)) => {
                        tracing::warn!("malformed frame from server: {}", defect.message());
                        let frame = protocol::error_frame(defect.code(), defect.message(), None);
                        let _ = writer_tx.send(frame).await;
                    }
                    Ok(FrameEvent::Eof) => {
                        tracing::info!("server closed its output stream");
                        notify_close(&on_close);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("read error on server stream: {e}");
                        notify_close(&on_close);
                        break;
                    }
                }
            }
        });

        *lock(&self.read_task) = Some(handle);
    }

    /// Route one decoded frame.
    async fn dispatch_frame(
        frame: Value,
        pending: &Mutex<HashMap<u64, oneshot::Sender<Result<Value, Error>>>>,
        writer_tx: &mpsc::Sender<Value>,
        notification_handler: &NotificationSlot,
    ) {
        if frame.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            tracing::warn!("frame with missing or invalid jsonrpc version");
            let reply =
                protocol::error_frame(protocol::INVALID_REQUEST, "invalid JSON-RPC version", None);
            let _ = writer_tx.send(reply).await;
            return;
        }

        if let Some(id_value) = frame.get("id") {
            // Anything carrying an id correlates by id alone; ids without
            // a pending call (already cancelled, or a server-initiated
            // request) are dropped.
            let Some(id) = id_value.as_u64() else {
                tracing::trace!("frame with non-integer id discarded");
                return;
            };
            let sender = pending.lock().await.remove(&id);
            let Some(tx) = sender else {
                tracing::trace!(id, "frame for unknown request id discarded");
                return;
            };
            let outcome = if let Some(result) = frame.get("result") {
                Ok(result.clone())
            } else if let Some(error) = frame.get("error") {
                Err(Error::from_error_object(error))
            } else {
                Err(Error::InvalidResponse)
            };
            let _ = tx.send(outcome);
        } else if let Some(method) = frame.get("method").and_then(Value::as_str) {
            let params = frame.get("params").cloned();
            if let Some(callback) = lock(notification_handler).as_ref() {
                callback(method.to_string(), params);
            } else {
                tracing::trace!("notification '{method}' dropped: no handler registered");
            }
        } else {
            tracing::trace!("frame with neither id nor method discarded");
        }
    }

    /// Cancel the read loop and fail every pending call.
    ///
    /// Safe to call without a prior [`Dispatcher::start`]. The id counter
    /// resets to its initial value.
    pub async fn stop(&self) {
        if let Some(task) = lock(&self.read_task).take() {
            task.abort();
        }
        let mut pending = self.pending.lock().await;
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(Error::Cancelled));
        }
        drop(pending);
        self.next_id.store(FIRST_REQUEST_ID, Ordering::Relaxed);
    }

    /// Send a request and suspend until its response arrives.
    ///
    /// Returns the server's `result` payload, [`Error::Server`] when the
    /// server answered with an error object, or [`Error::Cancelled`] when
    /// the dispatcher was stopped first. There is no timeout: an
    /// unanswered request pends until [`Dispatcher::stop`].
    pub async fn send(&self, method: &str, params: Option<Value>) -> Result<Value, Error> {
        if method.is_empty() {
            return Err(Error::EmptyMethod);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let frame = protocol::request_frame(id, method, params);
        if self.writer_tx.send(frame).await.is_err() {
            // Don't leak the pending entry if the frame never left.
            self.pending.lock().await.remove(&id);
            return Err(Error::WriterClosed);
        }

        match rx.await {
            Ok(outcome) => outcome,
            // Sender dropped without a value: the dispatcher went away.
            Err(_) => Err(Error::Cancelled),
        }
    }

    /// Send a fire-and-forget notification (no id, no response).
    pub async fn send_notification(&self, method: &str, params: Option<Value>) -> Result<(), Error> {
        if method.is_empty() {
            return Err(Error::EmptyMethod);
        }
        self.writer_tx
            .send(protocol::notification_frame(method, params))
            .await
            .map_err(|_| Error::WriterClosed)
    }

    /// Send a JSON-RPC error object to the peer, used when this side
    /// rejects a malformed inbound message.
    pub async fn send_error(
        &self,
        code: i64,
        message: &str,
        data: Option<Value>,
    ) -> Result<(), Error> {
        self.writer_tx
            .send(protocol::error_frame(code, message, data))
            .await
            .map_err(|_| Error::WriterClosed)
    }

    /// Register the single sink for id-less inbound messages.
    pub fn set_notification_handler(
        &self,
        handler: impl Fn(String, Option<Value>) + Send + 'static,
    ) {
        *lock(&self.notification_handler) = Some(Box::new(handler));
    }

    /// Register a callback invoked when either stream fails or closes.
    pub fn set_close_handler(&self, handler: impl Fn() + Send + 'static) {
        *lock(&self.on_close) = Some(Box::new(handler));
    }

    #[cfg(test)]
    pub(crate) async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    #[cfg(test)]
    pub(crate) fn next_request_id(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.read_task).take() {
            task.abort();
        }
    }
}
