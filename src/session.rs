//! LSP session — the protocol-aware layer above the dispatcher.
//!
//! A session performs the `initialize`/`initialized` handshake on
//! construction, captures the server's capability snapshot, tracks open
//! documents with monotonic version counters, attaches a work-done token to
//! every outgoing request, and performs the `exit` sequence on teardown.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex as StdMutex, PoisonError};

use serde_json::{Value, json};
use uuid::Uuid;

use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::process::ServerProcess;
use crate::protocol::{self, ServerCapabilities, SyncKind};
use crate::types::{ServerConfig, ServerNotification};

/// Client identity and document language advertised to the server.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub client_name: String,
    pub client_version: String,
    /// LSP language identifier used in `didOpen` (e.g. "python").
    pub language_id: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            client_name: "rose".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            language_id: "python".to_string(),
        }
    }
}

/// Per-URI document record. Owned exclusively by the session; consumers
/// only ever see copies.
#[derive(Debug)]
struct DocumentState {
    text: String,
    version: i64,
}

type TokenSet = StdMutex<HashSet<String>>;

fn lock<T>(slot: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Attach a fresh work-done token for the duration of one request.
///
/// The token map is write-only bookkeeping: tokens are inserted before the
/// request and removed when it resolves, success or failure, but nothing
/// reads them back for progress correlation.
async fn request_with_token(
    dispatcher: &Dispatcher,
    tokens: &TokenSet,
    method: &str,
    params: Option<Value>,
) -> Result<Value, Error> {
    let token = Uuid::new_v4().to_string();
    lock(tokens).insert(token.clone());

    let params = params.map(|mut p| {
        if let Some(object) = p.as_object_mut() {
            object.insert("workDoneToken".to_string(), Value::String(token.clone()));
        }
        p
    });

    let result = dispatcher.send(method, params).await;
    lock(tokens).remove(&token);
    result
}

/// A ready LSP session.
///
/// Construction is initialization: [`Session::initialize`] only returns a
/// value after the handshake succeeded, so holding a `Session` is proof the
/// server is usable. [`Session::exit`] consumes the session; there is no
/// closed-but-reachable state.
pub struct Session {
    dispatcher: Dispatcher,
    capabilities: ServerCapabilities,
    documents: HashMap<String, DocumentState>,
    work_progress: TokenSet,
    language_id: String,
    child: Option<ServerProcess>,
}

impl Session {
    /// Spawn a language server and run the handshake against it.
    ///
    /// Any failure — binary missing, spawn refused, handshake rejected —
    /// comes back as an error the application should treat as "run without
    /// language support", not as fatal.
    pub async fn spawn(config: &ServerConfig, options: SessionOptions) -> Result<Self, Error> {
        let (process, io) = ServerProcess::spawn(config)?;
        let dispatcher = Dispatcher::new(io.stdout, io.stdin);
        Self::handshake(dispatcher, options, Some(process)).await
    }

    /// Run the handshake over an unstarted dispatcher.
    ///
    /// Takes ownership of the dispatcher and starts its read loop.
    pub async fn initialize(dispatcher: Dispatcher, options: SessionOptions) -> Result<Self, Error> {
        Self::handshake(dispatcher, options, None).await
    }

    async fn handshake(
        dispatcher: Dispatcher,
        options: SessionOptions,
        child: Option<ServerProcess>,
    ) -> Result<Self, Error> {
        dispatcher.start();

        let work_progress: TokenSet = StdMutex::new(HashSet::new());
        let params = protocol::initialize_params(&options.client_name, &options.client_version);
        let result = request_with_token(&dispatcher, &work_progress, "initialize", Some(params))
            .await
            .map_err(|e| Error::Initialize(e.to_string()))?;

        let capabilities_value = result
            .get("capabilities")
            .cloned()
            .ok_or_else(|| Error::Initialize("initialize result carried no capabilities".into()))?;
        let capabilities: ServerCapabilities = serde_json::from_value(capabilities_value)
            .map_err(|e| Error::Initialize(format!("undecodable server capabilities: {e}")))?;

        dispatcher
            .send_notification("initialized", Some(json!({})))
            .await
            .map_err(|e| Error::Initialize(e.to_string()))?;

        tracing::info!(sync_kind = ?capabilities.sync_kind(), "LSP session ready");

        Ok(Self {
            dispatcher,
            capabilities,
            documents: HashMap::new(),
            work_progress,
            language_id: options.language_id,
            child,
        })
    }

    /// The capability snapshot captured during the handshake.
    #[must_use]
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// Register the sink for all server-initiated notifications.
    ///
    /// The raw `(method, params)` pair is decoded once into
    /// [`ServerNotification`] before the callback sees it.
    pub fn set_notification_handler(
        &self,
        handler: impl Fn(ServerNotification) + Send + 'static,
    ) {
        self.dispatcher
            .set_notification_handler(move |method, params| {
                handler(ServerNotification::decode(&method, params));
            });
    }

    /// Current version of a tracked document, if open.
    #[must_use]
    pub fn document_version(&self, uri: &str) -> Option<i64> {
        self.documents.get(uri).map(|doc| doc.version)
    }

    /// Open a document and announce it with `textDocument/didOpen`.
    pub async fn open_document(&mut self, uri: &str, text: &str) -> Result<(), Error> {
        if self.documents.contains_key(uri) {
            return Err(Error::DocumentExists(uri.to_string()));
        }
        self.documents.insert(
            uri.to_string(),
            DocumentState {
                text: text.to_string(),
                version: 0,
            },
        );
        let params = protocol::did_open_params(uri, &self.language_id, 0, text);
        self.notify("textDocument/didOpen", Some(params)).await
    }

    /// Close a tracked document and announce it with `textDocument/didClose`.
    pub async fn close_document(&mut self, uri: &str) -> Result<(), Error> {
        if self.documents.remove(uri).is_none() {
            return Err(Error::DocumentNotFound(uri.to_string()));
        }
        self.notify("textDocument/didClose", Some(protocol::did_close_params(uri)))
            .await
    }

    /// Replace a tracked document's text and announce the change.
    ///
    /// The version bumps by exactly 1 whether or not the content differs.
    /// The shape of `contentChanges` follows the negotiated sync kind:
    /// empty for `None`, whole text for `Full`, and the two-edit
    /// whole-document replacement for `Incremental`.
    pub async fn update_document(&mut self, uri: &str, text: &str) -> Result<(), Error> {
        let Some(doc) = self.documents.get_mut(uri) else {
            return Err(Error::DocumentNotFound(uri.to_string()));
        };

        let content_changes = match self.capabilities.sync_kind() {
            SyncKind::None => Vec::new(),
            SyncKind::Full => vec![json!({"text": text})],
            SyncKind::Incremental => full_replace_changes(&doc.text, text),
        };

        doc.version += 1;
        doc.text = text.to_string();
        let version = doc.version;

        let params = protocol::did_change_params(uri, version, content_changes);
        self.notify("textDocument/didChange", Some(params)).await
    }

    /// Send a request with work-done-token bookkeeping.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, Error> {
        request_with_token(&self.dispatcher, &self.work_progress, method, params).await
    }

    /// `textDocument/completion`
    pub async fn completion(&self, params: Value) -> Result<Value, Error> {
        self.request("textDocument/completion", Some(params)).await
    }

    /// `textDocument/hover`
    pub async fn hover(&self, params: Value) -> Result<Value, Error> {
        self.request("textDocument/hover", Some(params)).await
    }

    /// `textDocument/documentHighlight`
    pub async fn document_highlight(&self, params: Value) -> Result<Value, Error> {
        self.request("textDocument/documentHighlight", Some(params))
            .await
    }

    /// Send a fire-and-forget notification.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), Error> {
        self.dispatcher.send_notification(method, params).await
    }

    /// Tell the server to exit and tear the session down.
    ///
    /// Pending requests fail with a cancellation error; when the session
    /// owns the child process it is given a moment to exit and then killed.
    pub async fn exit(mut self) {
        if let Err(e) = self.notify("exit", None).await {
            tracing::debug!("exit notification not sent: {e}");
        }
        self.dispatcher.stop().await;
        if let Some(child) = self.child.take() {
            child.shutdown().await;
        }
    }

    #[cfg(test)]
    pub(crate) fn work_progress_len(&self) -> usize {
        lock(&self.work_progress).len()
    }
}

/// Whole-document replacement expressed as up to two edits: delete the
/// previous text's full range, then insert the new text at the origin.
/// Functionally equivalent to a real diff, just not bandwidth-efficient.
///
/// TODO: compute a minimal line diff here so Incremental sync stops
/// resending the whole document.
fn full_replace_changes(old_text: &str, new_text: &str) -> Vec<Value> {
    fn end_position(text: &str) -> (usize, usize) {
        let lines: Vec<&str> = text.lines().collect();
        let end_line = lines.len();
        let end_character = lines.last().map_or(0, |line| line.len());
        (end_line, end_character)
    }

    let mut changes = Vec::new();

    if !old_text.is_empty() {
        let (end_line, end_character) = end_position(old_text);
        changes.push(json!({
            "range": {
                "start": {"line": 0, "character": 0},
                "end": {"line": end_line, "character": end_character},
            },
            "text": "",
        }));
    }

    if !new_text.is_empty() {
        let (end_line, end_character) = end_position(new_text);
        changes.push(json!({
            "range": {
                "start": {"line": 0, "character": 0},
                "end": {"line": end_line, "character": end_character},
            },
            "text": new_text,
        }));
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FrameEvent, FrameReader, FrameWriter};
    use tokio::io::{AsyncRead, ReadHalf, WriteHalf};

    type ServerReader = FrameReader<ReadHalf<tokio::io::DuplexStream>>;
    type ServerWriter = FrameWriter<WriteHalf<tokio::io::DuplexStream>>;

    async fn expect_message<R: AsyncRead + Unpin>(reader: &mut FrameReader<R>) -> Value {
        match reader.read_frame().await.unwrap() {
            FrameEvent::Message(value) => value,
            other => panic!("expected Message, got {other:?}"),
        }
    }

    /// Build a session over an in-memory pipe against a scripted server
    /// that answers `initialize` with the given `textDocumentSync` value.
    async fn ready_session(sync: Value) -> (Session, ServerReader, ServerWriter) {
        let (client_side, server_side) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client_side);
        let (server_read, server_write) = tokio::io::split(server_side);
        let dispatcher = Dispatcher::new(client_read, client_write);
        let mut srv_reader = FrameReader::new(server_read);
        let mut srv_writer = FrameWriter::new(server_write);

        let server = async move {
            let init = expect_message(&mut srv_reader).await;
            assert_eq!(init["method"], "initialize");
            srv_writer
                .write_frame(&json!({
                    "jsonrpc": "2.0",
                    "id": init["id"],
                    "result": {"capabilities": {"textDocumentSync": sync}}
                }))
                .await
                .unwrap();

            let initialized = expect_message(&mut srv_reader).await;
            assert_eq!(initialized["method"], "initialized");

            (init, srv_reader, srv_writer)
        };

        let session = Session::initialize(dispatcher, SessionOptions::default());
        let (session, (_init, srv_reader, srv_writer)) = tokio::join!(session, server);
        (session.unwrap(), srv_reader, srv_writer)
    }

    #[tokio::test]
    async fn test_initialize_captures_capabilities() {
        let (session, _r, _w) = ready_session(json!(1)).await;
        assert_eq!(session.capabilities().sync_kind(), SyncKind::Full);
        assert_eq!(session.work_progress_len(), 0);
    }

    #[tokio::test]
    async fn test_initialize_request_content() {
        let (client_side, server_side) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client_side);
        let (server_read, server_write) = tokio::io::split(server_side);
        let dispatcher = Dispatcher::new(client_read, client_write);
        let mut srv_reader = FrameReader::new(server_read);
        let mut srv_writer = FrameWriter::new(server_write);

        let server = async move {
            let init = expect_message(&mut srv_reader).await;
            assert_eq!(init["id"], 1);
            assert!(init["params"]["processId"].is_number());
            assert_eq!(init["params"]["clientInfo"]["name"], "rose");
            assert_eq!(init["params"]["locale"], "en");
            assert!(init["params"]["rootUri"].is_null());
            assert_eq!(init["params"]["trace"], "off");
            // Every request carries a work-done token.
            assert!(init["params"]["workDoneToken"].is_string());

            srv_writer
                .write_frame(&json!({
                    "jsonrpc": "2.0",
                    "id": init["id"],
                    "result": {"capabilities": {}}
                }))
                .await
                .unwrap();
            let initialized = expect_message(&mut srv_reader).await;
            assert_eq!(initialized["method"], "initialized");
        };

        let session = Session::initialize(dispatcher, SessionOptions::default());
        let (session, ()) = tokio::join!(session, server);
        session.unwrap();
    }

    #[tokio::test]
    async fn test_initialize_without_capabilities_fails() {
        let (client_side, server_side) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client_side);
        let (server_read, server_write) = tokio::io::split(server_side);
        let dispatcher = Dispatcher::new(client_read, client_write);
        let mut srv_reader = FrameReader::new(server_read);
        let mut srv_writer = FrameWriter::new(server_write);

        let server = async move {
            let init = expect_message(&mut srv_reader).await;
            srv_writer
                .write_frame(&json!({"jsonrpc": "2.0", "id": init["id"], "result": {}}))
                .await
                .unwrap();
        };

        let session = Session::initialize(dispatcher, SessionOptions::default());
        let (session, ()) = tokio::join!(session, server);
        assert!(matches!(session, Err(Error::Initialize(_))));
    }

    #[tokio::test]
    async fn test_initialize_server_error_fails_distinguishably() {
        let (client_side, server_side) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client_side);
        let (server_read, server_write) = tokio::io::split(server_side);
        let dispatcher = Dispatcher::new(client_read, client_write);
        let mut srv_reader = FrameReader::new(server_read);
        let mut srv_writer = FrameWriter::new(server_write);

        let server = async move {
            let init = expect_message(&mut srv_reader).await;
            srv_writer
                .write_frame(&json!({
                    "jsonrpc": "2.0",
                    "id": init["id"],
                    "error": {"code": -32002, "message": "server not ready"}
                }))
                .await
                .unwrap();
        };

        let session = Session::initialize(dispatcher, SessionOptions::default());
        let (session, ()) = tokio::join!(session, server);
        match session {
            Err(Error::Initialize(reason)) => assert!(reason.contains("server not ready")),
            Err(other) => panic!("expected Initialize error, got {other:?}"),
            Ok(_) => panic!("expected Initialize error, got Ok"),
        }
    }

    #[tokio::test]
    async fn test_open_then_update_full_sync() {
        let (mut session, mut srv_reader, _w) = ready_session(json!(1)).await;

        session.open_document("file:///a.py", "x=1").await.unwrap();
        let did_open = expect_message(&mut srv_reader).await;
        assert_eq!(did_open["method"], "textDocument/didOpen");
        assert_eq!(did_open["params"]["textDocument"]["uri"], "file:///a.py");
        assert_eq!(did_open["params"]["textDocument"]["languageId"], "python");
        assert_eq!(did_open["params"]["textDocument"]["version"], 0);
        assert_eq!(did_open["params"]["textDocument"]["text"], "x=1");

        session
            .update_document("file:///a.py", "x=2")
            .await
            .unwrap();
        let did_change = expect_message(&mut srv_reader).await;
        assert_eq!(did_change["method"], "textDocument/didChange");
        assert_eq!(did_change["params"]["textDocument"]["version"], 1);
        assert_eq!(
            did_change["params"]["contentChanges"],
            json!([{"text": "x=2"}])
        );
    }

    #[tokio::test]
    async fn test_version_bumps_even_when_content_is_unchanged() {
        let (mut session, _r, _w) = ready_session(json!(1)).await;
        session.open_document("file:///a.py", "x=1").await.unwrap();

        session
            .update_document("file:///a.py", "x=1")
            .await
            .unwrap();
        session
            .update_document("file:///a.py", "x=1")
            .await
            .unwrap();

        assert_eq!(session.document_version("file:///a.py"), Some(2));
    }

    #[tokio::test]
    async fn test_sync_none_sends_empty_changes() {
        let (mut session, mut srv_reader, _w) = ready_session(json!(0)).await;
        session.open_document("file:///a.py", "x=1").await.unwrap();
        expect_message(&mut srv_reader).await; // didOpen

        session
            .update_document("file:///a.py", "x=2")
            .await
            .unwrap();
        let did_change = expect_message(&mut srv_reader).await;
        assert_eq!(did_change["params"]["textDocument"]["version"], 1);
        assert_eq!(did_change["params"]["contentChanges"], json!([]));
    }

    #[tokio::test]
    async fn test_sync_incremental_sends_delete_then_insert() {
        let (mut session, mut srv_reader, _w) = ready_session(json!(2)).await;
        session
            .open_document("file:///a.py", "a\nbc")
            .await
            .unwrap();
        expect_message(&mut srv_reader).await; // didOpen

        session
            .update_document("file:///a.py", "xyz")
            .await
            .unwrap();
        let did_change = expect_message(&mut srv_reader).await;
        let changes = did_change["params"]["contentChanges"].as_array().unwrap();
        assert_eq!(changes.len(), 2);
        // Delete of the whole previous text...
        assert_eq!(changes[0]["text"], "");
        assert_eq!(changes[0]["range"]["start"], json!({"line": 0, "character": 0}));
        assert_eq!(changes[0]["range"]["end"], json!({"line": 2, "character": 2}));
        // ...then insert of the whole new text.
        assert_eq!(changes[1]["text"], "xyz");
        assert_eq!(changes[1]["range"]["end"], json!({"line": 1, "character": 3}));
    }

    #[tokio::test]
    async fn test_open_duplicate_fails_without_side_effects() {
        let (mut session, mut srv_reader, _w) = ready_session(json!(1)).await;
        session.open_document("file:///a.py", "x=1").await.unwrap();
        expect_message(&mut srv_reader).await; // didOpen

        let result = session.open_document("file:///a.py", "other").await;
        assert!(matches!(result, Err(Error::DocumentExists(_))));
        assert_eq!(session.document_version("file:///a.py"), Some(0));

        // No didOpen was written for the rejected call: the next frame on
        // the wire is the didClose from a subsequent close.
        session.close_document("file:///a.py").await.unwrap();
        let next = expect_message(&mut srv_reader).await;
        assert_eq!(next["method"], "textDocument/didClose");
    }

    #[tokio::test]
    async fn test_update_and_close_untracked_fail_without_side_effects() {
        let (mut session, mut srv_reader, _w) = ready_session(json!(1)).await;

        assert!(matches!(
            session.update_document("file:///nope.py", "x").await,
            Err(Error::DocumentNotFound(_))
        ));
        assert!(matches!(
            session.close_document("file:///nope.py").await,
            Err(Error::DocumentNotFound(_))
        ));

        // Nothing was written: the next frame is the didOpen below.
        session.open_document("file:///a.py", "x=1").await.unwrap();
        let next = expect_message(&mut srv_reader).await;
        assert_eq!(next["method"], "textDocument/didOpen");
    }

    #[tokio::test]
    async fn test_close_removes_tracking() {
        let (mut session, mut srv_reader, _w) = ready_session(json!(1)).await;
        session.open_document("file:///a.py", "x=1").await.unwrap();
        expect_message(&mut srv_reader).await;

        session.close_document("file:///a.py").await.unwrap();
        let did_close = expect_message(&mut srv_reader).await;
        assert_eq!(did_close["method"], "textDocument/didClose");
        assert_eq!(did_close["params"]["textDocument"]["uri"], "file:///a.py");
        assert_eq!(session.document_version("file:///a.py"), None);

        // Reopening starts the version count over.
        session.open_document("file:///a.py", "y=2").await.unwrap();
        assert_eq!(session.document_version("file:///a.py"), Some(0));
    }

    #[tokio::test]
    async fn test_concurrent_hovers_resolve_to_their_own_results() {
        let (session, mut srv_reader, mut srv_writer) = ready_session(json!(1)).await;

        let hover_a = session.hover(json!({"position": {"line": 0, "character": 1}}));
        let hover_b = session.hover(json!({"position": {"line": 5, "character": 2}}));

        let server = async {
            let first = expect_message(&mut srv_reader).await;
            let second = expect_message(&mut srv_reader).await;
            // Answer the second request first.
            srv_writer
                .write_frame(&json!({
                    "jsonrpc": "2.0",
                    "id": second["id"],
                    "result": {"contents": "for-b"}
                }))
                .await
                .unwrap();
            srv_writer
                .write_frame(&json!({
                    "jsonrpc": "2.0",
                    "id": first["id"],
                    "result": {"contents": "for-a"}
                }))
                .await
                .unwrap();
        };

        let (result_a, result_b, ()) = tokio::join!(hover_a, hover_b, server);
        assert_eq!(result_a.unwrap()["contents"], "for-a");
        assert_eq!(result_b.unwrap()["contents"], "for-b");
        assert_eq!(session.work_progress_len(), 0);
    }

    #[tokio::test]
    async fn test_requests_carry_distinct_work_done_tokens() {
        let (session, mut srv_reader, mut srv_writer) = ready_session(json!(1)).await;

        let completion_a = session.completion(json!({}));
        let completion_b = session.completion(json!({}));

        let server = async {
            let first = expect_message(&mut srv_reader).await;
            let second = expect_message(&mut srv_reader).await;
            let token_a = first["params"]["workDoneToken"].as_str().unwrap().to_string();
            let token_b = second["params"]["workDoneToken"].as_str().unwrap().to_string();
            assert_ne!(token_a, token_b);

            for frame in [&first, &second] {
                srv_writer
                    .write_frame(&json!({"jsonrpc": "2.0", "id": frame["id"], "result": null}))
                    .await
                    .unwrap();
            }
        };

        let (ra, rb, ()) = tokio::join!(completion_a, completion_b, server);
        ra.unwrap();
        rb.unwrap();
        assert_eq!(session.work_progress_len(), 0);
    }

    #[tokio::test]
    async fn test_token_removed_when_request_fails() {
        let (session, mut srv_reader, mut srv_writer) = ready_session(json!(1)).await;

        let request = session.request("textDocument/definition", Some(json!({})));
        let server = async {
            let frame = expect_message(&mut srv_reader).await;
            srv_writer
                .write_frame(&json!({
                    "jsonrpc": "2.0",
                    "id": frame["id"],
                    "error": {"code": -32601, "message": "nope"}
                }))
                .await
                .unwrap();
        };

        let (result, ()) = tokio::join!(request, server);
        assert!(matches!(result, Err(Error::Server { .. })));
        assert_eq!(session.work_progress_len(), 0);
    }

    #[tokio::test]
    async fn test_notifications_decoded_for_handler() {
        let (session, _r, mut srv_writer) = ready_session(json!(1)).await;
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        session.set_notification_handler(move |notification| {
            let _ = tx.try_send(notification);
        });

        srv_writer
            .write_frame(&json!({
                "jsonrpc": "2.0",
                "method": "textDocument/publishDiagnostics",
                "params": {"uri": "file:///a.py", "diagnostics": []}
            }))
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            ServerNotification::PublishDiagnostics(params) => {
                assert_eq!(params.uri, "file:///a.py");
            }
            other => panic!("expected PublishDiagnostics, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exit_sends_notification_and_stops() {
        let (session, mut srv_reader, _w) = ready_session(json!(1)).await;

        session.exit().await;

        let exit = expect_message(&mut srv_reader).await;
        assert_eq!(exit["method"], "exit");
        assert!(exit.get("id").is_none());
    }

    #[test]
    fn test_full_replace_changes_both_sides() {
        let changes = full_replace_changes("a\nbc", "x");
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0]["text"], "");
        assert_eq!(changes[0]["range"]["end"]["line"], 2);
        assert_eq!(changes[0]["range"]["end"]["character"], 2);
        assert_eq!(changes[1]["text"], "x");
        assert_eq!(changes[1]["range"]["end"]["line"], 1);
        assert_eq!(changes[1]["range"]["end"]["character"], 1);
    }

    #[test]
    fn test_full_replace_changes_from_empty() {
        let changes = full_replace_changes("", "hello");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0]["text"], "hello");
    }

    #[test]
    fn test_full_replace_changes_to_empty() {
        let changes = full_replace_changes("hello", "");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0]["text"], "");
    }

    #[test]
    fn test_full_replace_changes_trailing_newline() {
        // "a\n" is one line; its end position is (1, 1).
        let changes = full_replace_changes("a\n", "b");
        assert_eq!(changes[0]["range"]["end"]["line"], 1);
        assert_eq!(changes[0]["range"]["end"]["character"], 1);
    }
}
