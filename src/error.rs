//! Error types surfaced by the client.

use thiserror::Error;

/// Errors returned by the dispatcher, session and process launcher.
///
/// Callers are expected to branch on the variant: a [`Error::Server`] is a
/// per-request failure the feature can ignore or retry, a
/// [`Error::Cancelled`] means the whole connection is going away, and a
/// [`Error::Spawn`] means the application should degrade to running without
/// language support.
#[derive(Debug, Error)]
pub enum Error {
    /// A request or notification was given an empty method name.
    #[error("method name must not be empty")]
    EmptyMethod,

    /// The outbound writer task has shut down; no further frames can be sent.
    #[error("connection writer closed")]
    WriterClosed,

    /// The dispatcher was stopped while this request was still pending.
    #[error("request cancelled by dispatcher shutdown")]
    Cancelled,

    /// The server answered the request with a JSON-RPC error object.
    #[error("server error {code}: {message}")]
    Server {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// A response carried neither `result` nor `error`.
    #[error("response carried neither result nor error")]
    InvalidResponse,

    /// `open_document` was called for a URI that is already tracked.
    #[error("document already open: {0}")]
    DocumentExists(String),

    /// `close_document`/`update_document` was called for an untracked URI.
    #[error("document not open: {0}")]
    DocumentNotFound(String),

    /// The `initialize` handshake failed; language features should be
    /// disabled rather than retried.
    #[error("initialize handshake failed: {0}")]
    Initialize(String),

    /// The server executable could not be located or started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure on the underlying streams.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::Server`] from the `error` member of a response.
    ///
    /// JSON-RPC requires `code` and `message`; servers that omit them get
    /// placeholder values rather than crashing the read loop.
    pub(crate) fn from_error_object(error: &serde_json::Value) -> Self {
        Self::Server {
            code: error
                .get("code")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or_default(),
            message: error
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown server error")
                .to_string(),
            data: error.get("data").cloned(),
        }
    }
}
