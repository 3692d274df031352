//! Wire-level JSON-RPC envelope builders, LSP params builders and the
//! server capability snapshot.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Value, json};

/// JSON-RPC: invalid JSON was received by the peer.
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC: the JSON sent is not a valid request object.
pub const INVALID_REQUEST: i64 = -32600;

#[derive(Debug, thiserror::Error)]
#[error("cannot convert path to file URI: {}", path.display())]
pub struct PathToUriError {
    path: PathBuf,
}

/// Build a request frame. `params` is omitted entirely when `None`.
pub(crate) fn request_frame(id: u64, method: &str, params: Option<Value>) -> Value {
    let mut frame = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
    });
    if let Some(params) = params {
        frame["params"] = params;
    }
    frame
}

/// Build a notification frame (no `id`).
pub(crate) fn notification_frame(method: &str, params: Option<Value>) -> Value {
    let mut frame = json!({
        "jsonrpc": "2.0",
        "method": method,
    });
    if let Some(params) = params {
        frame["params"] = params;
    }
    frame
}

/// Build an error response frame sent back to the peer when an inbound
/// message is rejected. The offending message had no usable id, so `id`
/// is `null` per the JSON-RPC spec.
pub(crate) fn error_frame(code: i64, message: &str, data: Option<Value>) -> Value {
    let mut frame = json!({
        "jsonrpc": "2.0",
        "id": null,
        "error": {
            "code": code,
            "message": message,
        },
    });
    if let Some(data) = data {
        frame["error"]["data"] = data;
    }
    frame
}

/// `initialize` params with the client's fixed capability advertisement:
/// the full completion item kind set with no snippet support, Markdown and
/// plain-text content formats, diagnostic tag support, UTF-8 position
/// encoding and tracing off.
pub(crate) fn initialize_params(client_name: &str, client_version: &str) -> Value {
    let completion_item_kinds: Vec<u8> = (1..=25).collect();
    json!({
        "processId": std::process::id(),
        "clientInfo": {"name": client_name, "version": client_version},
        "locale": "en",
        "rootUri": null,
        "capabilities": {
            "textDocument": {
                "completion": {
                    "completionItem": {
                        "snippetSupport": false,
                        "documentationFormat": ["markdown", "plaintext"],
                        "deprecatedSupport": true,
                        "tagSupport": {"valueSet": [1]},
                        "labelDetailsSupport": true,
                    },
                    "completionItemKind": {"valueSet": completion_item_kinds},
                },
                "hover": {
                    "contentFormat": ["markdown", "plaintext"],
                },
                "publishDiagnostics": {
                    // 1 = Unnecessary, 2 = Deprecated
                    "tagSupport": {"valueSet": [1, 2]},
                },
            },
            "general": {
                "regularExpressions": {"engine": "Rust"},
                "positionEncodings": ["utf-8"],
            },
        },
        "trace": "off",
    })
}

pub(crate) fn did_open_params(uri: &str, language_id: &str, version: i64, text: &str) -> Value {
    json!({
        "textDocument": {
            "uri": uri,
            "languageId": language_id,
            "version": version,
            "text": text,
        }
    })
}

pub(crate) fn did_change_params(uri: &str, version: i64, content_changes: Vec<Value>) -> Value {
    json!({
        "textDocument": {
            "uri": uri,
            "version": version,
        },
        "contentChanges": content_changes,
    })
}

pub(crate) fn did_close_params(uri: &str) -> Value {
    json!({
        "textDocument": {
            "uri": uri,
        }
    })
}

/// The server-declared strategy for reporting document edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    /// No content is sent; `didChange` still fires with empty changes.
    None,
    /// The whole document text is sent on every change.
    Full,
    /// Edits are sent as ranged changes.
    Incremental,
}

/// Immutable snapshot of the `initialize` response's `capabilities` member.
///
/// Captured once during the handshake and read-only thereafter. Consumers
/// check the provider flags before registering UI features.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default, rename = "textDocumentSync")]
    text_document_sync: Option<Value>,
    #[serde(default, rename = "completionProvider")]
    completion_provider: Option<Value>,
    #[serde(default, rename = "hoverProvider")]
    hover_provider: Option<Value>,
    #[serde(default, rename = "documentHighlightProvider")]
    document_highlight_provider: Option<Value>,
}

impl ServerCapabilities {
    /// The negotiated document sync strategy.
    ///
    /// `textDocumentSync` may be the bare numeric kind or a
    /// `TextDocumentSyncOptions` object carrying the kind in `change`.
    /// Anything absent or unrecognized degrades to [`SyncKind::None`].
    #[must_use]
    pub fn sync_kind(&self) -> SyncKind {
        let Some(raw) = &self.text_document_sync else {
            return SyncKind::None;
        };
        let kind = raw
            .as_u64()
            .or_else(|| raw.get("change").and_then(Value::as_u64));
        match kind {
            Some(1) => SyncKind::Full,
            Some(2) => SyncKind::Incremental,
            _ => SyncKind::None,
        }
    }

    /// Whether the server advertises `completionProvider`.
    #[must_use]
    pub fn completion_provider(&self) -> bool {
        provider_enabled(self.completion_provider.as_ref())
    }

    /// Whether the server advertises `hoverProvider`.
    #[must_use]
    pub fn hover_provider(&self) -> bool {
        provider_enabled(self.hover_provider.as_ref())
    }

    /// Whether the server advertises `documentHighlightProvider`.
    #[must_use]
    pub fn document_highlight_provider(&self) -> bool {
        provider_enabled(self.document_highlight_provider.as_ref())
    }
}

/// Provider capabilities may be `true`, an options object, or absent/false.
fn provider_enabled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null | Value::Bool(false)) => false,
        Some(_) => true,
    }
}

pub fn path_to_file_uri(path: &Path) -> Result<url::Url, PathToUriError> {
    url::Url::from_file_path(path).map_err(|()| PathToUriError {
        path: path.to_path_buf(),
    })
}

pub fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    url::Url::parse(uri).ok().and_then(|u| u.to_file_path().ok())
}
