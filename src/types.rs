//! Public types consumed by applications embedding the client.
//!
//! The editor constructs a [`ServerConfig`], receives decoded
//! [`ServerNotification`]s through the session's handler, and reads typed
//! diagnostics out of [`PublishDiagnosticsParams`].

use serde::Deserialize;
use serde_json::Value;

/// Launch configuration for a language server executable.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Executable command (e.g. "pyrefly").
    pub command: String,
    /// Arguments to pass to the command (e.g. `["lsp"]`).
    #[serde(default)]
    pub args: Vec<String>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl DiagnosticSeverity {
    /// Convert from LSP numeric severity (1=Error, 2=Warning, 3=Info, 4=Hint).
    ///
    /// Returns `None` for values outside the LSP-defined range; callers
    /// decide the fallback policy.
    #[must_use]
    pub fn from_lsp(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Error),
            2 => Some(Self::Warning),
            3 => Some(Self::Information),
            4 => Some(Self::Hint),
            _ => None,
        }
    }
}

/// Diagnostic tags attached by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticTag {
    /// Unused or unnecessary code; clients typically fade it.
    Unnecessary,
    /// Deprecated or obsolete code; clients typically strike it through.
    Deprecated,
}

impl DiagnosticTag {
    #[must_use]
    pub fn from_lsp(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Unnecessary),
            2 => Some(Self::Deprecated),
            _ => None,
        }
    }
}

/// The `type` of a `window/showMessage` or `window/logMessage` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Error,
    Warning,
    Info,
    Log,
    Debug,
}

impl MessageType {
    #[must_use]
    pub fn from_lsp(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Error),
            2 => Some(Self::Warning),
            3 => Some(Self::Info),
            4 => Some(Self::Log),
            5 => Some(Self::Debug),
            _ => None,
        }
    }
}

/// Zero-indexed position in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// A single diagnostic from the server.
#[derive(Debug, Clone, Deserialize)]
pub struct Diagnostic {
    pub range: Range,
    #[serde(default)]
    severity: Option<u64>,
    #[serde(default)]
    pub source: Option<String>,
    pub message: String,
    #[serde(default)]
    tags: Vec<u64>,
}

impl Diagnostic {
    /// Severity, if the server sent one in the LSP-defined range.
    #[must_use]
    pub fn severity(&self) -> Option<DiagnosticSeverity> {
        self.severity.and_then(DiagnosticSeverity::from_lsp)
    }

    /// Recognized tags; unknown tag values are dropped.
    #[must_use]
    pub fn tags(&self) -> Vec<DiagnosticTag> {
        self.tags
            .iter()
            .filter_map(|&t| DiagnosticTag::from_lsp(t))
            .collect()
    }
}

/// Params of a `textDocument/publishDiagnostics` notification.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishDiagnosticsParams {
    pub uri: String,
    #[serde(default)]
    pub version: Option<i64>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A server-initiated notification, decoded once at the consumer boundary.
///
/// The variants cover the methods the client expects from a language
/// server; anything else (or anything with params that don't match the
/// method's shape) lands in [`ServerNotification::Unknown`] with the raw
/// payload intact.
#[derive(Debug)]
pub enum ServerNotification {
    /// `$/cancelRequest`
    CancelRequest { id: Value },
    /// `$/logTrace`
    LogTrace {
        message: String,
        verbose: Option<String>,
    },
    /// `textDocument/publishDiagnostics`
    PublishDiagnostics(PublishDiagnosticsParams),
    /// `$/progress`
    Progress { token: Value, value: Value },
    /// `telemetry/event`
    TelemetryEvent(Value),
    /// `window/showMessage`
    ShowMessage { kind: MessageType, message: String },
    /// `window/logMessage`
    LogMessage { kind: MessageType, message: String },
    /// Any method this client does not model.
    Unknown {
        method: String,
        params: Option<Value>,
    },
}

impl ServerNotification {
    /// Decode a raw `(method, params)` pair from the wire.
    #[must_use]
    pub fn decode(method: &str, params: Option<Value>) -> Self {
        let unknown = |params: Option<Value>| Self::Unknown {
            method: method.to_string(),
            params,
        };

        match method {
            "$/cancelRequest" => match params {
                Some(p) => match p.get("id") {
                    Some(id) => Self::CancelRequest { id: id.clone() },
                    None => unknown(Some(p)),
                },
                None => unknown(None),
            },
            "$/logTrace" => match params {
                Some(p) => match p.get("message").and_then(Value::as_str) {
                    Some(message) => Self::LogTrace {
                        message: message.to_string(),
                        verbose: p
                            .get("verbose")
                            .and_then(Value::as_str)
                            .map(String::from),
                    },
                    None => unknown(Some(p)),
                },
                None => unknown(None),
            },
            "textDocument/publishDiagnostics" => match params {
                Some(p) => match serde_json::from_value(p.clone()) {
                    Ok(decoded) => Self::PublishDiagnostics(decoded),
                    Err(e) => {
                        tracing::debug!("undecodable publishDiagnostics params: {e}");
                        unknown(Some(p))
                    }
                },
                None => unknown(None),
            },
            "$/progress" => match params {
                Some(p) => match (p.get("token"), p.get("value")) {
                    (Some(token), Some(value)) => Self::Progress {
                        token: token.clone(),
                        value: value.clone(),
                    },
                    _ => unknown(Some(p)),
                },
                None => unknown(None),
            },
            "telemetry/event" => Self::TelemetryEvent(params.unwrap_or(Value::Null)),
            "window/showMessage" | "window/logMessage" => match params {
                Some(p) => {
                    let kind = p
                        .get("type")
                        .and_then(Value::as_u64)
                        .and_then(MessageType::from_lsp);
                    let message = p.get("message").and_then(Value::as_str);
                    match (kind, message) {
                        (Some(kind), Some(message)) if method == "window/showMessage" => {
                            Self::ShowMessage {
                                kind,
                                message: message.to_string(),
                            }
                        }
                        (Some(kind), Some(message)) => Self::LogMessage {
                            kind,
                            message: message.to_string(),
                        },
                        _ => unknown(Some(p)),
                    }
                }
                None => unknown(None),
            },
            _ => unknown(params),
        }
    }
}
