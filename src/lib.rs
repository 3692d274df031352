//! Async LSP client transport.
//!
//! The crate is layered bottom-up:
//!
//! - [`codec`] — `Content-Length` framing over any async byte stream.
//! - [`dispatcher`] — JSON-RPC 2.0 correlation: one reader task, one
//!   writer task, futures resolved by request id.
//! - [`session`] — the LSP handshake, capability snapshot, document
//!   tracking, and the typed request/notification surface.
//! - [`process`] — spawning a language server with piped stdio.
//!
//! A typical consumer spawns a [`Session`] from a [`ServerConfig`], opens
//! documents against it, and receives server pushes (diagnostics, log
//! messages, progress) through a single decoded notification callback.

pub mod codec;
pub mod dispatcher;
mod error;
pub mod process;
pub mod protocol;
pub mod session;
pub mod types;

pub use dispatcher::Dispatcher;
pub use error::Error;
pub use process::{ServerIo, ServerProcess};
pub use protocol::{ServerCapabilities, SyncKind};
pub use session::{Session, SessionOptions};
pub use types::{
    Diagnostic, DiagnosticSeverity, DiagnosticTag, MessageType, PublishDiagnosticsParams,
    ServerConfig, ServerNotification,
};
