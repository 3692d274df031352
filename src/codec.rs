//! JSON-RPC framing codec for LSP communication.
//!
//! LSP uses `Content-Length: N\r\n\r\n{json}` framing over stdin/stdout.
//! This module provides [`FrameReader`] and [`FrameWriter`] for async
//! reading and writing of framed JSON-RPC messages.
//!
//! Reading distinguishes recoverable per-message damage from end of stream:
//! a frame with a bad header or an undecodable body yields
//! [`FrameEvent::Malformed`] and leaves the reader usable for the next
//! frame, so one broken message from the server never kills the connection.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::protocol;

/// Maximum frame size (4 MiB) to prevent unbounded memory allocation.
const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Outcome of one [`FrameReader::read_frame`] call.
#[derive(Debug)]
pub enum FrameEvent {
    /// A well-formed frame.
    Message(serde_json::Value),
    /// A recoverable defect; the reader is still positioned on a frame
    /// boundary and the caller should report the defect and keep reading.
    Malformed(FrameDefect),
    /// The peer closed its stream.
    Eof,
}

/// A per-message framing defect, carrying the JSON-RPC error to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDefect {
    code: i64,
    message: String,
}

impl FrameDefect {
    fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: protocol::INVALID_REQUEST,
            message: message.into(),
        }
    }

    fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: protocol::PARSE_ERROR,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> i64 {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Reads JSON-RPC frames from an async reader.
///
/// Parses `Content-Length` headers and reads exactly that many bytes,
/// then deserializes the body as JSON.
pub struct FrameReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next frame.
    ///
    /// `Err` is reserved for I/O failures on the underlying stream; framing
    /// and body problems come back as [`FrameEvent::Malformed`].
    pub async fn read_frame(&mut self) -> std::io::Result<FrameEvent> {
        let mut content_length: Option<usize> = None;
        let mut content_type_ok = true;
        let mut line = String::new();
        let mut saw_any_header_bytes = false;

        loop {
            line.clear();
            let bytes_read = self.reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                if saw_any_header_bytes {
                    tracing::debug!("peer closed the stream mid-headers");
                }
                return Ok(FrameEvent::Eof);
            }
            saw_any_header_bytes = true;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                // Empty line = end of headers
                break;
            }

            // Headers are `Name: value`, split on the first colon.
            // Parse names case-insensitively for robustness.
            if let Some(colon_pos) = trimmed.find(':') {
                let name = &trimmed[..colon_pos];
                let value = trimmed[colon_pos + 1..].trim();
                if name.eq_ignore_ascii_case("Content-Length") {
                    content_length = value.parse().ok();
                } else if name.eq_ignore_ascii_case("Content-Type") && !value.contains("utf-8") {
                    content_type_ok = false;
                }
            }
        }

        // Without a length there is no body to skip; the next read_line
        // picks up at whatever the peer sends next.
        let Some(content_length) = content_length else {
            return Ok(FrameEvent::Malformed(FrameDefect::invalid_request(
                "missing Content-Length header",
            )));
        };

        if content_length > MAX_FRAME_BYTES {
            self.discard_body(content_length).await?;
            return Ok(FrameEvent::Malformed(FrameDefect::invalid_request(
                format!("Content-Length {content_length} exceeds maximum {MAX_FRAME_BYTES}"),
            )));
        }

        if !content_type_ok {
            self.discard_body(content_length).await?;
            return Ok(FrameEvent::Malformed(FrameDefect::invalid_request(
                "unexpected Content-Type header",
            )));
        }

        let mut body = vec![0u8; content_length];
        if let Err(e) = self.reader.read_exact(&mut body).await {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                // The peer is gone either way; report it as end of stream.
                return Ok(FrameEvent::Eof);
            }
            return Err(e);
        }

        match serde_json::from_slice(&body) {
            Ok(value) => Ok(FrameEvent::Message(value)),
            Err(e) => Ok(FrameEvent::Malformed(FrameDefect::parse_error(format!(
                "could not deserialize JSON: {e}"
            )))),
        }
    }

    /// Consume and drop a rejected frame's body so the reader stays framed.
    async fn discard_body(&mut self, mut remaining: usize) -> std::io::Result<()> {
        let mut chunk = [0u8; 8192];
        while remaining > 0 {
            let want = remaining.min(chunk.len());
            let n = self.reader.read(&mut chunk[..want]).await?;
            if n == 0 {
                // EOF; the next read_frame call reports it.
                return Ok(());
            }
            remaining -= n;
        }
        Ok(())
    }
}

/// Writes JSON-RPC frames to an async writer.
///
/// Serializes JSON and prepends the `Content-Length` header. No
/// `Content-Type` header is emitted; `Content-Length` alone is the minimal
/// LSP framing.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Write a JSON-RPC frame with `Content-Length` header.
    pub async fn write_frame(&mut self, msg: &serde_json::Value) -> std::io::Result<()> {
        let body = msg.to_string();
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(body.as_bytes()).await?;
        self.writer.flush().await?;

        Ok(())
    }
}
