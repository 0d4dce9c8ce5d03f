//! Frame buffer for turning raw HTTP/1.1 reply bytes into [`HttpFrame`]s.
//!
//! Uses `bytes::BytesMut` for buffer management.
//! Implements a state machine for handling fragmented replies:
//! - `WaitingForHeader`: Need a complete status line + header block
//! - `FixedBody`: `Content-Length` framing, N more body bytes expected
//! - `ChunkSize` / `ChunkData` / `ChunkDataEnd` / `ChunkTrailer`: chunked framing
//! - `EmitLast`: Body complete, terminal frame pending
//!
//! Body bytes are emitted as soon as they arrive rather than once the reply
//! is complete, which is what keeps a streaming config reply live.
//!
//! # Example
//!
//! ```
//! use configwire_client::protocol::{HttpFrame, ResponseFrameBuffer};
//!
//! let mut buffer = ResponseFrameBuffer::new();
//!
//! let frames = buffer
//!     .push(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}")
//!     .unwrap();
//!
//! assert_eq!(frames.len(), 3);
//! assert!(frames[0].is_header());
//! assert_eq!(frames[1].content(), Some(&b"{}"[..]));
//! assert!(frames[2].is_last());
//! ```

use bytes::{Buf, BytesMut};

use super::frame::{HttpFrame, ReplyHeader};
use crate::config::DEFAULT_MAX_HEADER_SIZE;
use crate::error::{ConfigError, Result};

/// State machine for reply parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for the complete header block (terminated by `\r\n\r\n`).
    WaitingForHeader,
    /// Content-Length body, `remaining` bytes still expected.
    FixedBody { remaining: usize },
    /// Waiting for a chunk size line.
    ChunkSize,
    /// Inside a chunk, `remaining` data bytes still expected.
    ChunkData { remaining: usize },
    /// Chunk data consumed, waiting for its trailing `\r\n`.
    ChunkDataEnd,
    /// Zero-size chunk seen, consuming trailer lines up to the empty line.
    ChunkTrailer,
    /// Body complete, the terminal frame is next.
    EmitLast,
}

/// How the body of a reply is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFraming {
    Length(usize),
    Chunked,
    Empty,
}

/// Buffer for accumulating reply bytes and extracting complete frames.
///
/// All data is stored in a single `BytesMut` buffer to minimize allocations.
pub struct ResponseFrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum allowed header block (and chunk size line) length.
    max_header_size: usize,
}

impl ResponseFrameBuffer {
    /// Create a new frame buffer with default settings.
    ///
    /// Default capacity: 64KB, max header block: 64KB.
    pub fn new() -> Self {
        Self::with_max_header_size(DEFAULT_MAX_HEADER_SIZE)
    }

    /// Create a new frame buffer with a custom header size limit.
    pub fn with_max_header_size(max_header_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            state: State::WaitingForHeader,
            max_header_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Returns the frames that became available (may be empty if still
    /// waiting for data). Partial data is kept for the next push.
    ///
    /// # Errors
    ///
    /// Returns a protocol error for a malformed status line or chunk size,
    /// or a header block exceeding the configured maximum.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<HttpFrame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }

        Ok(frames)
    }

    fn try_extract_one(&mut self) -> Result<Option<HttpFrame>> {
        loop {
            match self.state {
                State::WaitingForHeader => {
                    let Some(end) = find(&self.buffer, b"\r\n\r\n") else {
                        self.check_line_limit("Header block")?;
                        return Ok(None);
                    };
                    if end > self.max_header_size {
                        return Err(ConfigError::Protocol(format!(
                            "Header block of {} bytes exceeds maximum {}",
                            end, self.max_header_size
                        )));
                    }

                    let block = self.buffer.split_to(end + 4);
                    let (header, framing) = parse_header_block(&block[..end])?;

                    self.state = match framing {
                        BodyFraming::Length(0) | BodyFraming::Empty => State::EmitLast,
                        BodyFraming::Length(remaining) => State::FixedBody { remaining },
                        BodyFraming::Chunked => State::ChunkSize,
                    };
                    return Ok(Some(HttpFrame::Header(header)));
                }

                State::FixedBody { remaining } => {
                    let Some((chunk, left)) = self.take_body(remaining) else {
                        return Ok(None);
                    };
                    self.state = if left == 0 {
                        State::EmitLast
                    } else {
                        State::FixedBody { remaining: left }
                    };
                    return Ok(Some(chunk));
                }

                State::ChunkSize => {
                    let Some(line_end) = find(&self.buffer, b"\r\n") else {
                        self.check_line_limit("Chunk size line")?;
                        return Ok(None);
                    };
                    let line = self.buffer.split_to(line_end);
                    self.buffer.advance(2);

                    let size = parse_chunk_size(&line)?;
                    self.state = if size == 0 {
                        State::ChunkTrailer
                    } else {
                        State::ChunkData { remaining: size }
                    };
                }

                State::ChunkData { remaining } => {
                    let Some((chunk, left)) = self.take_body(remaining) else {
                        return Ok(None);
                    };
                    self.state = if left == 0 {
                        State::ChunkDataEnd
                    } else {
                        State::ChunkData { remaining: left }
                    };
                    return Ok(Some(chunk));
                }

                State::ChunkDataEnd => {
                    if self.buffer.len() < 2 {
                        return Ok(None);
                    }
                    if &self.buffer[..2] != b"\r\n" {
                        return Err(ConfigError::Protocol(
                            "Chunk data not terminated by CRLF".to_string(),
                        ));
                    }
                    self.buffer.advance(2);
                    self.state = State::ChunkSize;
                }

                State::ChunkTrailer => {
                    let Some(line_end) = find(&self.buffer, b"\r\n") else {
                        self.check_line_limit("Trailer line")?;
                        return Ok(None);
                    };
                    // Trailer fields are consumed and ignored.
                    self.buffer.advance(line_end + 2);
                    if line_end == 0 {
                        self.state = State::EmitLast;
                    }
                }

                State::EmitLast => {
                    self.state = State::WaitingForHeader;
                    return Ok(Some(HttpFrame::last()));
                }
            }
        }
    }

    /// Split up to `remaining` buffered body bytes into a content frame.
    fn take_body(&mut self, remaining: usize) -> Option<(HttpFrame, usize)> {
        if self.buffer.is_empty() {
            return None;
        }
        let take = remaining.min(self.buffer.len());
        let chunk = self.buffer.split_to(take).freeze();
        Some((HttpFrame::Content(chunk), remaining - take))
    }

    fn check_line_limit(&self, what: &str) -> Result<()> {
        if self.buffer.len() > self.max_header_size {
            return Err(ConfigError::Protocol(format!(
                "{} exceeds maximum {} bytes",
                what, self.max_header_size
            )));
        }
        Ok(())
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if the buffer sits between replies (no reply partially parsed).
    pub fn is_idle(&self) -> bool {
        self.state == State::WaitingForHeader && self.buffer.is_empty()
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForHeader;
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match self.state {
            State::WaitingForHeader => "WaitingForHeader",
            State::FixedBody { .. } => "FixedBody",
            State::ChunkSize => "ChunkSize",
            State::ChunkData { .. } => "ChunkData",
            State::ChunkDataEnd => "ChunkDataEnd",
            State::ChunkTrailer => "ChunkTrailer",
            State::EmitLast => "EmitLast",
        }
    }
}

impl Default for ResponseFrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn find(data: &[u8], needle: &[u8]) -> Option<usize> {
    data.windows(needle.len()).position(|window| window == needle)
}

/// Parse the status line and header fields (everything before `\r\n\r\n`).
fn parse_header_block(block: &[u8]) -> Result<(ReplyHeader, BodyFraming)> {
    let text = std::str::from_utf8(block)
        .map_err(|_| ConfigError::Protocol("Header block is not valid UTF-8".to_string()))?;
    let mut lines = text.split("\r\n");

    // Status line: HTTP/1.1 200 OK
    let status_line = lines.next().unwrap_or_default();
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(ConfigError::Protocol(format!(
            "Invalid status line: {:?}",
            status_line
        )));
    }
    let status_code: u16 = parts
        .next()
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| ConfigError::Protocol(format!("Invalid status line: {:?}", status_line)))?;
    let reason_phrase = parts.next().unwrap_or_default().trim();

    let mut header = ReplyHeader::new(status_code, reason_phrase);
    let mut framing = BodyFraming::Empty;

    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();

        if name.eq_ignore_ascii_case("transfer-encoding")
            && value
                .rsplit(',')
                .next()
                .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
        {
            framing = BodyFraming::Chunked;
        } else if name.eq_ignore_ascii_case("content-length") && framing != BodyFraming::Chunked {
            let length = value.parse().map_err(|_| {
                ConfigError::Protocol(format!("Invalid Content-Length: {:?}", value))
            })?;
            framing = BodyFraming::Length(length);
        }

        header.headers.push((name.to_string(), value.to_string()));
    }

    Ok((header, framing))
}

fn parse_chunk_size(line: &[u8]) -> Result<usize> {
    let text = std::str::from_utf8(line)
        .map_err(|_| ConfigError::Protocol("Chunk size line is not valid UTF-8".to_string()))?;
    // Strip chunk extensions (;key=value).
    let size_hex = text.split(';').next().unwrap_or_default().trim();
    usize::from_str_radix(size_hex, 16)
        .map_err(|_| ConfigError::Protocol(format!("Invalid chunk size: {:?}", size_hex)))
}
