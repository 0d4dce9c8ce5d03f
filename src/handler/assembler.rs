//! Reply assembly: the current header plus the accumulating body.
//!
//! The body buffer is reused across replies. A new header clears it (length 0,
//! capacity kept) instead of allocating a fresh one.

use bytes::BytesMut;

use crate::protocol::ReplyHeader;

/// Initial body buffer capacity.
const INITIAL_BODY_CAPACITY: usize = 4 * 1024;

/// A finalized reply body and the header it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledReply {
    /// Header of the finished reply.
    pub header: ReplyHeader,
    /// Body text, or the reason phrase if the body was empty.
    pub body: String,
}

/// Accumulates one reply at a time.
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    header: Option<ReplyHeader>,
    body: Option<BytesMut>,
}

impl ResponseAssembler {
    /// Create an assembler with no reply in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new reply, discarding any partially built body.
    pub fn on_header(&mut self, header: ReplyHeader) {
        self.header = Some(header);
        match self.body.as_mut() {
            Some(body) => body.clear(),
            None => self.body = Some(BytesMut::with_capacity(INITIAL_BODY_CAPACITY)),
        }
    }

    /// Append a body chunk of any size.
    ///
    /// Returns `false` if no reply is in progress and the chunk was not stored.
    pub fn on_body_chunk(&mut self, chunk: &[u8]) -> bool {
        match (self.header.is_some(), self.body.as_mut()) {
            (true, Some(body)) => {
                body.extend_from_slice(chunk);
                true
            }
            _ => false,
        }
    }

    /// Finish the current reply.
    ///
    /// The body text is the buffered bytes decoded as UTF-8 when any were
    /// received, and the header's reason phrase otherwise. Returns `None`
    /// if no reply is in progress.
    pub fn on_terminal(&mut self) -> Option<AssembledReply> {
        let header = self.header.take()?;
        let body = match self.body.as_mut() {
            Some(buffer) if !buffer.is_empty() => {
                let text = String::from_utf8_lossy(&buffer[..]).into_owned();
                buffer.clear();
                text
            }
            _ => header.reason_phrase.clone(),
        };
        Some(AssembledReply { header, body })
    }

    /// Header of the reply in progress.
    pub fn header(&self) -> Option<&ReplyHeader> {
        self.header.as_ref()
    }

    /// Check if a reply is in progress.
    pub fn is_open(&self) -> bool {
        self.header.is_some()
    }

    /// Number of buffered body bytes.
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, |body| body.len())
    }

    /// Mutable access to the body buffer, for in-place record splitting.
    pub fn body_mut(&mut self) -> Option<&mut BytesMut> {
        self.body.as_mut()
    }

    /// Drop the reply in progress, keeping the buffer allocation.
    pub fn reset(&mut self) {
        self.header = None;
        if let Some(body) = self.body.as_mut() {
            body.clear();
        }
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.body.as_ref().map_or(0, |body| body.capacity())
    }
}
