//! Inbound frame kinds delivered by the transport.
//!
//! A reply arrives as one [`HttpFrame::Header`], zero or more
//! [`HttpFrame::Content`] chunks and one [`HttpFrame::LastContent`].
//! Frames of one reply are contiguous and in order.
//!
//! # Example
//!
//! ```
//! use configwire_client::protocol::{HttpFrame, ReplyHeader};
//! use bytes::Bytes;
//!
//! let header = HttpFrame::Header(ReplyHeader::new(200, "OK"));
//! let body = HttpFrame::Content(Bytes::from_static(b"{}"));
//! let last = HttpFrame::last();
//!
//! assert!(header.is_header());
//! assert_eq!(body.content(), Some(&b"{}"[..]));
//! assert!(last.is_last());
//! ```

use bytes::Bytes;

/// Status line and headers of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyHeader {
    /// Transport status code (e.g. 200, 404).
    pub status_code: u16,
    /// Reason phrase from the status line (may be empty).
    pub reason_phrase: String,
    /// Header fields as (name, value) pairs, in arrival order.
    pub headers: Vec<(String, String)>,
}

impl ReplyHeader {
    /// Create a header with no header fields.
    pub fn new(status_code: u16, reason_phrase: impl Into<String>) -> Self {
        Self {
            status_code,
            reason_phrase: reason_phrase.into(),
            headers: Vec::new(),
        }
    }

    /// Add a header field.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Get the first header value matching `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// One discrete unit of inbound transport data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpFrame {
    /// Start of a reply.
    Header(ReplyHeader),
    /// A body chunk (any size, including empty).
    Content(Bytes),
    /// End of a reply, carrying trailing body bytes (usually empty).
    LastContent(Bytes),
}

impl HttpFrame {
    /// Terminal frame with no trailing bytes.
    #[inline]
    pub fn last() -> Self {
        HttpFrame::LastContent(Bytes::new())
    }

    /// Check if this is a header frame.
    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, HttpFrame::Header(_))
    }

    /// Check if this is the terminal frame.
    #[inline]
    pub fn is_last(&self) -> bool {
        matches!(self, HttpFrame::LastContent(_))
    }

    /// Body bytes carried by this frame, if it carries any.
    #[inline]
    pub fn content(&self) -> Option<&[u8]> {
        match self {
            HttpFrame::Header(_) => None,
            HttpFrame::Content(bytes) | HttpFrame::LastContent(bytes) => Some(bytes),
        }
    }

    /// Short name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            HttpFrame::Header(_) => "header",
            HttpFrame::Content(_) => "content",
            HttpFrame::LastContent(_) => "last_content",
        }
    }
}
