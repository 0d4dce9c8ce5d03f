//! Outbound request encoding.
//!
//! Each [`ConfigRequest`] becomes exactly one HTTP/1.1 request with no body.
//! The method follows the request kind (`POST` for flush, `GET` otherwise),
//! the path comes from the request, and every request carries the bucket's
//! Basic credentials.
//!
//! # Example
//!
//! ```
//! use configwire_client::codec::{encode_request, Method};
//! use configwire_client::message::ConfigRequest;
//!
//! let request = ConfigRequest::flush("beer-sample", "pw");
//! let http = encode_request(&request, "10.0.0.1:8091", "agent/1.0");
//!
//! assert_eq!(http.method, Method::Post);
//! assert!(http.header("authorization").unwrap().starts_with("Basic "));
//! let line: &[u8] = b"POST /pools/default/buckets/beer-sample/controller/doFlush HTTP/1.1\r\n";
//! assert!(http.encode().starts_with(line));
//! ```

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use super::auth::basic_auth_value;
use crate::message::ConfigRequest;

/// HTTP methods used by config requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An encoded request ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    /// Header fields as (name, value) pairs, in send order.
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Get the first header value matching `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serialize to HTTP/1.1 wire bytes.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(256);
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Serialize into an existing buffer.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_slice(self.method.as_str().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.path.as_bytes());
        buf.put_slice(b" HTTP/1.1\r\n");

        for (name, value) in &self.headers {
            buf.put_slice(name.as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(b"\r\n");
    }
}

/// Encode a config request for the server at `host`.
pub fn encode_request(request: &ConfigRequest, host: &str, user_agent: &str) -> HttpRequest {
    let method = request.kind().method();

    let mut headers = vec![
        ("Host".to_string(), host.to_string()),
        ("User-Agent".to_string(), user_agent.to_string()),
        (
            "Authorization".to_string(),
            basic_auth_value(request.bucket(), request.password()),
        ),
    ];
    if method == Method::Post {
        headers.push(("Content-Length".to_string(), "0".to_string()));
    }

    HttpRequest {
        method,
        path: request.path().to_string(),
        headers,
    }
}
