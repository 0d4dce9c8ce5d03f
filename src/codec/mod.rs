//! Codec module - outbound request encoding.
//!
//! - [`encode_request`] - turns a [`ConfigRequest`](crate::message::ConfigRequest)
//!   into an [`HttpRequest`] with method, path and headers
//! - [`basic_auth_value`] - `Authorization: Basic` credential encoding

mod auth;
mod request;

pub use auth::basic_auth_value;
pub use request::{encode_request, HttpRequest, Method};
