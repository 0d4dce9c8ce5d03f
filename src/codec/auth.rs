//! HTTP Basic credentials.
//!
//! # Example
//!
//! ```
//! use configwire_client::codec::basic_auth_value;
//!
//! assert_eq!(basic_auth_value("default", ""), "Basic ZGVmYXVsdDo=");
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Build an `Authorization` header value: `Basic base64(user:password)`.
pub fn basic_auth_value(user: &str, password: &str) -> String {
    let mut raw = String::with_capacity(user.len() + password.len() + 1);
    raw.push_str(user);
    raw.push(':');
    raw.push_str(password);
    format!("Basic {}", STANDARD.encode(raw.as_bytes()))
}
