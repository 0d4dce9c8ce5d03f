//! Per-connection handler configuration.
//!
//! # Example
//!
//! ```
//! use configwire_client::HandlerConfig;
//!
//! let config = HandlerConfig::from_json_str(r#"{"stream_capacity": 8}"#).unwrap();
//! assert_eq!(config.stream_capacity, 8);
//! assert_eq!(config.max_body_size, configwire_client::config::DEFAULT_MAX_BODY_SIZE);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default broadcast slots per stream subscriber.
pub const DEFAULT_STREAM_CAPACITY: usize = 64;

/// Default maximum HTTP header block size (64 KB).
pub const DEFAULT_MAX_HEADER_SIZE: usize = 64 * 1024;

/// Default maximum accumulated body size for non-streaming replies (64 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024 * 1024;

/// Default socket read buffer size (64 KB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Default capacity of the endpoint's outbound request queue.
pub const DEFAULT_COMMAND_CAPACITY: usize = 256;

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("configwire-client/", env!("CARGO_PKG_VERSION"));

/// Configuration for one connection's config handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Documents buffered per subscriber before a slow subscriber starts skipping.
    pub stream_capacity: usize,
    /// Maximum accepted header block size.
    pub max_header_size: usize,
    /// Maximum body accumulated for a non-streaming reply.
    pub max_body_size: usize,
    /// Socket read buffer size used by the endpoint.
    pub read_buffer_size: usize,
    /// Outbound request queue capacity used by the endpoint.
    pub command_capacity: usize,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl HandlerConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the per-subscriber stream capacity.
    pub fn stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity;
        self
    }

    /// Set the maximum header block size.
    pub fn max_header_size(mut self, limit: usize) -> Self {
        self.max_header_size = limit;
        self
    }

    /// Set the maximum non-streaming body size.
    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Set the endpoint's socket read buffer size.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set how many requests the endpoint queues before `send` waits.
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    /// Set the `User-Agent` header value.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            stream_capacity: DEFAULT_STREAM_CAPACITY,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HandlerConfig::default();
        assert_eq!(config.stream_capacity, DEFAULT_STREAM_CAPACITY);
        assert_eq!(config.max_header_size, 64 * 1024);
        assert_eq!(config.max_body_size, 64 * 1024 * 1024);
        assert!(config.user_agent.starts_with("configwire-client/"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = HandlerConfig::from_json_str(r#"{"max_body_size": 1024}"#).unwrap();
        assert_eq!(config.max_body_size, 1024);
        assert_eq!(config.stream_capacity, DEFAULT_STREAM_CAPACITY);
        assert_eq!(config.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
    }

    #[test]
    fn test_invalid_json() {
        let result = HandlerConfig::from_json_str("{not json");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("JSON error"));
    }

    #[test]
    fn test_builder_methods() {
        let config = HandlerConfig::default()
            .stream_capacity(4)
            .max_header_size(512)
            .max_body_size(2048)
            .read_buffer_size(1024)
            .command_capacity(8)
            .user_agent("test-agent");

        assert_eq!(config.stream_capacity, 4);
        assert_eq!(config.max_header_size, 512);
        assert_eq!(config.max_body_size, 2048);
        assert_eq!(config.read_buffer_size, 1024);
        assert_eq!(config.command_capacity, 8);
        assert_eq!(config.user_agent, "test-agent");
    }
}
