//! Error types for configwire-client.

use thiserror::Error;

/// Main error type for all configwire operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error on the underlying connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (configuration and response bodies).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A request was built from a discriminant that names no known request kind.
    #[error("Unknown config request kind: {0}")]
    UnknownRequestKind(String),

    /// Protocol error (unexpected frame sequence, malformed reply, limits exceeded).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Connection closed before the response was produced.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type alias using ConfigError.
pub type Result<T> = std::result::Result<T, ConfigError>;
