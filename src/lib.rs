//! # configwire-client
//!
//! Client-side protocol adapter for a cluster configuration service spoken
//! over HTTP/1.1.
//!
//! Four kinds of request are supported: fetching a bucket's config,
//! subscribing to a bucket's streaming config, flushing a bucket, and
//! fetching a bucket's design documents. Replies are matched to requests in
//! the order they were sent and turned into typed responses.
//!
//! ## Architecture
//!
//! - **Handler** ([`ConfigHandler`]): synchronous encoder/decoder for one
//!   connection. Frames in, typed responses out.
//! - **Framing** ([`protocol::ResponseFrameBuffer`]): raw reply bytes to
//!   header/content/last-content frames.
//! - **Endpoint** ([`ConfigEndpoint`]): one tokio task owning a connection
//!   and its handler, with an async `send` API.
//!
//! A streaming subscribe answers with a [`ConfigStream`] as soon as the reply
//! header arrives. Every config revision the server pushes is delivered to
//! its subscribers as one document.
//!
//! ## Example
//!
//! ```ignore
//! use configwire_client::{ConfigEndpoint, ConfigRequest, HandlerConfig};
//!
//! #[tokio::main]
//! async fn main() -> configwire_client::Result<()> {
//!     let socket = tokio::net::TcpStream::connect("10.0.0.1:8091").await?;
//!     let endpoint = ConfigEndpoint::spawn(socket, "10.0.0.1:8091", HandlerConfig::default());
//!
//!     let response = endpoint
//!         .send(ConfigRequest::bucket_config("default", ""))
//!         .await?;
//!     println!("{:?}", response.body());
//!
//!     endpoint.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod handler;
pub mod message;
pub mod protocol;

pub use config::HandlerConfig;
pub use endpoint::ConfigEndpoint;
pub use error::{ConfigError, Result};
pub use handler::{ConfigHandler, ConfigStream, Subscription};
pub use message::{ConfigRequest, ConfigResponse, RequestKind};
pub use protocol::ResponseStatus;
