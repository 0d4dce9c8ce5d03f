//! Handler module - the stateful side of the config protocol.
//!
//! Provides:
//! - [`ConfigHandler`] - encodes requests, decodes reply frames into responses
//! - [`RequestCorrelator`] - matches replies to outstanding requests
//! - [`ResponseAssembler`] - accumulates one reply's body
//! - [`StreamPublisher`] / [`ConfigStream`] - push side and subscribe side of
//!   a streaming config feed

mod assembler;
mod config_handler;
mod correlator;
mod publisher;

pub use assembler::{AssembledReply, ResponseAssembler};
pub use config_handler::ConfigHandler;
pub use correlator::RequestCorrelator;
pub use publisher::{ConfigStream, StreamPublisher, Subscription};
