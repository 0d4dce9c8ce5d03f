//! Message module - typed config requests and responses.
//!
//! Provides:
//! - [`ConfigRequest`] / [`RequestKind`] - what can be sent
//! - [`ConfigResponse`] and the four typed responses - what comes back

mod request;
mod response;

pub use request::{ConfigRequest, RequestKind};
pub use response::{
    BucketConfigResponse, BucketStreamingResponse, ConfigResponse, FlushResponse,
    GetDesignDocumentsResponse,
};
