//! Typed responses produced by the config handler.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::{ConfigRequest, RequestKind};
use crate::error::Result;
use crate::handler::ConfigStream;
use crate::protocol::ResponseStatus;

/// Reply to a bucket config fetch.
#[derive(Debug, Clone)]
pub struct BucketConfigResponse {
    /// Config document, or the failure reason.
    pub body: String,
    pub status: ResponseStatus,
}

impl BucketConfigResponse {
    pub fn new(body: String, status: ResponseStatus) -> Self {
        Self { body, status }
    }

    /// Deserialize the config document.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Reply to a design document fetch.
#[derive(Debug, Clone)]
pub struct GetDesignDocumentsResponse {
    /// Design documents JSON, or the failure reason.
    pub body: String,
    pub status: ResponseStatus,
    /// The request this reply answers.
    pub request: Arc<ConfigRequest>,
}

impl GetDesignDocumentsResponse {
    pub fn new(body: String, status: ResponseStatus, request: Arc<ConfigRequest>) -> Self {
        Self {
            body,
            status,
            request,
        }
    }

    /// Deserialize the design documents.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Reply to a flush.
#[derive(Debug, Clone)]
pub struct FlushResponse {
    /// `false` only for 201, which means the flush was accepted but is still running.
    pub done: bool,
    pub body: String,
    pub status: ResponseStatus,
}

impl FlushResponse {
    pub fn new(done: bool, body: String, status: ResponseStatus) -> Self {
        Self { done, body, status }
    }
}

/// Reply to a bucket streaming subscribe, produced as soon as the header arrives.
#[derive(Debug, Clone)]
pub struct BucketStreamingResponse {
    /// Subscribable handle; inactive unless `status` is success.
    pub stream: ConfigStream,
    /// Host the stream is served from.
    pub host: String,
    pub status: ResponseStatus,
    /// The request this reply answers.
    pub request: Arc<ConfigRequest>,
}

impl BucketStreamingResponse {
    pub fn new(
        stream: ConfigStream,
        host: String,
        status: ResponseStatus,
        request: Arc<ConfigRequest>,
    ) -> Self {
        Self {
            stream,
            host,
            status,
            request,
        }
    }
}

/// Any typed config response.
#[derive(Debug, Clone)]
pub enum ConfigResponse {
    BucketConfig(BucketConfigResponse),
    GetDesignDocuments(GetDesignDocumentsResponse),
    Flush(FlushResponse),
    BucketStreaming(BucketStreamingResponse),
}

impl ConfigResponse {
    /// Domain status of the reply.
    pub fn status(&self) -> ResponseStatus {
        match self {
            ConfigResponse::BucketConfig(r) => r.status,
            ConfigResponse::GetDesignDocuments(r) => r.status,
            ConfigResponse::Flush(r) => r.status,
            ConfigResponse::BucketStreaming(r) => r.status,
        }
    }

    /// Kind of request this response answers.
    pub fn kind(&self) -> RequestKind {
        match self {
            ConfigResponse::BucketConfig(_) => RequestKind::BucketConfig,
            ConfigResponse::GetDesignDocuments(_) => RequestKind::GetDesignDocuments,
            ConfigResponse::Flush(_) => RequestKind::Flush,
            ConfigResponse::BucketStreaming(_) => RequestKind::BucketStreaming,
        }
    }

    /// Body text, for the kinds that carry one.
    pub fn body(&self) -> Option<&str> {
        match self {
            ConfigResponse::BucketConfig(r) => Some(&r.body),
            ConfigResponse::GetDesignDocuments(r) => Some(&r.body),
            ConfigResponse::Flush(r) => Some(&r.body),
            ConfigResponse::BucketStreaming(_) => None,
        }
    }
}
