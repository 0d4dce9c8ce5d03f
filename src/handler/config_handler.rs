//! The per-connection config protocol handler.
//!
//! Encodes [`ConfigRequest`]s into [`HttpRequest`]s and decodes inbound
//! [`HttpFrame`]s back into [`ConfigResponse`]s, correlating each reply with
//! the request that caused it.
//!
//! # Reply lifecycle
//!
//! ```text
//! Header ──► Content* ──► LastContent          ordinary reply, one response at LastContent
//!
//! Header ──► Content ──► Content ──► …          bucket streaming reply, response at Header,
//!   │          └ split on "\n\n\n\n", push      then one pushed document per record
//!   └ BucketStreamingResponse                  until LastContent completes the stream
//! ```
//!
//! A header for a non-streaming request may arrive while a stream is open.
//! The stream stays open: later body chunks still resolve to the streaming
//! request and are pushed, and the terminal frame ends the newer reply. The
//! stream then ends at the next streaming header or at shutdown.
//!
//! The handler is single-threaded: it is driven by exactly one frame source
//! and never blocks.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use configwire_client::handler::ConfigHandler;
//! use configwire_client::message::{ConfigRequest, ConfigResponse};
//! use configwire_client::protocol::{HttpFrame, ReplyHeader, ResponseStatus};
//!
//! let mut handler = ConfigHandler::new("10.0.0.1");
//! let _wire = handler.encode(ConfigRequest::bucket_config("default", ""));
//!
//! let header = HttpFrame::Header(ReplyHeader::new(200, "OK"));
//! assert!(handler.decode(header).unwrap().is_none());
//! let body = HttpFrame::Content(Bytes::from_static(b"{\"nodes\":[]}"));
//! assert!(handler.decode(body).unwrap().is_none());
//!
//! match handler.decode(HttpFrame::last()).unwrap() {
//!     Some(ConfigResponse::BucketConfig(response)) => {
//!         assert_eq!(response.body, "{\"nodes\":[]}");
//!         assert_eq!(response.status, ResponseStatus::Success);
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use std::sync::Arc;

use super::assembler::ResponseAssembler;
use super::correlator::RequestCorrelator;
use super::publisher::{ConfigStream, StreamPublisher};
use crate::codec::{encode_request, HttpRequest};
use crate::config::HandlerConfig;
use crate::error::{ConfigError, Result};
use crate::message::{
    BucketConfigResponse, BucketStreamingResponse, ConfigRequest, ConfigResponse, FlushResponse,
    GetDesignDocumentsResponse, RequestKind,
};
use crate::protocol::{split_record, HttpFrame, ReplyHeader, ResponseStatus};

/// Status code meaning a flush was accepted but has not finished.
const FLUSH_PENDING_STATUS: u16 = 201;

/// State of an open streaming reply.
struct StreamState {
    /// Present only if the streaming header was a success.
    publisher: Option<StreamPublisher>,
    /// The streaming request the reply's body chunks are attributed to.
    request: Arc<ConfigRequest>,
    /// Cleared once a later non-streaming reply header arrives; the terminal
    /// frame then ends that reply instead of the stream.
    owns_reply: bool,
}

/// Encoder/decoder for one connection to the configuration service.
pub struct ConfigHandler {
    remote_host: String,
    config: HandlerConfig,
    assembler: ResponseAssembler,
    correlator: RequestCorrelator,
    stream: Option<StreamState>,
}

impl ConfigHandler {
    /// Create a handler for a connection to `remote_host` with default settings.
    pub fn new(remote_host: impl Into<String>) -> Self {
        Self::with_config(remote_host, HandlerConfig::default())
    }

    /// Create a handler with custom settings.
    pub fn with_config(remote_host: impl Into<String>, config: HandlerConfig) -> Self {
        Self {
            remote_host: remote_host.into(),
            config,
            assembler: ResponseAssembler::new(),
            correlator: RequestCorrelator::new(),
            stream: None,
        }
    }

    /// Encode a request and register it as outstanding.
    ///
    /// Requests must be written to the transport in the order they are encoded.
    pub fn encode(&mut self, request: ConfigRequest) -> HttpRequest {
        self.encode_shared(Arc::new(request))
    }

    /// Encode a shared request and register it as outstanding.
    pub fn encode_shared(&mut self, request: Arc<ConfigRequest>) -> HttpRequest {
        let http = encode_request(&request, &self.remote_host, &self.config.user_agent);
        tracing::debug!(
            method = %http.method,
            path = %http.path,
            kind = %request.kind(),
            "Encoded config request"
        );
        self.correlator.submit(request);
        http
    }

    /// Process one inbound frame.
    ///
    /// Returns a typed response when the frame completes one: the terminal
    /// frame of an ordinary reply, or the header of a bucket streaming reply.
    /// Partial replies return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a protocol error for frame sequences that cannot be attributed
    /// to an outstanding request, or a body exceeding `max_body_size`.
    pub fn decode(&mut self, frame: HttpFrame) -> Result<Option<ConfigResponse>> {
        tracing::trace!(kind = frame.kind(), "Inbound frame");

        match frame {
            HttpFrame::Header(header) => self.on_header(header),
            HttpFrame::Content(chunk) => {
                self.on_content(&chunk)?;
                Ok(None)
            }
            HttpFrame::LastContent(trailing) => {
                if !trailing.is_empty() {
                    self.on_content(&trailing)?;
                }
                self.on_last()
            }
        }
    }

    fn on_header(&mut self, header: ReplyHeader) -> Result<Option<ConfigResponse>> {
        let request = self.correlator.current().cloned().ok_or_else(|| {
            ConfigError::Protocol(format!(
                "Reply header ({} {}) with no outstanding request",
                header.status_code, header.reason_phrase
            ))
        })?;

        let status_code = header.status_code;
        self.assembler.on_header(header);

        if request.kind().is_streaming() {
            if let Some(stream) = self.stream.as_ref() {
                tracing::warn!(
                    "Streaming header for {} arrived while config stream for {} was open",
                    request.path(),
                    stream.request.path()
                );
                self.finish_stream();
            }
            return Ok(Some(self.open_stream(status_code)?));
        }

        if let Some(stream) = self.stream.as_mut() {
            if stream.publisher.is_some() {
                // Body chunks still resolve to the stream through the carry-over slot.
                tracing::debug!(
                    next = request.path(),
                    "Reply header arrived while config stream for {} is open",
                    stream.request.path()
                );
                stream.owns_reply = false;
            } else {
                self.finish_stream();
            }
        }
        Ok(None)
    }

    fn open_stream(&mut self, status_code: u16) -> Result<ConfigResponse> {
        let request = self.correlator.dequeue_for_streaming_header().ok_or_else(|| {
            ConfigError::Protocol("Streaming header with no outstanding request".to_string())
        })?;

        let status = ResponseStatus::from_code(status_code);
        let publisher = if status.is_success() {
            tracing::debug!(path = request.path(), "Config stream opened");
            let publisher = StreamPublisher::new(self.config.stream_capacity);
            // Documents sent right behind the header reach the caller's first subscription.
            publisher.park_first_subscriber();
            Some(publisher)
        } else {
            tracing::warn!(
                path = request.path(),
                status_code,
                "Config stream request was not successful"
            );
            None
        };

        let stream = publisher
            .as_ref()
            .map_or_else(ConfigStream::inactive, StreamPublisher::handle);
        self.stream = Some(StreamState {
            publisher,
            request: request.clone(),
            owns_reply: true,
        });

        Ok(ConfigResponse::BucketStreaming(BucketStreamingResponse::new(
            stream,
            self.remote_host.clone(),
            status,
            request,
        )))
    }

    fn on_content(&mut self, chunk: &[u8]) -> Result<()> {
        if !self.assembler.on_body_chunk(chunk) {
            return Err(ConfigError::Protocol(
                "Body chunk with no reply in progress".to_string(),
            ));
        }

        if let Some(stream) = self.stream.as_mut() {
            if self.correlator.carried_over().is_some() {
                if let Some(request) = self.correlator.resolve_stream_chunk() {
                    stream.request = request;
                }
            }

            if let (Some(publisher), Some(buffer)) =
                (stream.publisher.as_ref(), self.assembler.body_mut())
            {
                while let Some(document) = split_record(buffer) {
                    let len = document.len();
                    let delivered = publisher.push(document);
                    tracing::debug!(
                        path = stream.request.path(),
                        len,
                        delivered,
                        "Pushed config document"
                    );
                }
            }
        }

        if self.assembler.body_len() > self.config.max_body_size {
            return Err(ConfigError::Protocol(format!(
                "Reply body of {} bytes exceeds maximum {}",
                self.assembler.body_len(),
                self.config.max_body_size
            )));
        }

        Ok(())
    }

    fn on_last(&mut self) -> Result<Option<ConfigResponse>> {
        if self.stream.as_ref().is_some_and(|stream| stream.owns_reply) {
            self.finish_stream();
            self.assembler.reset();
            return Ok(None);
        }

        let reply = self.assembler.on_terminal().ok_or_else(|| {
            ConfigError::Protocol("Terminal frame with no reply in progress".to_string())
        })?;
        let request = self.correlator.complete_current().ok_or_else(|| {
            ConfigError::Protocol("Reply completed with no outstanding request".to_string())
        })?;

        let status_code = reply.header.status_code;
        let status = ResponseStatus::from_code(status_code);

        let response = match request.kind() {
            RequestKind::BucketConfig => {
                ConfigResponse::BucketConfig(BucketConfigResponse::new(reply.body, status))
            }
            RequestKind::GetDesignDocuments => ConfigResponse::GetDesignDocuments(
                GetDesignDocumentsResponse::new(reply.body, status, request),
            ),
            RequestKind::Flush => ConfigResponse::Flush(FlushResponse::new(
                status_code != FLUSH_PENDING_STATUS,
                reply.body,
                status,
            )),
            RequestKind::BucketStreaming => {
                return Err(ConfigError::Protocol(format!(
                    "Streaming request {} completed without a stream",
                    request.path()
                )));
            }
        };

        Ok(Some(response))
    }

    /// Complete any open stream and drop the reply in progress.
    ///
    /// Runs automatically on drop. Outstanding requests stay queued; use
    /// [`ConfigHandler::drain_pending`] to take them.
    pub fn shutdown(&mut self) {
        self.finish_stream();
        self.assembler.reset();
    }

    /// Complete the open stream, if any, and release its carry-over slot.
    fn finish_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Some(mut publisher) = stream.publisher.take() {
                publisher.complete();
                tracing::debug!(path = stream.request.path(), "Config stream completed");
            }
        }
        self.correlator.clear_carried_over();
    }

    /// Remove and return every outstanding request in submission order.
    pub fn drain_pending(&mut self) -> Vec<Arc<ConfigRequest>> {
        self.correlator.drain()
    }

    /// Check if a live config stream is open.
    pub fn is_streaming(&self) -> bool {
        self.stream
            .as_ref()
            .is_some_and(|stream| stream.publisher.is_some())
    }

    /// Request the open streaming reply is attributed to.
    pub fn stream_request(&self) -> Option<&Arc<ConfigRequest>> {
        self.stream.as_ref().map(|stream| &stream.request)
    }

    /// Number of requests awaiting a reply.
    pub fn pending(&self) -> usize {
        self.correlator.pending()
    }

    /// Remote host this handler was created for.
    pub fn remote_host(&self) -> &str {
        &self.remote_host
    }
}

impl Drop for ConfigHandler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
