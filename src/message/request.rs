//! Outbound config requests.
//!
//! Every request targets a path on the configuration service and carries the
//! bucket credentials used for its `Authorization` header. Requests are
//! immutable once built and shared (`Arc`) between the correlator queue and
//! the responses that refer back to them.
//!
//! # Example
//!
//! ```
//! use configwire_client::message::{ConfigRequest, RequestKind};
//!
//! let request = ConfigRequest::bucket_streaming("travel-sample", "secret");
//! assert_eq!(request.kind(), RequestKind::BucketStreaming);
//! assert_eq!(request.path(), "/pools/default/bs/travel-sample");
//!
//! let unknown = ConfigRequest::from_kind("compact", "/x", "b", "p");
//! assert!(unknown.is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::Method;
use crate::error::ConfigError;

/// The closed set of config request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Fetch a bucket's current config.
    BucketConfig,
    /// Subscribe to the live bucket config stream.
    BucketStreaming,
    /// Flush a bucket.
    Flush,
    /// Fetch a bucket's design documents.
    GetDesignDocuments,
}

impl RequestKind {
    /// HTTP method used to send this kind of request.
    pub fn method(&self) -> Method {
        match self {
            RequestKind::BucketConfig
            | RequestKind::BucketStreaming
            | RequestKind::GetDesignDocuments => Method::Get,
            RequestKind::Flush => Method::Post,
        }
    }

    /// Standard service path for this kind of request against `bucket`.
    pub fn default_path(&self, bucket: &str) -> String {
        match self {
            RequestKind::BucketConfig => format!("/pools/default/buckets/{}", bucket),
            RequestKind::BucketStreaming => format!("/pools/default/bs/{}", bucket),
            RequestKind::Flush => {
                format!("/pools/default/buckets/{}/controller/doFlush", bucket)
            }
            RequestKind::GetDesignDocuments => format!("/pools/default/buckets/{}/ddocs", bucket),
        }
    }

    /// Canonical textual name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::BucketConfig => "bucket_config",
            RequestKind::BucketStreaming => "bucket_streaming",
            RequestKind::Flush => "flush",
            RequestKind::GetDesignDocuments => "get_design_documents",
        }
    }

    /// Check if replies to this kind stay open as a config stream.
    #[inline]
    pub fn is_streaming(&self) -> bool {
        matches!(self, RequestKind::BucketStreaming)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bucket_config" => Ok(RequestKind::BucketConfig),
            "bucket_streaming" => Ok(RequestKind::BucketStreaming),
            "flush" => Ok(RequestKind::Flush),
            "get_design_documents" => Ok(RequestKind::GetDesignDocuments),
            other => Err(ConfigError::UnknownRequestKind(other.to_string())),
        }
    }
}

/// An outstanding config request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRequest {
    kind: RequestKind,
    path: String,
    bucket: String,
    password: String,
}

impl ConfigRequest {
    /// Create a request with an explicit path.
    pub fn new(
        kind: RequestKind,
        path: impl Into<String>,
        bucket: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            bucket: bucket.into(),
            password: password.into(),
        }
    }

    /// Create a request from a textual kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRequestKind`] if `kind` names no request kind.
    pub fn from_kind(
        kind: &str,
        path: impl Into<String>,
        bucket: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(kind.parse()?, path, bucket, password))
    }

    /// Create a request for `bucket` at the kind's standard path.
    pub fn for_bucket(kind: RequestKind, bucket: &str, password: impl Into<String>) -> Self {
        Self::new(kind, kind.default_path(bucket), bucket, password)
    }

    /// Fetch the bucket's config.
    pub fn bucket_config(bucket: &str, password: impl Into<String>) -> Self {
        Self::for_bucket(RequestKind::BucketConfig, bucket, password)
    }

    /// Subscribe to the bucket's config stream.
    pub fn bucket_streaming(bucket: &str, password: impl Into<String>) -> Self {
        Self::for_bucket(RequestKind::BucketStreaming, bucket, password)
    }

    /// Flush the bucket.
    pub fn flush(bucket: &str, password: impl Into<String>) -> Self {
        Self::for_bucket(RequestKind::Flush, bucket, password)
    }

    /// Fetch the bucket's design documents.
    pub fn design_documents(bucket: &str, password: impl Into<String>) -> Self {
        Self::for_bucket(RequestKind::GetDesignDocuments, bucket, password)
    }

    #[inline]
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[inline]
    pub fn password(&self) -> &str {
        &self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_methods_by_kind() {
        assert_eq!(RequestKind::BucketConfig.method(), Method::Get);
        assert_eq!(RequestKind::BucketStreaming.method(), Method::Get);
        assert_eq!(RequestKind::GetDesignDocuments.method(), Method::Get);
        assert_eq!(RequestKind::Flush.method(), Method::Post);
    }

    #[test]
    fn test_standard_paths() {
        assert_eq!(
            ConfigRequest::bucket_config("default", "").path(),
            "/pools/default/buckets/default"
        );
        assert_eq!(
            ConfigRequest::bucket_streaming("default", "").path(),
            "/pools/default/bs/default"
        );
        assert_eq!(
            ConfigRequest::flush("default", "").path(),
            "/pools/default/buckets/default/controller/doFlush"
        );
        assert_eq!(
            ConfigRequest::design_documents("default", "").path(),
            "/pools/default/buckets/default/ddocs"
        );
    }

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in [
            RequestKind::BucketConfig,
            RequestKind::BucketStreaming,
            RequestKind::Flush,
            RequestKind::GetDesignDocuments,
        ] {
            assert_eq!(kind.as_str().parse::<RequestKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = ConfigRequest::from_kind("compact_bucket", "/x", "b", "p").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRequestKind(ref k) if k == "compact_bucket"));
        assert!(err.to_string().contains("compact_bucket"));
    }

    #[test]
    fn test_from_kind_keeps_fields() {
        let request = ConfigRequest::from_kind("flush", "/custom", "beer", "pw").unwrap();
        assert_eq!(request.kind(), RequestKind::Flush);
        assert_eq!(request.path(), "/custom");
        assert_eq!(request.bucket(), "beer");
        assert_eq!(request.password(), "pw");
    }

    #[test]
    fn test_only_bucket_streaming_is_streaming() {
        assert!(RequestKind::BucketStreaming.is_streaming());
        assert!(!RequestKind::BucketConfig.is_streaming());
        assert!(!RequestKind::Flush.is_streaming());
        assert!(!RequestKind::GetDesignDocuments.is_streaming());
    }
}
