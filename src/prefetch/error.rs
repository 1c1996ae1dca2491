//! Prefetch error types.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use super::key::ContentKey;
use crate::http_client::TransportError;

#[derive(Debug, Error)]
pub enum PrefetchError {
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
    #[error("Invalid priority: {0}")]
    InvalidPriority(String),
    #[error("Invalid content key: {0} (expected e.g. movie:10)")]
    InvalidKey(String),
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Prefetch of {key} got HTTP {status}")]
    Status { key: ContentKey, status: StatusCode },
    #[error("Prefetch of {key} timed out after {timeout:?}")]
    Timeout { key: ContentKey, timeout: Duration },
    #[error("Prefetch of {key} failed: {source}")]
    Transport {
        key: ContentKey,
        #[source]
        source: TransportError,
    },
}

impl From<url::ParseError> for PrefetchError {
    fn from(e: url::ParseError) -> Self {
        PrefetchError::InvalidBaseUrl(e.to_string())
    }
}
