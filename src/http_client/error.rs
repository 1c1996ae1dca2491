//! Fetch error types.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use super::transport::TransportError;
use crate::rate_limit::is_retryable_status;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: StatusCode,
        retry_after: Option<Duration>,
    },
    /// The attempt was aborted by the per-attempt timeout.
    #[error("request to {url} aborted after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    /// Connection-level failure before any status was received.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },
    /// Every allowed attempt failed with a retryable error.
    #[error("giving up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => is_retryable_status(status.as_u16()),
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::Exhausted { .. } => false,
        }
    }

    /// Last HTTP status observed, looking through exhaustion.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Exhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Server-requested wait, only honoured for 429.
    pub(crate) fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Status {
                status,
                retry_after,
                ..
            } if *status == StatusCode::TOO_MANY_REQUESTS => *retry_after,
            _ => None,
        }
    }
}
