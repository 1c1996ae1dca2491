//! HTTP response wrappers.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Response, StatusCode};

use crate::rate_limit::parse_retry_after;

/// Response body source - either pending (reqwest) or already buffered.
pub(crate) enum ResponseBody {
    /// Pending response from reqwest.
    Pending(Response),
    /// Already fetched content (test transports, replays).
    Ready(Vec<u8>),
}

/// HTTP response wrapper.
///
/// Header names are stored lowercase.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    pub(crate) body: ResponseBody,
}

impl HttpResponse {
    /// Create from a reqwest response.
    pub(crate) fn from_reqwest(
        status: StatusCode,
        headers: HashMap<String, String>,
        response: Response,
    ) -> Self {
        Self {
            status,
            headers,
            body: ResponseBody::Pending(response),
        }
    }

    /// Create from already-fetched content.
    pub fn from_bytes(
        status: StatusCode,
        headers: HashMap<String, String>,
        content: Vec<u8>,
    ) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            status,
            headers,
            body: ResponseBody::Ready(content),
        }
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the response indicates rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }

    /// Get a header by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Wait requested by the server via Retry-After, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        parse_retry_after(self.header("retry-after"))
    }

    /// Get response body as bytes.
    pub async fn bytes(self) -> Result<Vec<u8>, reqwest::Error> {
        match self.body {
            ResponseBody::Pending(response) => response.bytes().await.map(|b| b.to_vec()),
            ResponseBody::Ready(bytes) => Ok(bytes),
        }
    }

    /// Get response body as text.
    pub async fn text(self) -> Result<String, reqwest::Error> {
        match self.body {
            ResponseBody::Pending(response) => response.text().await,
            // Best effort UTF-8 conversion
            ResponseBody::Ready(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
