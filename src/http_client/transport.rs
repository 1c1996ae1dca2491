//! Transport seam between retry policy and the wire.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::response::HttpResponse;
use super::user_agent::resolve_user_agent;

/// Coarse cause of a transport failure, logged as a short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Reset,
    Timeout,
    Body,
    Request,
    Other,
}

impl TransportErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connect => "ECONNREFUSED",
            Self::Reset => "ECONNRESET",
            Self::Timeout => "ETIMEDOUT",
            Self::Body => "EBODY",
            Self::Request => "EREQUEST",
            Self::Other => "EUNKNOWN",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A request that never produced an HTTP status.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if is_connection_reset(&e) {
            TransportErrorKind::Reset
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_body() || e.is_decode() {
            TransportErrorKind::Body
        } else if e.is_request() {
            TransportErrorKind::Request
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, e.to_string())
    }
}

/// Walk the source chain looking for an io reset.
fn is_connection_reset(e: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted
            );
        }
        source = err.source();
    }
    false
}

/// Something that can issue a single GET.
///
/// Implementations must not retry; the caller owns retry and timeout policy.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &[(&str, &str)])
        -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by a shared reqwest client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the given user agent configuration.
    ///
    /// `timeout` is a hard ceiling for the whole exchange, body included.
    pub fn new(user_agent_config: Option<&str>, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(resolve_user_agent(user_agent_config))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();

        let mut response_headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                response_headers.insert(name.as_str().to_string(), v.to_string());
            }
        }

        Ok(HttpResponse::from_reqwest(status, response_headers, response))
    }
}
