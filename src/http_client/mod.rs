//! Outbound HTTP with bounded retries for rate-limited upstreams.
//!
//! [`RetryingFetcher`] wraps a [`Transport`] with a per-attempt abort timeout
//! and exponential backoff between retryable failures (429, 5xx, network).
//! Client errors fail on the first attempt.

mod error;
mod response;
mod transport;
mod user_agent;

pub use error::FetchError;
pub use response::HttpResponse;
pub use transport::{ReqwestTransport, Transport, TransportError, TransportErrorKind};
pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::time::Duration;

use tracing::{debug, warn};

use crate::rate_limit::{backoff_delay, BASE_BACKOFF, MAX_BACKOFF};

/// Retry and timeout knobs for [`RetryingFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Abort timeout applied to each attempt.
    pub timeout: Duration,
    /// Wait after the first failed attempt.
    pub base_backoff: Duration,
    /// Ceiling for any single wait.
    pub max_backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(10),
            base_backoff: BASE_BACKOFF,
            max_backoff: MAX_BACKOFF,
        }
    }
}

impl FetchPolicy {
    /// Total attempts allowed, first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before the next attempt, after `attempt` (1-based) failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        backoff_delay(attempt, self.base_backoff, self.max_backoff)
    }
}

/// GET with bounded exponential backoff. Stateless between calls.
#[derive(Clone)]
pub struct RetryingFetcher<T = ReqwestTransport> {
    transport: T,
    policy: FetchPolicy,
}

impl RetryingFetcher<ReqwestTransport> {
    /// Create a fetcher over a fresh reqwest client.
    pub fn new(policy: FetchPolicy, user_agent_config: Option<&str>) -> Self {
        // Per-attempt timeout is enforced here; the client ceiling only
        // guards body reads after a response was returned.
        let transport = ReqwestTransport::new(user_agent_config, policy.timeout * 3);
        Self::with_transport(transport, policy)
    }
}

impl<T: Transport> RetryingFetcher<T> {
    pub fn with_transport(transport: T, policy: FetchPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `url`, retrying transient failures.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.get_with_headers(url, &[]).await
    }

    /// GET `url` with extra request headers, retrying transient failures.
    ///
    /// Returns the first 2xx response. A non-retryable status is returned
    /// as-is after one attempt; exhausting retries yields
    /// [`FetchError::Exhausted`] wrapping the last failure.
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, FetchError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let failure = match self.attempt(url, headers).await {
                Ok(response) => {
                    if attempt > 1 {
                        debug!(url, attempt, "request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            if attempt >= max_attempts {
                warn!(url, attempts = attempt, error = %failure, "retries exhausted");
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last: Box::new(failure),
                });
            }

            // Retry-After can lengthen the backoff, never shorten it.
            let backoff = self.policy.delay_after(attempt);
            let wait = failure
                .retry_after()
                .map_or(backoff, |requested| requested.max(backoff))
                .min(self.policy.max_backoff);

            warn!(
                url,
                attempt,
                max_attempts,
                wait_ms = wait.as_millis() as u64,
                error = %failure,
                "retryable failure, backing off"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// One attempt: Ok only for 2xx.
    async fn attempt(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, FetchError> {
        let timeout = self.policy.timeout;

        match tokio::time::timeout(timeout, self.transport.get(url, headers)).await {
            Err(_) => {
                warn!(url, code = "ETIMEDOUT", "request aborted by timeout");
                Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout,
                })
            }
            Ok(Err(source)) => {
                warn!(url, code = source.kind.code(), error = %source.message, "network error");
                Err(FetchError::Transport {
                    url: url.to_string(),
                    source,
                })
            }
            Ok(Ok(response)) if response.is_success() => Ok(response),
            Ok(Ok(response)) => Err(FetchError::Status {
                url: url.to_string(),
                status: response.status,
                retry_after: response.retry_after(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use tokio::time::Instant;

    enum Step {
        Status(u16),
        RetryAfter(u16, &'static str),
        Fail(TransportErrorKind),
        Hang,
    }

    /// Replays a fixed script of outcomes and records when each call landed.
    struct ScriptedTransport {
        steps: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Milliseconds between consecutive calls.
        fn gaps_ms(&self) -> Vec<u128> {
            let calls = self.calls.lock().unwrap();
            calls
                .windows(2)
                .map(|w| (w[1] - w[0]).as_millis())
                .collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(
            &self,
            _url: &str,
            _headers: &[(&str, &str)],
        ) -> Result<HttpResponse, TransportError> {
            self.calls.lock().unwrap().push(Instant::now());
            let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Status(200));

            let mut headers = HashMap::new();
            let code = match step {
                Step::Status(code) => code,
                Step::RetryAfter(code, secs) => {
                    headers.insert("retry-after".to_string(), secs.to_string());
                    code
                }
                Step::Fail(kind) => return Err(TransportError::new(kind, "scripted")),
                Step::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    return Err(TransportError::new(TransportErrorKind::Other, "hung"));
                }
            };

            Ok(HttpResponse::from_bytes(
                StatusCode::from_u16(code).unwrap(),
                headers,
                b"{}".to_vec(),
            ))
        }
    }

    fn fetcher(steps: Vec<Step>) -> RetryingFetcher<ScriptedTransport> {
        RetryingFetcher::with_transport(ScriptedTransport::new(steps), FetchPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_returns_immediately() {
        let f = fetcher(vec![Step::Status(200)]);
        let response = f.get("http://upstream/movie/1").await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(f.transport().call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_double_each_retry() {
        let f = fetcher(vec![
            Step::Status(503),
            Step::Status(429),
            Step::Status(500),
            Step::Status(200),
        ]);
        let response = f.get("http://upstream/movie/1").await.unwrap();
        assert!(response.is_success());
        assert_eq!(f.transport().gaps_ms(), vec![1000, 2000, 4000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_caps_at_five_seconds() {
        let policy = FetchPolicy {
            max_retries: 5,
            ..FetchPolicy::default()
        };
        let f = RetryingFetcher::with_transport(
            ScriptedTransport::new((0..6).map(|_| Step::Status(502)).collect()),
            policy,
        );
        let err = f.get("http://upstream/tv/2").await.unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { attempts: 6, .. }));
        assert_eq!(f.transport().gaps_ms(), vec![1000, 2000, 4000, 5000, 5000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_not_retried() {
        let f = fetcher(vec![Step::Status(400), Step::Status(200)]);
        let err = f.get("http://upstream/movie/1").await.unwrap_err();
        assert_eq!(f.transport().call_count(), 1);
        assert!(!err.is_retryable());
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_carries_last_status() {
        let f = fetcher((0..4).map(|_| Step::Status(500)).collect());
        let err = f.get("http://upstream/movie/1").await.unwrap_err();
        match &err {
            FetchError::Exhausted { attempts, .. } => assert_eq!(*attempts, 4),
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(f.transport().call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_errors_are_retried() {
        let f = fetcher(vec![
            Step::Fail(TransportErrorKind::Reset),
            Step::Fail(TransportErrorKind::Connect),
            Step::Status(200),
        ]);
        assert!(f.get("http://upstream/movie/1").await.is_ok());
        assert_eq!(f.transport().gaps_ms(), vec![1000, 2000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_attempt_is_aborted_and_retried() {
        let f = fetcher(vec![Step::Hang, Step::Status(200)]);
        assert!(f.get("http://upstream/movie/1").await.is_ok());
        // 10s abort timeout, then the first backoff step.
        assert_eq!(f.transport().gaps_ms(), vec![11_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_only_failures_report_timeout() {
        let policy = FetchPolicy {
            max_retries: 1,
            ..FetchPolicy::default()
        };
        let f = RetryingFetcher::with_transport(
            ScriptedTransport::new(vec![Step::Hang, Step::Hang]),
            policy,
        );
        let err = f.get("http://upstream/movie/1").await.unwrap_err();
        match err {
            FetchError::Exhausted { last, .. } => {
                assert!(matches!(*last, FetchError::Timeout { .. }))
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_is_honoured_and_capped() {
        let f = fetcher(vec![
            Step::RetryAfter(429, "2"),
            Step::RetryAfter(429, "30"),
            Step::Status(200),
        ]);
        assert!(f.get("http://upstream/movie/1").await.is_ok());
        assert_eq!(f.transport().gaps_ms(), vec![2000, 5000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_retry_after_keeps_backoff_schedule() {
        let f = fetcher(vec![
            Step::RetryAfter(429, "0"),
            Step::RetryAfter(429, "0"),
            Step::RetryAfter(429, "0"),
            Step::Status(200),
        ]);
        assert!(f.get("http://upstream/movie/1").await.is_ok());
        assert_eq!(f.transport().gaps_ms(), vec![1000, 2000, 4000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_ignored_on_server_error() {
        let f = fetcher(vec![Step::RetryAfter(503, "4"), Step::Status(200)]);
        assert!(f.get("http://upstream/movie/1").await.is_ok());
        assert_eq!(f.transport().gaps_ms(), vec![1000]);
    }

    #[test]
    fn test_default_policy() {
        let policy = FetchPolicy::default();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.timeout, Duration::from_secs(10));
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(4), Duration::from_millis(5000));
    }
}
