//! Application settings.

use std::time::Duration;

use serde::Serialize;

use crate::http_client::FetchPolicy;
use crate::prefetch::PrefetchConfig;
use crate::rate_limit::{BASE_BACKOFF, MAX_BACKOFF};

/// Fully resolved settings: defaults, then config file, then environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Base URL of the application whose routes get warmed.
    pub base_url: String,
    /// User agent override for outbound requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Retries after the first attempt for retrying fetches.
    pub max_retries: u32,
    /// Pause between prefetch queue items in milliseconds.
    pub item_delay_ms: u64,
    /// Failures after which a key is ignored until the next clear.
    pub max_failures: u32,
    /// Warm related content after each successful prefetch.
    pub prefetch_related: bool,
    /// Delay before the related-content warm-up in milliseconds.
    pub related_delay_ms: u64,
    /// Number of related items requested.
    pub related_limit: u32,
    /// Default hover delay in milliseconds.
    pub hover_delay_ms: u64,
    /// Interval between cache clears in seconds.
    pub clear_interval_secs: u64,
    /// Listen address for `serve`.
    pub listen: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            user_agent: None,
            request_timeout_secs: 10,
            max_retries: 3,
            item_delay_ms: 500,
            max_failures: 3,
            prefetch_related: true,
            related_delay_ms: 2000,
            related_limit: 6,
            hover_delay_ms: 150,
            clear_interval_secs: 30 * 60,
            listen: "127.0.0.1:8787".to_string(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry policy for [`crate::http_client::RetryingFetcher`].
    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            max_retries: self.max_retries,
            timeout: self.request_timeout(),
            base_backoff: BASE_BACKOFF,
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Tuning for [`crate::prefetch::PrefetchQueue`].
    pub fn prefetch_config(&self) -> PrefetchConfig {
        PrefetchConfig {
            item_delay: Duration::from_millis(self.item_delay_ms),
            max_failures: self.max_failures,
            prefetch_related: self.prefetch_related,
            related_delay: Duration::from_millis(self.related_delay_ms),
            hover_delay: Duration::from_millis(self.hover_delay_ms),
            clear_interval: Duration::from_secs(self.clear_interval_secs),
        }
    }
}
