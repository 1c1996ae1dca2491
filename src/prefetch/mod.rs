//! Hover-driven cache warming.
//!
//! A UI hover (or batch call) asks for `(id, type, priority)` to be warmed.
//! [`PrefetchQueue`] keeps those requests de-duplicated and ordered high
//! before low, and drains them one at a time through a [`PrefetchClient`]
//! that hits the application's detail routes. Successful keys are
//! remembered, failing keys are counted and dropped after a cap; both sets
//! are reset by [`PrefetchQueue::clear_cache`], typically from
//! [`spawn_maintenance`].
//!
//! Nothing here is user-visible: failures are logged and never returned to
//! the caller that triggered the hint.

mod client;
mod error;
mod key;
mod maintenance;
mod pending;
mod queue;

pub use client::{HttpPrefetchClient, PrefetchClient, DEFAULT_RELATED_LIMIT, PREFETCH_HEADER};
pub use error::PrefetchError;
pub use key::{ContentKey, ContentType, PrefetchRequest, Priority};
pub use maintenance::spawn_maintenance;
pub use queue::{CacheStats, EnqueueOutcome, PrefetchQueue};

use std::time::Duration;

/// Tuning for [`PrefetchQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchConfig {
    /// Pause between two queue items.
    pub item_delay: Duration,
    /// Failed attempts after which a key is ignored until the next clear.
    pub max_failures: u32,
    /// Warm related content after a successful detail prefetch.
    pub prefetch_related: bool,
    /// Delay before the related-content warm-up.
    pub related_delay: Duration,
    /// Default delay for scheduled (hover) enqueues.
    pub hover_delay: Duration,
    /// How often maintenance clears processed and failed keys.
    pub clear_interval: Duration,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_millis(500),
            max_failures: 3,
            prefetch_related: true,
            related_delay: Duration::from_secs(2),
            hover_delay: Duration::from_millis(150),
            clear_interval: Duration::from_secs(30 * 60),
        }
    }
}
