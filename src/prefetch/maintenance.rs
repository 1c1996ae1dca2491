//! Periodic reset of the prefetch bookkeeping.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::client::PrefetchClient;
use super::queue::PrefetchQueue;

/// Clear processed keys and failure counts every `every`.
///
/// The first clear happens one full interval after the call. Abort the
/// returned handle to stop it.
pub fn spawn_maintenance<C: PrefetchClient>(
    queue: PrefetchQueue<C>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            debug!(interval_secs = every.as_secs(), "running prefetch maintenance");
            queue.clear_cache().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use crate::prefetch::{ContentKey, ContentType, PrefetchConfig, PrefetchError, Priority};

    struct FailEverything;

    #[async_trait]
    impl PrefetchClient for FailEverything {
        async fn fetch_detail(&self, key: ContentKey) -> Result<(), PrefetchError> {
            Err(PrefetchError::Status {
                key,
                status: StatusCode::BAD_GATEWAY,
            })
        }

        async fn fetch_related(&self, _key: ContentKey) -> Result<(), PrefetchError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_maintenance_clears_on_interval() {
        let queue = PrefetchQueue::new(FailEverything, PrefetchConfig::default());
        queue.enqueue(9, ContentType::Tv, Priority::Low).await;
        queue.wait_idle().await;
        assert_eq!(queue.get_cache_stats().await.failed, 1);

        let every = Duration::from_secs(30 * 60);
        let handle = spawn_maintenance(queue.clone(), every);

        tokio::time::sleep(every / 2).await;
        assert_eq!(queue.get_cache_stats().await.failed, 1);

        tokio::time::sleep(every).await;
        let stats = queue.get_cache_stats().await;
        assert_eq!(stats.failed, 0);
        assert!(stats.last_cleared_at.is_some());

        handle.abort();
    }
}
