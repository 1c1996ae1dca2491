//! Priority prefetch queue with a self-starting single worker.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::client::PrefetchClient;
use super::key::{ContentKey, ContentType, PrefetchRequest, Priority};
use super::pending::PendingPrefetches;
use super::PrefetchConfig;

/// What `enqueue` did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnqueueOutcome {
    /// New entry added.
    Queued,
    /// Existing low-priority entry raised to high.
    Upgraded,
    /// Already waiting at the same or higher priority.
    AlreadyQueued,
    /// Warmed since the last cache clear.
    AlreadyProcessed,
    /// Failure cap reached since the last cache clear.
    GaveUp,
}

impl EnqueueOutcome {
    /// Whether the queue changed.
    pub fn accepted(&self) -> bool {
        matches!(self, EnqueueOutcome::Queued | EnqueueOutcome::Upgraded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnqueueOutcome::Queued => "queued",
            EnqueueOutcome::Upgraded => "upgraded",
            EnqueueOutcome::AlreadyQueued => "already_queued",
            EnqueueOutcome::AlreadyProcessed => "already_processed",
            EnqueueOutcome::GaveUp => "gave_up",
        }
    }
}

/// Snapshot of queue bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub processed: usize,
    pub failed: usize,
    pub queued: usize,
    pub processing: bool,
    pub pending: usize,
    pub last_cleared_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct QueueState {
    queue: VecDeque<PrefetchRequest>,
    processed: HashSet<ContentKey>,
    failures: HashMap<ContentKey, u32>,
    /// Key the worker is fetching right now.
    in_flight: Option<ContentKey>,
    /// True while a worker task owns the drain loop.
    processing: bool,
    last_cleared_at: Option<DateTime<Utc>>,
}

impl QueueState {
    /// Stable: equal priorities keep insertion order.
    fn sort(&mut self) {
        self.queue
            .make_contiguous()
            .sort_by_key(|request| request.priority.rank());
    }
}

struct Inner<C> {
    client: Arc<C>,
    config: PrefetchConfig,
    state: Mutex<QueueState>,
    pending: PendingPrefetches,
    /// `true` when no worker is running.
    idle: watch::Sender<bool>,
}

/// Best-effort cache warmer.
///
/// Cloning is cheap and every clone drives the same queue. All bookkeeping
/// sits behind one mutex that is never held across a network call. Must be
/// used from within a Tokio runtime.
pub struct PrefetchQueue<C: PrefetchClient> {
    inner: Arc<Inner<C>>,
}

impl<C: PrefetchClient> Clone for PrefetchQueue<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: PrefetchClient> PrefetchQueue<C> {
    pub fn new(client: C, config: PrefetchConfig) -> Self {
        let (idle, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                client: Arc::new(client),
                config,
                state: Mutex::new(QueueState::default()),
                pending: PendingPrefetches::default(),
                idle,
            }),
        }
    }

    pub fn client(&self) -> &C {
        &self.inner.client
    }

    pub fn config(&self) -> &PrefetchConfig {
        &self.inner.config
    }

    /// Queue `(content_type, id)` for warming.
    pub async fn enqueue(
        &self,
        id: i64,
        content_type: ContentType,
        priority: Priority,
    ) -> EnqueueOutcome {
        self.enqueue_key(ContentKey::new(content_type, id), priority)
            .await
    }

    /// Queue `key` for warming, starting the worker if it is idle.
    pub async fn enqueue_key(&self, key: ContentKey, priority: Priority) -> EnqueueOutcome {
        let mut state = self.inner.state.lock().await;

        if state.processed.contains(&key) {
            debug!(%key, "already prefetched, skipping");
            return EnqueueOutcome::AlreadyProcessed;
        }

        let failures = state.failures.get(&key).copied().unwrap_or(0);
        if failures >= self.inner.config.max_failures {
            debug!(%key, failures, "prefetch failure cap reached, skipping");
            return EnqueueOutcome::GaveUp;
        }

        if state.in_flight == Some(key) {
            debug!(%key, "prefetch already in flight, skipping");
            return EnqueueOutcome::AlreadyQueued;
        }

        if let Some(existing) = state.queue.iter_mut().find(|r| r.key == key) {
            if priority == Priority::High && existing.priority == Priority::Low {
                existing.priority = Priority::High;
                state.sort();
                debug!(%key, "upgraded queued prefetch to high priority");
                return EnqueueOutcome::Upgraded;
            }
            return EnqueueOutcome::AlreadyQueued;
        }

        state.queue.push_back(PrefetchRequest { key, priority });
        state.sort();
        debug!(%key, %priority, queued = state.queue.len(), "prefetch queued");

        let start_worker = !state.processing;
        if start_worker {
            state.processing = true;
            self.inner.idle.send_replace(false);
        }
        drop(state);

        if start_worker {
            let queue = self.clone();
            tokio::spawn(async move { queue.drain().await });
        }

        EnqueueOutcome::Queued
    }

    /// Queue every key at the same priority. Returns how many changed the queue.
    pub async fn enqueue_batch<I>(&self, keys: I, priority: Priority) -> usize
    where
        I: IntoIterator<Item = ContentKey>,
    {
        let mut accepted = 0;
        for key in keys {
            if self.enqueue_key(key, priority).await.accepted() {
                accepted += 1;
            }
        }
        accepted
    }

    /// Enqueue `key` after `delay` unless cancelled first.
    ///
    /// Scheduling a key that is already pending restarts its timer and keeps
    /// the more urgent priority.
    pub async fn schedule(&self, key: ContentKey, priority: Priority, delay: Duration) {
        let queue = self.clone();
        self.inner
            .pending
            .replace(key, priority, move |generation, priority| {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if queue.inner.pending.take_if_current(key, generation).await {
                        queue.enqueue_key(key, priority).await;
                    }
                })
            })
            .await;
    }

    /// Cancel a scheduled enqueue that has not fired yet.
    ///
    /// Has no effect on requests already queued or in flight.
    pub async fn cancel_prefetch(&self, key: ContentKey) -> bool {
        let cancelled = self.inner.pending.cancel(key).await;
        if cancelled {
            debug!(%key, "cancelled pending prefetch");
        }
        cancelled
    }

    /// Forget processed keys and failure counts. The queue itself is untouched.
    pub async fn clear_cache(&self) {
        let mut state = self.inner.state.lock().await;
        let processed = state.processed.len();
        let failed = state.failures.len();
        state.processed.clear();
        state.failures.clear();
        state.last_cleared_at = Some(Utc::now());
        info!(processed, failed, "prefetch cache cleared");
    }

    pub async fn get_cache_stats(&self) -> CacheStats {
        let pending = self.inner.pending.len().await;
        let state = self.inner.state.lock().await;
        CacheStats {
            processed: state.processed.len(),
            failed: state.failures.len(),
            queued: state.queue.len(),
            processing: state.processing,
            pending,
            last_cleared_at: state.last_cleared_at,
        }
    }

    /// Requests waiting to be processed, in drain order.
    pub async fn queued(&self) -> Vec<PrefetchRequest> {
        self.inner.state.lock().await.queue.iter().copied().collect()
    }

    /// Resolve once no worker is running.
    pub async fn wait_idle(&self) {
        let mut idle = self.inner.idle.subscribe();
        // The sender lives in `inner`, which we hold, so this cannot close.
        let _ = idle.wait_for(|idle| *idle).await;
    }

    /// Worker loop: pop, process, pause, until the queue is empty.
    async fn drain(&self) {
        debug!("prefetch worker started");

        loop {
            let next = {
                let mut state = self.inner.state.lock().await;
                match state.queue.pop_front() {
                    Some(request) if state.processed.contains(&request.key) => {
                        debug!(key = %request.key, "prefetched while queued, skipping");
                        continue;
                    }
                    Some(request) => {
                        state.in_flight = Some(request.key);
                        request
                    }
                    None => {
                        state.processing = false;
                        self.inner.idle.send_replace(true);
                        break;
                    }
                }
            };

            self.process(next).await;

            let more = !self.inner.state.lock().await.queue.is_empty();
            if more {
                tokio::time::sleep(self.inner.config.item_delay).await;
            }
        }

        debug!("prefetch worker idle");
    }

    async fn process(&self, request: PrefetchRequest) {
        let key = request.key;
        debug!(%key, priority = %request.priority, "prefetching");

        match self.inner.client.fetch_detail(key).await {
            Ok(()) => {
                {
                    let mut state = self.inner.state.lock().await;
                    state.in_flight = None;
                    state.processed.insert(key);
                    state.failures.remove(&key);
                }
                debug!(%key, "prefetch complete");

                if self.inner.config.prefetch_related {
                    self.schedule_related(key);
                }
            }
            Err(e) => {
                let failures = {
                    let mut state = self.inner.state.lock().await;
                    state.in_flight = None;
                    let count = state.failures.entry(key).or_insert(0);
                    *count += 1;
                    *count
                };
                warn!(
                    %key,
                    failures,
                    max_failures = self.inner.config.max_failures,
                    error = %e,
                    "prefetch failed"
                );
            }
        }
    }

    /// Fire-and-forget related-content warm-up; failures are only logged.
    fn schedule_related(&self, key: ContentKey) {
        let client = Arc::clone(&self.inner.client);
        let delay = self.inner.config.related_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match client.fetch_related(key).await {
                Ok(()) => debug!(%key, "related content prefetched"),
                Err(e) => warn!(%key, error = %e, "related content prefetch failed"),
            }
        });
    }
}
