//! Delayed (hover) enqueues that have not reached the queue yet.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::key::{ContentKey, Priority};

struct PendingTimer {
    generation: u64,
    priority: Priority,
    handle: JoinHandle<()>,
}

/// Timers keyed by content; at most one per key.
#[derive(Default)]
pub(crate) struct PendingPrefetches {
    timers: Mutex<HashMap<ContentKey, PendingTimer>>,
    next_generation: AtomicU64,
}

impl PendingPrefetches {
    /// Register a timer, replacing (and aborting) any earlier one for `key`.
    ///
    /// `spawn` receives the generation and effective priority and must start
    /// the timer task. It runs while the map is locked, so a timer that fires
    /// immediately still finds its own entry.
    pub(crate) async fn replace<F>(&self, key: ContentKey, priority: Priority, spawn: F)
    where
        F: FnOnce(u64, Priority) -> JoinHandle<()>,
    {
        let mut timers = self.timers.lock().await;

        let priority = match timers.remove(&key) {
            Some(previous) => {
                previous.handle.abort();
                previous.priority.most_urgent(priority)
            }
            None => priority,
        };

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let handle = spawn(generation, priority);

        timers.insert(
            key,
            PendingTimer {
                generation,
                priority,
                handle,
            },
        );
    }

    /// Called by a fired timer: remove its entry if it is still current.
    pub(crate) async fn take_if_current(&self, key: ContentKey, generation: u64) -> bool {
        let mut timers = self.timers.lock().await;
        match timers.get(&key) {
            Some(timer) if timer.generation == generation => {
                timers.remove(&key);
                true
            }
            _ => false,
        }
    }

    /// Cancel a timer that has not fired yet.
    pub(crate) async fn cancel(&self, key: ContentKey) -> bool {
        match self.timers.lock().await.remove(&key) {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    pub(crate) async fn len(&self) -> usize {
        self.timers.lock().await.len()
    }
}
