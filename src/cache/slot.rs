//! Value Slot Module
//!
//! Holds the cached value and its statistics behind a read/write lock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::cache::RefreshStats;

/// A shareable zero-argument function whose result gets cached.
pub type Producer<V> = Arc<dyn Fn() -> V + Send + Sync>;

// == Value Slot ==
/// The single shared mutable resource of a cache.
///
/// Writers hold the exclusive value lock only for the assignment, never while
/// the producer runs. Producer calls are serialized by a separate refresh
/// lock, so readers are never blocked behind a slow producer and two refreshes
/// of the same slot never overlap.
#[derive(Debug)]
pub(crate) struct ValueSlot<V> {
    inner: RwLock<SlotState<V>>,
    refresh: Mutex<()>,
}

#[derive(Debug)]
struct SlotState<V> {
    value: Option<V>,
    stats: RefreshStats,
}

impl<V: Clone> ValueSlot<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SlotState {
                value: None,
                stats: RefreshStats::new(),
            }),
            refresh: Mutex::new(()),
        }
    }

    // == Get ==
    /// Copies out the current value, `None` if no refresh has completed.
    pub fn get(&self) -> Option<V> {
        self.inner.read().value.clone()
    }

    // == Store ==
    /// Replaces the value and records the refresh.
    pub fn store(&self, value: V, elapsed: Duration) {
        let mut state = self.inner.write();
        state.value = Some(value);
        state.stats.record_refresh(elapsed);
    }

    // == Refresh ==
    /// Runs the producer and stores its result.
    ///
    /// Waits for any refresh already in progress on this slot.
    pub fn refresh(&self, producer: &Producer<V>) -> Duration {
        let _refreshing = self.refresh.lock();
        let (value, elapsed) = produce(producer);
        self.store(value, elapsed);
        elapsed
    }

    // == Refresh Unless Cancelled ==
    /// Refresh on behalf of the loop owning `token`.
    ///
    /// Returns `None` without storing anything if `token` is cancelled before
    /// the producer is called or before its value is stored. Both checks run
    /// under the refresh lock, so once a loop's token is cancelled and
    /// another refresh has taken the lock, that loop can no longer write.
    pub fn refresh_unless_cancelled(
        &self,
        producer: &Producer<V>,
        token: &CancellationToken,
    ) -> Option<Duration> {
        let _refreshing = self.refresh.lock();
        if token.is_cancelled() {
            return None;
        }
        let (value, elapsed) = produce(producer);
        if token.is_cancelled() {
            return None;
        }
        self.store(value, elapsed);
        Some(elapsed)
    }

    pub fn stats(&self) -> RefreshStats {
        self.inner.read().stats.clone()
    }

    pub fn record_start(&self) {
        self.inner.write().stats.record_start();
    }

    pub fn record_failure(&self) {
        self.inner.write().stats.record_failure();
    }
}

// == Produce ==
/// Invokes the producer and measures how long it took.
fn produce<V>(producer: &Producer<V>) -> (V, Duration) {
    let started = Instant::now();
    let value = producer();
    (value, started.elapsed())
}
