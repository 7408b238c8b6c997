//! Refresh Statistics Module
//!
//! Tracks how often the cached value was refreshed and when.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Refresh Stats ==
/// Tracks refresh activity of a cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshStats {
    /// Number of completed refreshes (synchronous and background)
    pub refreshes: u64,
    /// Number of producer calls that panicked in the background loop
    pub failures: u64,
    /// Number of start cycles
    pub starts: u64,
    /// Wall-clock time the last refresh completed
    pub last_refreshed_at: Option<DateTime<Utc>>,
    /// Duration of the last producer call in milliseconds
    pub last_refresh_ms: Option<u64>,
}

impl RefreshStats {
    // == Constructor ==
    /// Creates a new RefreshStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Refresh ==
    /// Records a completed refresh that took `elapsed` in the producer.
    pub fn record_refresh(&mut self, elapsed: Duration) {
        self.refreshes += 1;
        self.last_refreshed_at = Some(Utc::now());
        self.last_refresh_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
    }

    // == Record Failure ==
    /// Increments the failure counter.
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    // == Record Start ==
    /// Increments the start counter.
    pub fn record_start(&mut self) {
        self.starts += 1;
    }

    /// Time elapsed since the last refresh, if any refresh has completed.
    pub fn age(&self) -> Option<chrono::Duration> {
        self.last_refreshed_at.map(|at| Utc::now() - at)
    }
}
