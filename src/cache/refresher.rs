//! Refreshing Cache Module
//!
//! A single value kept fresh by a background loop that calls a producer on a
//! fixed interval.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::slot::{Producer, ValueSlot};
use crate::cache::{RefreshStats, MIN_INTERVAL};
use crate::error::{RefreshError, Result};
use crate::tasks::spawn_refresh_task;

// == Loop State ==
enum LoopState {
    Idle,
    Running {
        token: CancellationToken,
        handle: JoinHandle<()>,
    },
}

impl LoopState {
    /// A loop whose token was cancelled through the handle returned by
    /// `start` is no longer running, even before `stop` is called.
    fn is_active(&self) -> bool {
        match self {
            LoopState::Idle => false,
            LoopState::Running { token, .. } => !token.is_cancelled(),
        }
    }
}

struct Control<V> {
    interval: Duration,
    producer: Producer<V>,
    state: LoopState,
}

// == Refreshing Cache ==
/// A value cell that refreshes itself from a producer in the background.
///
/// Reads never call the producer; they copy out whatever the last completed
/// refresh stored. The lifecycle is `Idle -> Running -> Idle`, and invalid
/// transitions are reported as errors instead of leaking or double-cancelling
/// a loop:
///
/// - `start` while running returns [`RefreshError::AlreadyRunning`].
/// - `stop` while idle returns [`RefreshError::NotRunning`].
///
/// Interval and producer can only be replaced while idle.
///
/// Dropping a running cache cancels its loop.
///
/// # Example
/// ```ignore
/// let cache = RefreshingCache::new(Duration::from_secs(30), fetch_entities);
/// let token = cache.start()?;
/// let entities = cache.fetch();
/// cache.stop()?;
/// ```
pub struct RefreshingCache<V> {
    slot: Arc<ValueSlot<V>>,
    control: Mutex<Control<V>>,
}

impl<V> RefreshingCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an idle cache with no value.
    ///
    /// # Arguments
    /// * `interval` - Time between background refreshes, validated on `start`
    /// * `producer` - Function whose result is cached
    pub fn new<F>(interval: Duration, producer: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
    {
        Self {
            slot: Arc::new(ValueSlot::new()),
            control: Mutex::new(Control {
                interval,
                producer: Arc::new(producer),
                state: LoopState::Idle,
            }),
        }
    }

    // == Start ==
    /// Refreshes once on the calling thread, then spawns the background loop
    /// on the current tokio runtime.
    ///
    /// Returns a token that stops the loop when cancelled. The caller is
    /// blocked for the duration of the first producer call. If a loop from an
    /// earlier cycle is still inside a producer call, `start` first waits for
    /// that call to finish; its value is discarded.
    ///
    /// The lifecycle lock is held for the whole call, so concurrent `start`,
    /// `stop`, `is_running`, `interval` and the setters wait behind a slow
    /// producer. `fetch` and `stats` never wait on the producer.
    ///
    /// # Errors
    /// - `AlreadyRunning` if a loop is active
    /// - `InvalidInterval` if the interval is below [`MIN_INTERVAL`]
    /// - `NoRuntime` if called outside a tokio runtime
    pub fn start(&self) -> Result<CancellationToken> {
        let mut control = self.control.lock();

        if control.state.is_active() {
            warn!("Start called while the refresh loop is already running");
            return Err(RefreshError::AlreadyRunning);
        }
        if control.interval < MIN_INTERVAL {
            return Err(RefreshError::InvalidInterval(control.interval));
        }
        let runtime = Handle::try_current().map_err(|_| RefreshError::NoRuntime)?;

        self.update(&control.producer);
        self.slot.record_start();

        let token = CancellationToken::new();
        let handle = spawn_refresh_task(
            &runtime,
            Arc::clone(&self.slot),
            Arc::clone(&control.producer),
            control.interval,
            token.clone(),
        );
        control.state = LoopState::Running {
            token: token.clone(),
            handle,
        };

        info!("Refreshing cache started (interval={:?})", control.interval);
        Ok(token)
    }

    // == Fetch ==
    /// Returns the most recently refreshed value, or `None` if no refresh
    /// has completed yet. Never calls the producer.
    pub fn fetch(&self) -> Option<V> {
        self.slot.get()
    }

    // == Stop ==
    /// Signals the background loop to stop and returns without waiting.
    ///
    /// A refresh already in flight is discarded rather than stored. If the
    /// token returned by `start` was cancelled directly, this completes the
    /// transition back to idle.
    ///
    /// # Errors
    /// - `NotRunning` if `start` has not been called since the last `stop`
    pub fn stop(&self) -> Result<()> {
        let state = std::mem::replace(&mut self.control.lock().state, LoopState::Idle);

        match state {
            LoopState::Running { token, .. } => {
                token.cancel();
                info!("Refreshing cache stopped");
                Ok(())
            }
            LoopState::Idle => {
                warn!("Stop called while the refresh loop is not running");
                Err(RefreshError::NotRunning)
            }
        }
    }

    // == Stop And Wait ==
    /// Like [`stop`](Self::stop), but waits until the background loop has
    /// exited.
    pub async fn stop_and_wait(&self) -> Result<()> {
        let state = std::mem::replace(&mut self.control.lock().state, LoopState::Idle);

        let LoopState::Running { token, handle } = state else {
            warn!("Stop called while the refresh loop is not running");
            return Err(RefreshError::NotRunning);
        };

        token.cancel();
        handle
            .await
            .map_err(|e| RefreshError::Internal(format!("refresh task failed: {}", e)))?;
        info!("Refreshing cache stopped, refresh task joined");
        Ok(())
    }

    /// Returns true while a background loop is active.
    pub fn is_running(&self) -> bool {
        self.control.lock().state.is_active()
    }

    /// Returns the configured refresh interval.
    pub fn interval(&self) -> Duration {
        self.control.lock().interval
    }

    // == Set Interval ==
    /// Replaces the refresh interval. Only allowed while idle; the new
    /// interval applies from the next `start`.
    pub fn set_interval(&self, interval: Duration) -> Result<()> {
        if interval < MIN_INTERVAL {
            return Err(RefreshError::InvalidInterval(interval));
        }
        let mut control = self.control.lock();
        if control.state.is_active() {
            return Err(RefreshError::AlreadyRunning);
        }
        control.interval = interval;
        Ok(())
    }

    // == Set Producer ==
    /// Replaces the producer. Only allowed while idle.
    pub fn set_producer<F>(&self, producer: F) -> Result<()>
    where
        F: Fn() -> V + Send + Sync + 'static,
    {
        let mut control = self.control.lock();
        if control.state.is_active() {
            return Err(RefreshError::AlreadyRunning);
        }
        control.producer = Arc::new(producer);
        Ok(())
    }

    /// Returns a snapshot of the refresh statistics.
    pub fn stats(&self) -> RefreshStats {
        self.slot.stats()
    }

    // Producer runs outside the value lock; only the assignment is exclusive.
    fn update(&self, producer: &Producer<V>) {
        let elapsed = self.slot.refresh(producer);
        debug!("Synchronous refresh completed in {:?}", elapsed);
    }
}

impl<V> Drop for RefreshingCache<V> {
    fn drop(&mut self) {
        if let LoopState::Running { token, .. } = &self.control.get_mut().state {
            token.cancel();
        }
    }
}
