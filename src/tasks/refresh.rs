//! Refresh Task
//!
//! Background task that periodically recomputes a cached value until it is
//! cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::cache::slot::{Producer, ValueSlot};

/// Spawns a background task that refreshes `slot` every `period`.
///
/// The first tick fires one full `period` after spawning; the caller is
/// expected to have refreshed synchronously already. Each tick races the
/// timer against `token`, and cancellation wins when both are ready, so no
/// producer call starts once the token is cancelled. A value produced while
/// the token was being cancelled is discarded.
///
/// The producer runs on the blocking pool under the slot's refresh lock and
/// is awaited before the next tick, so it never runs concurrently with itself
/// or with the synchronous refresh of a later `start`. Ticks missed during a
/// slow producer call are skipped rather than bunched.
///
/// # Returns
/// A JoinHandle for the spawned task, which completes once the loop has
/// observed cancellation.
pub(crate) fn spawn_refresh_task<V>(
    runtime: &Handle,
    slot: Arc<ValueSlot<V>>,
    producer: Producer<V>,
    period: Duration,
    token: CancellationToken,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    runtime.spawn(async move {
        info!("Starting refresh task with interval of {:?}", period);

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let call = Arc::clone(&producer);
            let target = Arc::clone(&slot);
            let owner = token.clone();
            let refresh =
                tokio::task::spawn_blocking(move || target.refresh_unless_cancelled(&call, &owner));
            match refresh.await {
                Ok(Some(elapsed)) => {
                    debug!("Refresh completed in {:?}", elapsed);
                }
                Ok(None) => {
                    debug!("Refresh loop cancelled during refresh, value discarded");
                    break;
                }
                Err(err) if err.is_panic() => {
                    slot.record_failure();
                    error!("Producer panicked during refresh: {}", err);
                }
                Err(err) => {
                    debug!("Refresh call cancelled: {}", err);
                    break;
                }
            }
        }

        info!("Refresh task stopped");
    })
}
