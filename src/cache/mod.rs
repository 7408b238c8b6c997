//! Cache Module
//!
//! Provides a single value cell that is refreshed in the background.

mod refresher;
pub(crate) mod slot;
mod stats;


use std::time::Duration;

// Re-export public types
pub use refresher::RefreshingCache;
pub use slot::Producer;
pub use stats::RefreshStats;

// == Public Constants ==
/// Shortest refresh interval accepted by a cache
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);
