//! Refresh Cache - A value cell kept fresh in the background
//!
//! Periodically calls a producer and caches its latest result so readers
//! never pay for the producer themselves.

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{Producer, RefreshStats, RefreshingCache, MIN_INTERVAL};
pub use config::Config;
pub use error::{RefreshError, Result};
pub use tokio_util::sync::CancellationToken;
