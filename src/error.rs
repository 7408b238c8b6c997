//! Error types for the refreshing cache
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use thiserror::Error;

// == Refresh Error Enum ==
/// Lifecycle errors reported by the refreshing cache.
///
/// Producer failures are not represented here: a fallible producer returns a
/// `Result` as its value and callers see it through `fetch`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// A refresh loop is already active for this cache
    #[error("Refresh loop is already running")]
    AlreadyRunning,

    /// No refresh loop is active for this cache
    #[error("Refresh loop is not running")]
    NotRunning,

    /// Interval is shorter than the allowed minimum
    #[error("Invalid refresh interval: {0:?}")]
    InvalidInterval(Duration),

    /// The loop must be spawned from within a tokio runtime
    #[error("No tokio runtime available to spawn the refresh loop")]
    NoRuntime,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Result Type Alias ==
/// Convenience Result type for the refreshing cache.
pub type Result<T> = std::result::Result<T, RefreshError>;
