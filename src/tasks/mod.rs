//! Background Tasks Module
//!
//! Contains the background task that keeps a cached value fresh.
//!
//! # Tasks
//! - Refresh: Recomputes the cached value at a fixed interval until cancelled

mod refresh;

pub(crate) use refresh::spawn_refresh_task;
