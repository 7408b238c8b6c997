//! Configuration Module
//!
//! Handles loading the refresh settings from environment variables.

use std::env;
use std::time::Duration;

/// Refresh configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interval in milliseconds between background refreshes
    pub refresh_interval_ms: u64,
    /// Interval in milliseconds between value reports in the demo binary
    pub report_interval_ms: u64,
    /// Simulated latency in milliseconds of the demo producer
    pub producer_delay_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REFRESH_INTERVAL_MS` - Refresh period (default: 1000)
    /// - `REPORT_INTERVAL_MS` - Report period of the demo (default: 2500)
    /// - `PRODUCER_DELAY_MS` - Demo producer latency (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            refresh_interval_ms: env_u64("REFRESH_INTERVAL_MS")
                .unwrap_or(defaults.refresh_interval_ms),
            report_interval_ms: env_u64("REPORT_INTERVAL_MS")
                .unwrap_or(defaults.report_interval_ms),
            producer_delay_ms: env_u64("PRODUCER_DELAY_MS").unwrap_or(defaults.producer_delay_ms),
        }
    }

    /// Refresh period as a `Duration`.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    pub fn producer_delay(&self) -> Duration {
        Duration::from_millis(self.producer_delay_ms)
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1000,
            report_interval_ms: 2500,
            producer_delay_ms: 100,
        }
    }
}
