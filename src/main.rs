//! Refresh Cache - demo host
//!
//! Runs a refreshing cache over a simulated slow upstream call and reports
//! the cached value until interrupted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refresh_cache::{Config, RefreshingCache};

/// Value produced by the simulated upstream call.
#[derive(Debug, Clone, Serialize)]
struct Snapshot {
    sequence: u64,
    produced_at: DateTime<Utc>,
}

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create and start the refreshing cache
/// 4. Report the cached value periodically
/// 5. Stop the cache on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refresh_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: refresh_interval={}ms, report_interval={}ms, producer_delay={}ms",
        config.refresh_interval_ms, config.report_interval_ms, config.producer_delay_ms
    );

    let sequence = Arc::new(AtomicU64::new(0));
    let delay = config.producer_delay();
    let cache = RefreshingCache::new(config.refresh_interval(), move || {
        // Stand-in for an expensive upstream call
        std::thread::sleep(delay);
        Snapshot {
            sequence: sequence.fetch_add(1, Ordering::SeqCst) + 1,
            produced_at: Utc::now(),
        }
    });

    cache.start()?;

    let mut report = tokio::time::interval(config.report_interval());
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = report.tick() => {
                if let Some(snapshot) = cache.fetch() {
                    info!("Cached value: {}", serde_json::to_string(&snapshot)?);
                }
                let stats = cache.stats();
                info!(
                    "Refresh stats: {} (age={}ms)",
                    serde_json::to_string(&stats)?,
                    stats.age().map_or(-1, |age| age.num_milliseconds())
                );
            }
        }
    }

    cache.stop_and_wait().await?;
    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
