//! Periodic sweep of expired cache entries

use crate::registry::CacheRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a running cleanup job. Dropping it leaves the job running.
#[derive(Debug)]
pub struct CleanupJobHandle {
    handle: JoinHandle<()>,
    interval: Duration,
}

impl CleanupJobHandle {
    /// Stop the job; a pass in progress is abandoned at its next await point
    pub fn cancel(&self) {
        self.handle.abort();
        tracing::info!("cache cleanup job cancelled");
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Spawn a task that sweeps every registered cache once right away and then
/// once per `interval`. Ticks missed while a pass is running are skipped.
pub fn setup_cache_cleanup_job(registry: Arc<CacheRegistry>, interval: Duration) -> CleanupJobHandle {
    // tokio rejects a zero period
    let interval = interval.max(Duration::from_millis(1));
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // The first tick completes immediately
            ticker.tick().await;
            registry.run_cleanup_pass().await;
        }
    });

    tracing::info!(interval_secs = interval.as_secs(), "cache cleanup job started");
    CleanupJobHandle { handle, interval }
}
