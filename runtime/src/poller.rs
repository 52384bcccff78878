//! Recurring refresh while any payment is unsettled.
//!
//! Payment settlement is asynchronous and backend-driven; the client cannot
//! be pushed to, so it polls. The poller runs only while the synchronizer's
//! pending-payment predicate is true: when nothing is pending it parks with
//! no timer scheduled, bounding wasted traffic.

use crate::synchronizer::Synchronizer;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Configuration for the polling loop.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Fixed interval between polls. Default 30 seconds.
    pub interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

impl PollingConfig {
    /// Config with a custom interval.
    #[must_use]
    pub const fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }
}

/// Scheduled polling task with an explicit lifecycle.
///
/// `start()` spawns the loop, `stop()` aborts it; dropping the task also
/// stops it, so a view going away cannot leave a timer firing into
/// discarded state.
///
/// # Example
///
/// ```no_run
/// use bookline_runtime::{PollingConfig, PollingTask, Synchronizer};
///
/// # fn example(sync: Synchronizer) {
/// let mut poller = PollingTask::start(sync, PollingConfig::default());
/// // ... view lives ...
/// poller.stop();
/// # }
/// ```
#[derive(Debug)]
pub struct PollingTask {
    handle: Option<JoinHandle<()>>,
}

impl PollingTask {
    /// Spawn the polling loop on the current tokio runtime.
    #[must_use]
    pub fn start(sync: Synchronizer, config: PollingConfig) -> Self {
        let handle = tokio::spawn(run_loop(sync, config));
        Self {
            handle: Some(handle),
        }
    }

    /// Stop polling. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether the loop is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PollingTask {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop(sync: Synchronizer, config: PollingConfig) {
    let mut pending = sync.pending_payments_watch();

    loop {
        // Park while nothing is pending: no timer scheduled at all.
        if !*pending.borrow_and_update() {
            if pending.changed().await.is_err() {
                // Synchronizer gone.
                return;
            }
            continue;
        }

        tokio::time::sleep(config.interval).await;

        // The predicate may have flipped false while we slept (a manual or
        // focus refresh observed settlement first).
        if !*pending.borrow_and_update() {
            continue;
        }

        // Poll-tick failures are logged, never surfaced: transient network
        // blips must not interrupt the user every interval.
        if let Err(err) = sync.fetch_all(true).await {
            tracing::warn!(error = %err, "poll tick failed");
        }
    }
}
