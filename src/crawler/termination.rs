//! Stop conditions for a crawl run
//!
//! Before each dispatch the scheduler asks the policy whether the run is
//! over. When the queue is empty but workers are still in flight, the
//! policy first waits for them to settle: a worker may yet discover new
//! links, so an empty queue alone does not end the crawl until in-flight
//! work finishes or the settling ceiling expires.

use crate::state::CrawlState;
use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Default ceiling on the settling wait
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval between settle checks
pub const DEFAULT_SETTLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Why a crawl run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No pending addresses and no worker left to discover more
    QueueEmpty,
    /// The page budget reached zero
    PageLimit,
    /// The result budget reached zero
    ResultLimit,
    /// The run exceeded its wall-clock limit
    TimeLimit,
    /// In-flight workers did not settle within the ceiling
    SettleTimeout,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::QueueEmpty => "queue is empty",
            StopReason::PageLimit | StopReason::ResultLimit => "scrape limit reached",
            StopReason::TimeLimit => "time limit reached",
            StopReason::SettleTimeout => "settling wait expired",
        };
        f.write_str(text)
    }
}

/// Decides when a run is finished
#[derive(Debug, Clone, Copy)]
pub struct TerminationPolicy {
    settle_timeout: Duration,
    poll_interval: Duration,
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_TIMEOUT, DEFAULT_SETTLE_POLL_INTERVAL)
    }
}

impl TerminationPolicy {
    pub fn new(settle_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            settle_timeout,
            poll_interval,
        }
    }

    /// Checks whether the run should stop
    ///
    /// An expired settling ceiling ends the run outright. Otherwise the
    /// conditions are evaluated in a fixed order: empty queue, page budget,
    /// result budget, time limit. The first that holds is logged and
    /// returned.
    ///
    /// # Returns
    ///
    /// * `Some(reason)` - The run is finished
    /// * `None` - Keep dispatching
    pub async fn check(&self, state: &CrawlState) -> Option<StopReason> {
        let settle_expired = self.settle(state).await;

        let reason = if settle_expired {
            StopReason::SettleTimeout
        } else if state.is_queue_empty() {
            StopReason::QueueEmpty
        } else if state.pages_remaining() <= 0 {
            StopReason::PageLimit
        } else if state.results_remaining() <= 0 {
            StopReason::ResultLimit
        } else if state.time_exhausted() {
            StopReason::TimeLimit
        } else {
            return None;
        };

        tracing::info!("{}, stopping", reason);
        Some(reason)
    }

    /// Waits while the queue is empty and workers are in flight
    ///
    /// Returns true if the ceiling expired before the workers settled.
    async fn settle(&self, state: &CrawlState) -> bool {
        let started = Instant::now();
        loop {
            let changed = state.changed();
            if !state.is_queue_empty() || state.in_flight() == 0 {
                return false;
            }

            let waited = started.elapsed();
            if waited >= self.settle_timeout {
                tracing::debug!(
                    "{} workers still in flight after {:?}",
                    state.in_flight(),
                    waited
                );
                return true;
            }

            let pause = self.poll_interval.min(self.settle_timeout - waited);
            tokio::select! {
                _ = sleep(pause) => {}
                _ = changed => {}
            }
        }
    }
}
