//! Crawl coordinator - one `Spider`, any number of runs
//!
//! This module contains the run lifecycle:
//! - Opening the run's info and error logs
//! - Seeding fresh per-run state
//! - Driving the scheduler to a stop reason
//! - Flushing the export sink and reporting the outcome
//! - Clearing the seen-set and closing the logs

use crate::config::{CrawlConfig, SpiderBuilder};
use crate::crawler::scheduler::Scheduler;
use crate::crawler::termination::{StopReason, TerminationPolicy};
use crate::crawler::worker::PageWorker;
use crate::crawler::{build_http_client, FetchSettings};
use crate::logging::CrawlLogs;
use crate::state::CrawlState;
use crate::Result;
use chrono::Local;
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument::WithSubscriber;

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub reason: StopReason,
    /// Pages whose visit completed, including failed fetches
    pub pages_visited: u64,
    /// Matches that passed the filter and were handed to the sink
    pub matches_exported: u64,
    /// Distinct addresses dispatched during the run
    pub seen: usize,
    /// Addresses still queued when the run stopped
    pub pending: usize,
    pub elapsed: Duration,
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} pages visited, {} matches exported, {} pending, {:.1}s",
            self.reason,
            self.pages_visited,
            self.matches_exported,
            self.pending,
            self.elapsed.as_secs_f64()
        )
    }
}

/// A configured crawler
///
/// Holds settings and the HTTP client; every call to `run` starts from the
/// seed with fresh budgets and an empty seen-set.
pub struct Spider {
    config: Arc<CrawlConfig>,
    client: Client,
}

impl fmt::Debug for Spider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Spider {
    /// Starts a builder for the given seed address
    pub fn builder(seed: impl Into<String>) -> SpiderBuilder {
        SpiderBuilder::new(seed)
    }

    /// Creates a spider from validated settings
    ///
    /// # Returns
    ///
    /// * `Ok(Spider)` - Ready to run
    /// * `Err(SpiderError)` - The HTTP client could not be built
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let client = build_http_client(&FetchSettings {
            user_agent: config.user_agent.clone(),
            max_redirects: config.max_redirects,
            timeout: config.request_timeout,
        })?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawls from the seed until a budget, the time limit or the queue
    /// runs out
    ///
    /// Resolves once every dispatched worker has finished. Per-page
    /// failures are written to the error log and never end the run; only
    /// failing to open the logs is returned as an error.
    pub async fn run(&self) -> Result<CrawlReport> {
        let logs = CrawlLogs::open(
            &self.config.info_log,
            &self.config.error_log,
            self.config.log_level,
        )?;

        let report = self.crawl().with_subscriber(logs.dispatch()).await;

        logs.close()?;
        Ok(report)
    }

    async fn crawl(&self) -> CrawlReport {
        tracing::info!("start time: {}", Local::now().to_rfc2822());
        tracing::info!("root URL: {}", self.config.seed);

        let state = Arc::new(CrawlState::new(
            self.config.result_limit,
            self.config.page_limit,
            self.config.time_limit,
        ));
        state.push(&self.config.seed);

        let worker = Arc::new(PageWorker::new(
            Arc::clone(&self.config),
            self.client.clone(),
            Arc::clone(&state),
        ));
        let scheduler = Scheduler::new(
            self.config.concurrency,
            TerminationPolicy::new(self.config.settle_timeout, self.config.settle_poll_interval),
        );

        let reason = scheduler.run(Arc::clone(&state), worker).await;

        if let Err(e) = self.config.export.flush().await {
            tracing::error!("failed to flush export: {}", e);
        }

        let report = CrawlReport {
            reason,
            pages_visited: state.pages_visited(),
            matches_exported: state.matches_exported(),
            seen: state.seen_len(),
            pending: state.pending_len(),
            elapsed: state.elapsed(),
        };
        state.clear_seen();

        tracing::info!("finished: {}", report);
        report
    }
}
