//! Bounded worker pool driving a crawl run
//!
//! This module handles:
//! - Asking the termination policy before every dispatch
//! - Global concurrency limiting via a semaphore
//! - Dispatching a replacement worker as soon as any slot frees
//! - Never dispatching more workers than there are pages left in the budget
//! - Draining in-flight workers once the run is finished

use crate::crawler::termination::{StopReason, TerminationPolicy};
use crate::crawler::Claim;
use crate::state::CrawlState;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::instrument::WithSubscriber;

/// Processes one claimed address
///
/// Implemented by the page worker; tests substitute their own.
pub trait Visit: Send + Sync + 'static {
    fn visit(&self, address: String) -> impl Future<Output = ()> + Send;
}

/// Scheduler dispatches claimed addresses onto a bounded pool of tasks
pub struct Scheduler {
    /// Global semaphore for limiting in-flight workers
    permits: Arc<Semaphore>,

    policy: TerminationPolicy,
}

impl Scheduler {
    /// Creates a scheduler allowing `concurrency` workers in flight
    pub fn new(concurrency: usize, policy: TerminationPolicy) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            policy,
        }
    }

    /// Runs until the termination policy reports a stop reason
    ///
    /// Resolves only after every dispatched worker has completed.
    pub async fn run<V: Visit>(&self, state: Arc<CrawlState>, visitor: Arc<V>) -> StopReason {
        let mut tasks = JoinSet::new();

        let reason = loop {
            while let Some(outcome) = tasks.try_join_next() {
                log_task_outcome(outcome);
            }

            if let Some(reason) = self.policy.check(&state).await {
                break reason;
            }

            let permit = match Arc::clone(&self.permits).try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    // Every slot is busy, wait for the first worker to finish
                    if let Some(outcome) = tasks.join_next().await {
                        log_task_outcome(outcome);
                    }
                    continue;
                }
            };

            // A worker may have charged a budget since the policy check
            if state.budgets_exhausted() {
                continue;
            }
            if state.pages_reserved() {
                // Remaining pages all belong to workers in flight; claiming
                // now would consume an address the budget cannot cover
                drop(permit);
                match tasks.join_next().await {
                    Some(outcome) => log_task_outcome(outcome),
                    None => tokio::task::yield_now().await,
                }
                continue;
            }

            match state.claim() {
                Claim::Fresh(address) => {
                    let guard = state.begin_work();
                    let visitor = Arc::clone(&visitor);
                    tasks.spawn(
                        async move {
                            visitor.visit(address).await;
                            drop(guard);
                            drop(permit);
                        }
                        .with_current_subscriber(),
                    );
                }
                Claim::AlreadySeen(address) => {
                    tracing::info!("skipping: {} (already visited)", address);
                }
                Claim::Empty => tokio::task::yield_now().await,
            }
        };

        if !tasks.is_empty() {
            tracing::debug!("waiting for {} in-flight workers", tasks.len());
        }
        while let Some(outcome) = tasks.join_next().await {
            log_task_outcome(outcome);
        }

        reason
    }
}

fn log_task_outcome(outcome: Result<(), JoinError>) {
    if let Err(e) = outcome {
        tracing::error!("worker task failed: {}", e);
    }
}
