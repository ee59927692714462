use crate::crawler::{Claim, Frontier, PushOutcome};
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Shared mutable state for one crawl run
///
/// Budgets are signed so that a page with many matches may push the result
/// budget below zero without wrapping; the termination check treats any
/// value `<= 0` as exhausted.
#[derive(Debug)]
pub struct CrawlState {
    frontier: Mutex<Frontier>,
    results_remaining: AtomicI64,
    pages_remaining: AtomicI64,
    in_flight: AtomicUsize,
    pages_visited: AtomicU64,
    matches_exported: AtomicU64,
    started: Instant,
    time_limit: Duration,
    changed: Notify,
}

impl CrawlState {
    pub fn new(result_limit: i64, page_limit: i64, time_limit: Duration) -> Self {
        Self {
            frontier: Mutex::new(Frontier::new()),
            results_remaining: AtomicI64::new(result_limit),
            pages_remaining: AtomicI64::new(page_limit),
            in_flight: AtomicUsize::new(0),
            pages_visited: AtomicU64::new(0),
            matches_exported: AtomicU64::new(0),
            started: Instant::now(),
            time_limit,
            changed: Notify::new(),
        }
    }

    // A worker that panicked mid-push leaves the frontier consistent, so a
    // poisoned lock is recovered rather than propagated.
    fn frontier(&self) -> MutexGuard<'_, Frontier> {
        self.frontier.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues an address and wakes the settling wait when it was accepted
    pub fn push(&self, address: &str) -> PushOutcome {
        let outcome = self.frontier().push(address);
        if outcome == PushOutcome::Queued {
            self.changed.notify_waiters();
        }
        outcome
    }

    /// Pops the next address and marks it seen under one lock
    pub fn claim(&self) -> Claim {
        self.frontier().claim()
    }

    /// Puts back an address whose worker aborted before fetching
    pub fn release(&self, address: &str) {
        if self.frontier().release(address) == PushOutcome::Queued {
            self.changed.notify_waiters();
        }
    }

    /// True when every remaining page is already spoken for by a worker
    /// in flight, so a further dispatch could overrun the page budget
    pub fn pages_reserved(&self) -> bool {
        self.pages_remaining() <= self.in_flight() as i64
    }

    pub fn is_queue_empty(&self) -> bool {
        self.frontier().is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.frontier().pending_len()
    }

    pub fn seen_len(&self) -> usize {
        self.frontier().seen_len()
    }

    pub fn is_seen(&self, address: &str) -> bool {
        self.frontier().is_seen(address)
    }

    /// Forgets visited addresses once a run has finished
    pub fn clear_seen(&self) {
        self.frontier().clear_seen();
    }

    pub fn results_remaining(&self) -> i64 {
        self.results_remaining.load(Ordering::SeqCst)
    }

    pub fn pages_remaining(&self) -> i64 {
        self.pages_remaining.load(Ordering::SeqCst)
    }

    /// Charges one accepted match against the result budget
    pub fn take_result(&self) {
        self.results_remaining.fetch_sub(1, Ordering::SeqCst);
        self.matches_exported.fetch_add(1, Ordering::SeqCst);
    }

    /// Charges one finished page, successful or not, against the page budget
    pub fn finish_page(&self) {
        self.pages_remaining.fetch_sub(1, Ordering::SeqCst);
        self.pages_visited.fetch_add(1, Ordering::SeqCst);
        self.changed.notify_waiters();
    }

    pub fn pages_visited(&self) -> u64 {
        self.pages_visited.load(Ordering::SeqCst)
    }

    pub fn matches_exported(&self) -> u64 {
        self.matches_exported.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn time_exhausted(&self) -> bool {
        self.elapsed() >= self.time_limit
    }

    /// True once any budget (results, pages or time) has run out
    pub fn budgets_exhausted(&self) -> bool {
        self.results_remaining() <= 0 || self.pages_remaining() <= 0 || self.time_exhausted()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Registers a dispatched worker; the count drops when the guard does
    pub fn begin_work(self: &Arc<Self>) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            state: Arc::clone(self),
        }
    }

    /// Resolves on the next queue push, finished page or finished worker
    pub fn changed(&self) -> Notified<'_> {
        self.changed.notified()
    }
}

/// Keeps a worker counted as in flight until dropped
#[derive(Debug)]
pub struct InFlightGuard {
    state: Arc<CrawlState>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.state.changed.notify_waiters();
    }
}
