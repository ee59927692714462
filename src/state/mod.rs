//! Per-run crawl state
//!
//! A `CrawlState` is created fresh for every run and shared between the
//! scheduler and its workers. It owns:
//!
//! - The frontier (pending queue plus the seen set)
//! - The remaining result and page budgets
//! - The in-flight worker count used by the settling wait
//! - Counters that end up in the final `CrawlReport`

mod crawl_state;

pub use crawl_state::{CrawlState, InFlightGuard};
