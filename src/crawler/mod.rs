//! Crawler module - fetch, extract, follow
//!
//! This module contains the crawl engine:
//! - The frontier of pending and seen addresses
//! - HTTP fetching with a shared client
//! - Selector-driven extraction and text sanitizing
//! - The page worker, scheduler and termination policy
//! - The `Spider` that ties a run together

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod sanitize;
mod scheduler;
mod termination;
mod worker;

pub use coordinator::{CrawlReport, Spider};
pub use fetcher::{
    build_http_client, fetch_page, FetchSettings, FetchedPage, DEFAULT_USER_AGENT,
};
pub use frontier::{Claim, Frontier, PushOutcome};
pub use parser::{extract_page, CompiledSelector, ExtractedPage, RawMatch};
pub use sanitize::sanitize;
pub use scheduler::{Scheduler, Visit};
pub use termination::{
    StopReason, TerminationPolicy, DEFAULT_SETTLE_POLL_INTERVAL, DEFAULT_SETTLE_TIMEOUT,
};
pub use worker::PageWorker;
