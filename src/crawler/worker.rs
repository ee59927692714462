//! Page worker: the full cycle for one claimed address
//!
//! This module handles:
//! - Re-checking the budgets before any network activity, and handing the
//!   address back to the queue when they have run out
//! - Fetching, extracting, sanitizing and filtering matches
//! - Charging the page budget, including for failed fetches, before any
//!   discovered link is queued
//! - Resolving, validating and queueing discovered links
//! - Exporting accepted matches and charging the result budget

use crate::config::CrawlConfig;
use crate::crawler::parser::extract_page;
use crate::crawler::sanitize::sanitize;
use crate::crawler::scheduler::Visit;
use crate::crawler::{fetch_page, PushOutcome};
use crate::export::Match;
use crate::state::CrawlState;
use crate::url::resolve;
use crate::{Result, SpiderError};
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;

/// Accepted matches and raw link targets from one page
struct ScrapedPage {
    accepted: Vec<Match>,
    hrefs: Vec<String>,
}

/// Processes claimed addresses against shared crawl state
pub struct PageWorker {
    config: Arc<CrawlConfig>,
    client: Client,
    state: Arc<CrawlState>,
}

impl PageWorker {
    pub fn new(config: Arc<CrawlConfig>, client: Client, state: Arc<CrawlState>) -> Self {
        Self {
            config,
            client,
            state,
        }
    }

    /// Visits one address, logging rather than returning any failure
    pub async fn process(&self, address: String) {
        if self.state.budgets_exhausted() {
            tracing::debug!("budget exhausted, returning {} to the queue", address);
            self.state.release(&address);
            return;
        }

        tracing::info!("focus: {}", address);
        let scraped = self.scrape(&address).await;

        // Charged before any discovered link becomes claimable
        self.state.finish_page();

        let page = match scraped {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("{}: {}", address, e);
                return;
            }
        };
        for href in &page.hrefs {
            self.enqueue(&address, href);
        }
        if let Err(e) = self.export(&address, &page.accepted).await {
            tracing::error!("{}: {}", address, e);
        }
    }

    async fn scrape(&self, address: &str) -> Result<ScrapedPage> {
        let page = fetch_page(&self.client, address).await?;
        if !(200..300).contains(&page.status_code) {
            tracing::warn!("{} responded with HTTP {}", address, page.status_code);
        }
        if page.final_url != address {
            tracing::debug!("{} redirected to {}", address, page.final_url);
        }

        // Parsed synchronously so the document never lives across an await
        let extracted = extract_page(
            &page.body,
            &self.config.content_selectors,
            self.config.link_selector.as_ref(),
        );
        if extracted.missing_hrefs > 0 {
            tracing::debug!(
                "{} matched link elements without href on {}",
                extracted.missing_hrefs,
                address
            );
        }

        let mut accepted = Vec::new();
        for raw in extracted.matches {
            tracing::info!("found match for {}", raw.selector);
            let text = sanitize(&raw.text);
            if (self.config.filter)(&text) {
                self.state.take_result();
                accepted.push(Match::new(address, raw.selector, text));
            } else {
                tracing::info!("filtered match for {}", raw.selector);
            }
        }

        Ok(ScrapedPage {
            accepted,
            hrefs: extracted.hrefs,
        })
    }

    async fn export(&self, address: &str, accepted: &[Match]) -> Result<()> {
        let outcomes = join_all(accepted.iter().map(|record| self.config.export.export(record))).await;
        let mut failures = outcomes.into_iter().filter_map(|outcome| outcome.err());
        match failures.next() {
            None => Ok(()),
            Some(first) => {
                let lost = 1 + failures.count();
                if lost > 1 {
                    tracing::error!("{} matches from {} were not exported", lost, address);
                }
                Err(SpiderError::Export(first))
            }
        }
    }

    fn enqueue(&self, address: &str, href: &str) {
        let link = match resolve(address, href) {
            Ok(link) => link,
            Err(e) => {
                tracing::info!("rejected link {}: {}", href, e);
                return;
            }
        };

        match self.state.push(&link) {
            PushOutcome::Queued => tracing::info!("new url: {}", link),
            PushOutcome::Invalid => tracing::info!("rejected link: {}", link),
            PushOutcome::AlreadySeen | PushOutcome::AlreadyPending => {
                tracing::debug!("already known: {}", link)
            }
        }
    }
}

impl Visit for PageWorker {
    async fn visit(&self, address: String) {
        self.process(address).await
    }
}
