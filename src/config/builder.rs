//! Fluent construction of a `Spider`
//!
//! Every setting has a default, so only the seed is required:
//!
//! ```no_run
//! # async fn demo() -> sumi_spider::Result<()> {
//! use sumi_spider::SpiderBuilder;
//!
//! let spider = SpiderBuilder::new("https://example.com/jobs")
//!     .content_selector(".job-title")
//!     .link_selector("a.next")
//!     .page_limit(5)
//!     .build()?;
//! let report = spider.run().await?;
//! println!("{} matches", report.matches_exported);
//! # Ok(())
//! # }
//! ```

use crate::config::types::{CrawlConfig, ExportSection, FileConfig, FilterFn};
use crate::config::validation::{validate_limits, validate_seed};
use crate::crawler::{
    CompiledSelector, Spider, DEFAULT_SETTLE_POLL_INTERVAL, DEFAULT_SETTLE_TIMEOUT,
    DEFAULT_USER_AGENT,
};
use crate::export::{CombinedSink, ConsoleSink, ExportResult, ExportSink, FileSink, SqliteSink};
use crate::logging::LogTarget;
use crate::{ConfigError, ConfigResult, Result};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

pub const DEFAULT_RESULT_LIMIT: u64 = 100;
pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_REDIRECTS: usize = 3;

/// Collects crawl settings and validates them on `build`
pub struct SpiderBuilder {
    seed: String,
    content_selectors: Vec<String>,
    link_selectors: Vec<String>,
    result_limit: u64,
    page_limit: u64,
    concurrency: usize,
    time_limit: Duration,
    request_timeout: Duration,
    max_redirects: usize,
    user_agent: String,
    info_log: Option<LogTarget>,
    error_log: Option<LogTarget>,
    log_level: LevelFilter,
    export: Option<Arc<dyn ExportSink>>,
    filter: Option<FilterFn>,
    settle_timeout: Duration,
    settle_poll_interval: Duration,
}

impl SpiderBuilder {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            content_selectors: Vec::new(),
            link_selectors: Vec::new(),
            result_limit: DEFAULT_RESULT_LIMIT,
            page_limit: DEFAULT_PAGE_LIMIT,
            concurrency: DEFAULT_CONCURRENCY,
            time_limit: DEFAULT_TIME_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            info_log: None,
            error_log: None,
            log_level: LevelFilter::INFO,
            export: None,
            filter: None,
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
            settle_poll_interval: DEFAULT_SETTLE_POLL_INTERVAL,
        }
    }

    /// Appends a selector whose element text is exported
    pub fn content_selector(mut self, selector: impl Into<String>) -> Self {
        self.content_selectors.push(selector.into());
        self
    }

    /// Appends a selector for anchors to follow
    pub fn link_selector(mut self, selector: impl Into<String>) -> Self {
        self.link_selectors.push(selector.into());
        self
    }

    pub fn result_limit(mut self, limit: u64) -> Self {
        self.result_limit = limit;
        self
    }

    pub fn page_limit(mut self, limit: u64) -> Self {
        self.page_limit = limit;
        self
    }

    pub fn concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers;
        self
    }

    pub fn time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn max_redirects(mut self, redirects: usize) -> Self {
        self.max_redirects = redirects;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn info_log(mut self, target: LogTarget) -> Self {
        self.info_log = Some(target);
        self
    }

    pub fn error_log(mut self, target: LogTarget) -> Self {
        self.error_log = Some(target);
        self
    }

    /// Most verbose level written to the info log
    pub fn log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    pub fn export(mut self, sink: impl ExportSink + 'static) -> Self {
        let sink: Arc<dyn ExportSink> = Arc::new(sink);
        self.export = Some(sink);
        self
    }

    /// Sets the predicate a sanitized match must satisfy to be exported
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let filter: FilterFn = Arc::new(filter);
        self.filter = Some(filter);
        self
    }

    pub fn settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    pub fn settle_poll_interval(mut self, interval: Duration) -> Self {
        self.settle_poll_interval = interval;
        self
    }

    /// Creates a builder from a parsed configuration file
    ///
    /// Opens the configured export sinks, so file sinks are created here.
    pub async fn from_file(config: FileConfig) -> Result<Self> {
        let seed = config.crawl.seed.ok_or(ConfigError::MissingSeed)?;
        let mut builder = Self::new(seed);

        for selector in config.crawl.selectors {
            builder = builder.content_selector(selector);
        }
        for selector in config.crawl.follow {
            builder = builder.link_selector(selector);
        }
        if let Some(user_agent) = config.crawl.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let limits = config.limits;
        if let Some(results) = limits.results {
            builder = builder.result_limit(results);
        }
        if let Some(pages) = limits.pages {
            builder = builder.page_limit(pages);
        }
        if let Some(concurrency) = limits.concurrency {
            builder = builder.concurrency(concurrency);
        }
        if let Some(secs) = limits.time_limit {
            builder = builder.time_limit(Duration::from_secs(secs));
        }
        if let Some(secs) = limits.request_timeout {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(redirects) = limits.redirects {
            builder = builder.max_redirects(redirects);
        }
        if let Some(secs) = limits.settle_timeout {
            builder = builder.settle_timeout(Duration::from_secs(secs));
        }

        if let Some(target) = config.logging.info_log {
            builder = builder.info_log(LogTarget::from_setting(&target));
        }
        if let Some(target) = config.logging.error_log {
            builder = builder.error_log(LogTarget::from_setting(&target));
        }

        if let Some(filter) = pattern_filter(
            config.filter.include.as_deref(),
            config.filter.exclude.as_deref(),
        )? {
            builder.filter = Some(filter);
        }

        let sink = build_export(&config.export).await?;
        Ok(builder.export(sink))
    }

    /// Validates the settings and compiles the selectors
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlConfig)` - Settings ready for a `Spider`
    /// * `Err(ConfigError)` - Missing or invalid seed, bad selector, or a
    ///   zero concurrency or poll interval
    pub fn build_config(self) -> ConfigResult<CrawlConfig> {
        validate_seed(&self.seed)?;
        validate_limits(self.concurrency, self.settle_poll_interval)?;
        // Queued in the same form as resolved links, so `https://host` is `https://host/`
        let seed = ::url::Url::parse(&self.seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("seed '{}': {}", self.seed, e)))?;

        let content_selectors = self
            .content_selectors
            .iter()
            .map(|s| CompiledSelector::parse(s))
            .collect::<ConfigResult<Vec<_>>>()?;
        let link_selector = CompiledSelector::parse_joined(&self.link_selectors)?;

        Ok(CrawlConfig {
            seed: seed.into(),
            content_selectors,
            link_selector,
            export: self.export.unwrap_or_else(console_export),
            filter: self.filter.unwrap_or_else(accept_all),
            result_limit: budget(self.result_limit),
            page_limit: budget(self.page_limit),
            concurrency: self.concurrency,
            time_limit: self.time_limit,
            request_timeout: self.request_timeout,
            max_redirects: self.max_redirects,
            user_agent: self.user_agent,
            info_log: self.info_log.unwrap_or_else(LogTarget::default_info),
            error_log: self.error_log.unwrap_or_else(LogTarget::default_error),
            log_level: self.log_level,
            settle_timeout: self.settle_timeout,
            settle_poll_interval: self.settle_poll_interval,
        })
    }

    /// Validates the settings and creates the `Spider`
    pub fn build(self) -> Result<Spider> {
        Spider::new(self.build_config()?)
    }
}

/// Combines the sinks named in an `[export]` section
pub async fn build_export(section: &ExportSection) -> ExportResult<CombinedSink> {
    let mut sink = CombinedSink::new();
    if section.console {
        sink = sink.with(ConsoleSink::stdout());
    }
    if let Some(path) = &section.csv {
        sink = sink.with(FileSink::create(Some(path.as_path())).await?);
    }
    if let Some(path) = &section.sqlite {
        sink = sink.with(SqliteSink::new(path, section.sqlite_fresh));
    }
    Ok(sink)
}

fn console_export() -> Arc<dyn ExportSink> {
    Arc::new(ConsoleSink::stdout())
}

fn accept_all() -> FilterFn {
    Arc::new(|_: &str| true)
}

fn budget(limit: u64) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Compiles include/exclude patterns into a match filter
///
/// A match passes when it contains `include` (if given) and does not
/// contain `exclude` (if given). Returns `None` when neither is set.
pub fn pattern_filter(
    include: Option<&str>,
    exclude: Option<&str>,
) -> ConfigResult<Option<FilterFn>> {
    let include = include.map(Regex::new).transpose()?;
    let exclude = exclude.map(Regex::new).transpose()?;
    if include.is_none() && exclude.is_none() {
        return Ok(None);
    }

    let filter: FilterFn = Arc::new(move |text: &str| {
        include.as_ref().map_or(true, |re| re.is_match(text))
            && !exclude.as_ref().map_or(false, |re| re.is_match(text))
    });
    Ok(Some(filter))
}
