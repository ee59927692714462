use crate::crawler::CompiledSelector;
use crate::export::ExportSink;
use crate::logging::LogTarget;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

/// Predicate deciding whether a sanitized match is exported
pub type FilterFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Fully resolved settings for one `Spider`
///
/// Built by `SpiderBuilder`; selectors are already compiled and the seed
/// already validated.
#[derive(Clone)]
pub struct CrawlConfig {
    /// Starting address
    pub seed: String,

    /// Content selectors, evaluated in this order on every page
    pub content_selectors: Vec<CompiledSelector>,

    /// All link selectors joined into one query
    pub link_selector: Option<CompiledSelector>,

    pub export: Arc<dyn ExportSink>,
    pub filter: FilterFn,

    pub result_limit: i64,
    pub page_limit: i64,
    pub concurrency: usize,
    pub time_limit: Duration,

    /// Per-request timeout
    pub request_timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,

    pub info_log: LogTarget,
    pub error_log: LogTarget,
    pub log_level: LevelFilter,

    /// Ceiling on the wait for in-flight workers when the queue is empty
    pub settle_timeout: Duration,
    pub settle_poll_interval: Duration,
}

impl fmt::Debug for CrawlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let selectors: Vec<&str> = self.content_selectors.iter().map(|s| s.as_str()).collect();
        f.debug_struct("CrawlConfig")
            .field("seed", &self.seed)
            .field("content_selectors", &selectors)
            .field("link_selector", &self.link_selector.as_ref().map(|s| s.as_str()))
            .field("result_limit", &self.result_limit)
            .field("page_limit", &self.page_limit)
            .field("concurrency", &self.concurrency)
            .field("time_limit", &self.time_limit)
            .field("request_timeout", &self.request_timeout)
            .field("max_redirects", &self.max_redirects)
            .field("user_agent", &self.user_agent)
            .field("info_log", &self.info_log)
            .field("error_log", &self.error_log)
            .field("log_level", &self.log_level)
            .field("settle_timeout", &self.settle_timeout)
            .field("settle_poll_interval", &self.settle_poll_interval)
            .finish_non_exhaustive()
    }
}

/// Configuration file layout for Sumi-Spider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub crawl: CrawlSection,
    pub limits: LimitsSection,
    pub logging: LoggingSection,
    pub export: ExportSection,
    pub filter: FilterSection,
}

/// What to crawl and what to extract
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrawlSection {
    /// Starting address
    pub seed: Option<String>,

    /// CSS selectors whose element text is exported
    pub selectors: Vec<String>,

    /// CSS selectors for anchors to follow
    pub follow: Vec<String>,

    #[serde(rename = "user-agent")]
    pub user_agent: Option<String>,
}

/// Crawl budgets, all optional with builder defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LimitsSection {
    /// Maximum number of exported matches
    pub results: Option<u64>,

    /// Maximum number of pages visited
    pub pages: Option<u64>,

    /// Maximum number of workers in flight
    pub concurrency: Option<usize>,

    /// Wall-clock limit for the whole run (seconds)
    #[serde(rename = "time-limit")]
    pub time_limit: Option<u64>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: Option<u64>,

    /// Maximum redirects followed per request
    pub redirects: Option<usize>,

    /// Ceiling on the settling wait (seconds)
    #[serde(rename = "settle-timeout")]
    pub settle_timeout: Option<u64>,
}

/// Log destinations; "-" or "console" writes to the terminal
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    #[serde(rename = "info-log")]
    pub info_log: Option<String>,

    #[serde(rename = "error-log")]
    pub error_log: Option<String>,
}

/// Export sinks to combine
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Print matches to stdout
    pub console: bool,

    /// CSV results file
    pub csv: Option<PathBuf>,

    /// SQLite results database
    pub sqlite: Option<PathBuf>,

    /// Drop and recreate the results table before the run
    #[serde(rename = "sqlite-fresh")]
    pub sqlite_fresh: bool,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            console: true,
            csv: None,
            sqlite: None,
            sqlite_fresh: false,
        }
    }
}

/// Regular expressions applied to sanitized match text
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    /// Keep only matches containing this pattern
    pub include: Option<String>,

    /// Drop matches containing this pattern
    pub exclude: Option<String>,
}
