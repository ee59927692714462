//! Sumi-Spider: a bounded, polite web scraper
//!
//! This crate crawls outward from a seed address, extracts text with CSS
//! selectors, follows declared link selectors, and hands every match to a
//! pluggable export sink, all within budgets on results, pages, time and
//! concurrency.

pub mod config;
pub mod crawler;
pub mod export;
pub mod logging;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Spider operations
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("A seed address is required")]
    MissingSeed,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub use export::ExportError;

/// Result type alias for Sumi-Spider operations
pub type Result<T> = std::result::Result<T, SpiderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{CrawlConfig, SpiderBuilder};
pub use crawler::{CrawlReport, Spider, StopReason};
pub use export::{ExportSink, Match};
pub use url::{is_valid_crawl_target, resolve};
