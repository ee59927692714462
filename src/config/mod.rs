//! Configuration module for Sumi-Spider
//!
//! Settings reach a `Spider` through `SpiderBuilder`, either directly in
//! code or from a TOML file loaded with `load_config`.
//!
//! # Example
//!
//! ```no_run
//! use sumi_spider::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("spider.toml")).unwrap();
//! println!("Following: {:?}", config.crawl.follow);
//! ```

mod builder;
mod parser;
mod types;
mod validation;

pub use builder::{
    build_export, pattern_filter, SpiderBuilder, DEFAULT_CONCURRENCY, DEFAULT_MAX_REDIRECTS,
    DEFAULT_PAGE_LIMIT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RESULT_LIMIT, DEFAULT_TIME_LIMIT,
};
pub use types::{
    CrawlConfig, CrawlSection, ExportSection, FileConfig, FilterFn, FilterSection, LimitsSection,
    LoggingSection,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash};

pub use crate::logging::LogTarget;
