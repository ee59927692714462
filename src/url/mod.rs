//! URL handling module for Sumi-Spider
//!
//! This module resolves discovered hrefs against the page they were found on
//! and decides whether the result is something the crawler should visit.

mod resolve;
mod validate;

pub use resolve::resolve;
pub use validate::is_valid_crawl_target;
