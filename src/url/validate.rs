use regex::Regex;
use std::sync::LazyLock;

// Absolute http(s) address: host with a 1-6 character TLD-like suffix, then
// only characters from the unreserved/reserved URI set.
static CRAWL_TARGET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b[-a-zA-Z0-9()@:%_+.~#?&/=]*$",
    )
    .expect("crawl target regex is valid")
});

/// Checks whether an address is something the crawler may enqueue
///
/// Only absolute `http://` and `https://` addresses with a plausible host
/// pass. This deliberately rejects `mailto:`, `javascript:`, `tel:`, data
/// URIs and anything containing characters outside the URI character set.
///
/// # Examples
///
/// ```
/// use sumi_spider::url::is_valid_crawl_target;
///
/// assert!(is_valid_crawl_target("https://example.com/jobs?page=2"));
/// assert!(!is_valid_crawl_target("mailto:a@b.com"));
/// ```
pub fn is_valid_crawl_target(address: &str) -> bool {
    CRAWL_TARGET_REGEX.is_match(address)
}
