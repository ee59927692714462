//! Text cleanup applied to every extracted fragment

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace regex is valid"));

/// Cleans raw element text before it is filtered and exported
///
/// Every run of two or more whitespace characters (spaces, tabs, newlines)
/// collapses into a single space, and the result is trimmed. A lone newline
/// between two words is kept as-is.
///
/// The function is idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
///
/// # Examples
///
/// ```
/// use sumi_spider::crawler::sanitize;
///
/// assert_eq!(sanitize("  Hello   World\n\n"), "Hello World");
/// ```
pub fn sanitize(raw: &str) -> String {
    WHITESPACE_RUN_REGEX.replace_all(raw, " ").trim().to_string()
}
