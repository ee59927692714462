use url::Url;

/// Resolves an href attribute against the address of the page it was found on
///
/// Standard base-relative resolution: absolute hrefs are returned as-is
/// (normalized), relative ones are joined onto `base`.
///
/// # Arguments
///
/// * `base` - The absolute address of the page containing the link
/// * `href` - The raw `href` attribute value
///
/// # Returns
///
/// * `Ok(String)` - The absolute address
/// * `Err(url::ParseError)` - `base` is not absolute or `href` cannot be joined
///
/// # Examples
///
/// ```
/// use sumi_spider::url::resolve;
///
/// let resolved = resolve("https://example.com/jobs/list", "../about").unwrap();
/// assert_eq!(resolved, "https://example.com/about");
/// ```
pub fn resolve(base: &str, href: &str) -> Result<String, url::ParseError> {
    let base = Url::parse(base)?;
    let joined = base.join(href.trim())?;
    Ok(joined.to_string())
}
