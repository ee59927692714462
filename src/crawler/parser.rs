//! HTML parser for extracting selector matches and links
//!
//! `scraper::Html` is not `Send`, so a document never lives across an
//! `.await`: the page is parsed, queried and dropped in one synchronous call
//! that hands back owned text and hrefs.

use crate::ConfigError;
use scraper::{Html, Selector};

/// A CSS selector kept alongside its source text
///
/// The source string is what gets exported with each match.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    source: String,
    selector: Selector,
}

impl CompiledSelector {
    /// Compiles a selector string
    ///
    /// # Returns
    ///
    /// * `Ok(CompiledSelector)` - The selector parsed
    /// * `Err(ConfigError::InvalidSelector)` - The string is not a valid CSS selector
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let selector = Selector::parse(source).map_err(|e| ConfigError::InvalidSelector {
            selector: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }

    /// Compiles several selectors joined into one combined query
    ///
    /// Returns `Ok(None)` when `sources` is empty.
    pub fn parse_joined(sources: &[String]) -> Result<Option<Self>, ConfigError> {
        if sources.is_empty() {
            return Ok(None);
        }
        Self::parse(&sources.join(", ")).map(Some)
    }

    /// The selector as written by the user
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Raw text extracted by one content selector, before sanitizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub selector: String,
    pub text: String,
}

/// Everything a page worker needs from one document
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// Matches in selector order, then document order within a selector
    pub matches: Vec<RawMatch>,

    /// `href` values of matched link elements, in document order
    pub hrefs: Vec<String>,

    /// Link elements that matched but carried no `href`
    pub missing_hrefs: usize,
}

/// Parses a page body and runs content and link selectors against it
///
/// # Arguments
///
/// * `html` - The response body
/// * `content` - Content selectors, evaluated in order
/// * `links` - The combined link selector, if any link selectors are configured
pub fn extract_page(
    html: &str,
    content: &[CompiledSelector],
    links: Option<&CompiledSelector>,
) -> ExtractedPage {
    let document = Html::parse_document(html);
    let mut page = ExtractedPage::default();

    for compiled in content {
        for element in document.select(&compiled.selector) {
            page.matches.push(RawMatch {
                selector: compiled.source.clone(),
                text: element.text().collect::<String>(),
            });
        }
    }

    if let Some(compiled) = links {
        for element in document.select(&compiled.selector) {
            match element.value().attr("href") {
                Some(href) => page.hrefs.push(href.to_string()),
                None => page.missing_hrefs += 1,
            }
        }
    }

    page
}
