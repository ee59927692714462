use crate::config::types::{FileConfig, LimitsSection};
use crate::crawler::CompiledSelector;
use crate::url::is_valid_crawl_target;
use crate::ConfigError;
use regex::Regex;
use std::time::Duration;

/// Validates a configuration file after parsing
///
/// The seed may be absent here since the command line can supply it;
/// `SpiderBuilder` rejects a missing seed at build time.
pub fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if let Some(seed) = &config.crawl.seed {
        validate_seed(seed)?;
    }
    validate_selectors(&config.crawl.selectors)?;
    validate_selectors(&config.crawl.follow)?;
    validate_limits_section(&config.limits)?;
    validate_patterns(
        config.filter.include.as_deref(),
        config.filter.exclude.as_deref(),
    )?;
    Ok(())
}

/// Validates the seed address
pub fn validate_seed(seed: &str) -> Result<(), ConfigError> {
    if seed.trim().is_empty() {
        return Err(ConfigError::MissingSeed);
    }

    if !is_valid_crawl_target(seed) {
        return Err(ConfigError::InvalidUrl(format!(
            "seed '{}' is not an absolute http(s) address",
            seed
        )));
    }

    Ok(())
}

/// Validates the settings that would otherwise stall the scheduler
pub fn validate_limits(concurrency: usize, poll_interval: Duration) -> Result<(), ConfigError> {
    if concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            concurrency
        )));
    }

    if poll_interval.is_zero() {
        return Err(ConfigError::Validation(
            "settle poll interval must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_limits_section(limits: &LimitsSection) -> Result<(), ConfigError> {
    if let Some(concurrency) = limits.concurrency {
        validate_limits(concurrency, Duration::from_secs(1))?;
    }

    if limits.request_timeout == Some(0) {
        return Err(ConfigError::Validation(
            "request-timeout must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

fn validate_selectors(selectors: &[String]) -> Result<(), ConfigError> {
    for selector in selectors {
        CompiledSelector::parse(selector)?;
    }
    Ok(())
}

fn validate_patterns(include: Option<&str>, exclude: Option<&str>) -> Result<(), ConfigError> {
    for pattern in include.into_iter().chain(exclude) {
        Regex::new(pattern)?;
    }
    Ok(())
}
