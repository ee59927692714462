//! Sumi-Spider main entry point
//!
//! This is the command-line interface for the Sumi-Spider scraper.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use sumi_spider::config::{load_config_with_hash, FileConfig};
use sumi_spider::{ConfigError, SpiderBuilder};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Sumi-Spider: a bounded, polite web scraper
///
/// Sumi-Spider crawls outward from a seed address, exports the text of
/// every element matching the content selectors, and follows links matched
/// by the follow selectors until a result, page or time budget runs out.
#[derive(Parser, Debug)]
#[command(name = "sumi-spider")]
#[command(version = "1.0.0")]
#[command(about = "A bounded, polite web scraper", long_about = None)]
struct Cli {
    /// Seed address (overrides the config file)
    #[arg(value_name = "SEED")]
    seed: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Content selector to export (repeatable)
    #[arg(short, long = "select", value_name = "SELECTOR")]
    select: Vec<String>,

    /// Link selector to follow (repeatable)
    #[arg(short, long, value_name = "SELECTOR")]
    follow: Vec<String>,

    /// Maximum number of exported matches
    #[arg(long)]
    results: Option<u64>,

    /// Maximum number of pages visited
    #[arg(long)]
    pages: Option<u64>,

    /// Maximum number of pages fetched at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Wall-clock limit for the run, in seconds
    #[arg(long, value_name = "SECS")]
    time_limit: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Maximum redirects followed per request
    #[arg(long)]
    redirects: Option<usize>,

    /// Info log file ("-" for stdout)
    #[arg(long, value_name = "PATH")]
    info_log: Option<String>,

    /// Error log file ("-" for stderr)
    #[arg(long, value_name = "PATH")]
    error_log: Option<String>,

    /// Also write matches to this CSV file
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Also write matches to this SQLite database
    #[arg(long, value_name = "PATH")]
    sqlite: Option<PathBuf>,

    /// Drop and recreate the SQLite results table first
    #[arg(long, requires = "sqlite")]
    fresh: bool,

    /// Do not print matches to stdout
    #[arg(long)]
    no_console: bool,

    /// Only export matches containing this regular expression
    #[arg(long, value_name = "REGEX")]
    include: Option<String>,

    /// Skip matches containing this regular expression
    #[arg(long, value_name = "REGEX")]
    exclude: Option<String>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate settings and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => FileConfig::default(),
    };
    apply_overrides(&mut config, &cli);

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    handle_crawl(config, cli.verbose).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Crawl runs write to their own info and error logs; this subscriber
/// covers everything outside a run.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_spider=info,warn"),
            1 => EnvFilter::new("sumi_spider=debug,info"),
            _ => EnvFilter::new("sumi_spider=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Command-line values take precedence over the config file
fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(seed) = &cli.seed {
        config.crawl.seed = Some(seed.clone());
    }
    if !cli.select.is_empty() {
        config.crawl.selectors = cli.select.clone();
    }
    if !cli.follow.is_empty() {
        config.crawl.follow = cli.follow.clone();
    }

    let limits = &mut config.limits;
    limits.results = cli.results.or(limits.results);
    limits.pages = cli.pages.or(limits.pages);
    limits.concurrency = cli.concurrency.or(limits.concurrency);
    limits.time_limit = cli.time_limit.or(limits.time_limit);
    limits.request_timeout = cli.timeout.or(limits.request_timeout);
    limits.redirects = cli.redirects.or(limits.redirects);

    if cli.info_log.is_some() {
        config.logging.info_log = cli.info_log.clone();
    }
    if cli.error_log.is_some() {
        config.logging.error_log = cli.error_log.clone();
    }

    if cli.no_console {
        config.export.console = false;
    }
    if cli.csv.is_some() {
        config.export.csv = cli.csv.clone();
    }
    if cli.sqlite.is_some() {
        config.export.sqlite = cli.sqlite.clone();
    }
    config.export.sqlite_fresh |= cli.fresh;

    if cli.include.is_some() {
        config.filter.include = cli.include.clone();
    }
    if cli.exclude.is_some() {
        config.filter.exclude = cli.exclude.clone();
    }
}

/// Handles the --dry-run mode: validates settings and shows what would be crawled
fn handle_dry_run(config: &FileConfig) -> Result<()> {
    let seed = config.crawl.seed.as_deref().ok_or(ConfigError::MissingSeed)?;

    let mut builder = SpiderBuilder::new(seed);
    for selector in config.crawl.selectors.iter().chain(&config.crawl.follow) {
        builder = builder.content_selector(selector.as_str());
    }
    builder
        .build_config()
        .context("invalid crawl settings")?;

    println!("=== Sumi-Spider Dry Run ===\n");

    println!("Crawl:");
    println!("  Seed: {}", seed);
    println!("  Selectors: {}", list(&config.crawl.selectors));
    println!("  Follow: {}", list(&config.crawl.follow));

    let limits = &config.limits;
    println!("\nLimits:");
    println!("  Results: {}", or_default(limits.results));
    println!("  Pages: {}", or_default(limits.pages));
    println!("  Concurrency: {}", or_default(limits.concurrency));
    println!("  Time limit: {}", or_default(limits.time_limit.map(secs)));
    println!(
        "  Request timeout: {}",
        or_default(limits.request_timeout.map(secs))
    );
    println!("  Redirects: {}", or_default(limits.redirects));

    println!("\nLogs:");
    println!("  Info: {}", or_default(config.logging.info_log.as_ref()));
    println!("  Errors: {}", or_default(config.logging.error_log.as_ref()));

    println!("\nExport:");
    println!("  Console: {}", config.export.console);
    if let Some(path) = &config.export.csv {
        println!("  CSV: {}", path.display());
    }
    if let Some(path) = &config.export.sqlite {
        let mode = if config.export.sqlite_fresh { "fresh" } else { "append" };
        println!("  SQLite: {} ({})", path.display(), mode);
    }

    if config.filter.include.is_some() || config.filter.exclude.is_some() {
        println!("\nFilter:");
        println!("  Include: {}", or_default(config.filter.include.as_ref()));
        println!("  Exclude: {}", or_default(config.filter.exclude.as_ref()));
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

fn secs(value: u64) -> String {
    format!("{}s", value)
}

fn or_default<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "default".to_string(), |v| v.to_string())
}

/// Handles the main crawl operation
async fn handle_crawl(config: FileConfig, verbose: u8) -> Result<()> {
    let level = if verbose > 0 {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let spider = SpiderBuilder::from_file(config)
        .await?
        .log_level(level)
        .build()?;

    tracing::info!("Crawling from {}", spider.config().seed);
    let report = spider.run().await.context("crawl failed")?;
    tracing::info!(
        "Crawl finished ({}): {} pages, {} matches, {} still queued",
        report.reason,
        report.pages_visited,
        report.matches_exported,
        report.pending
    );

    Ok(())
}
