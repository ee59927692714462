//! Two-stream crawl logs
//!
//! Every run writes an info stream (INFO and WARN, plus DEBUG when the
//! level allows it) and an error stream (ERROR only). Each stream goes to
//! its own `LogTarget`. The subscriber is scoped to the run rather than
//! installed globally, so several spiders can log to different files in
//! one process.

use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Level, Metadata};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

/// Events from this crate are the only ones written to crawl logs
const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Where a log stream is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// stdout for the info stream, stderr for the error stream
    Console,
    /// Appended to a file, created if missing
    File(PathBuf),
}

impl LogTarget {
    /// Timestamped info log in the working directory
    pub fn default_info() -> Self {
        LogTarget::File(timestamped("spider-info"))
    }

    /// Timestamped error log in the working directory
    pub fn default_error() -> Self {
        LogTarget::File(timestamped("spider-error"))
    }

    /// Parses a config or command-line value; "-" and "console" mean the terminal
    pub fn from_setting(value: &str) -> Self {
        match value.trim() {
            "-" | "console" => LogTarget::Console,
            path => LogTarget::File(PathBuf::from(path)),
        }
    }
}

fn timestamped(prefix: &str) -> PathBuf {
    PathBuf::from(format!(
        "{}-{}.log",
        prefix,
        Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ")
    ))
}

#[derive(Debug, Clone)]
enum Stream {
    Stdout,
    Stderr,
    File(Arc<File>),
}

impl Stream {
    fn open(target: &LogTarget, console: Stream) -> io::Result<Self> {
        match target {
            LogTarget::Console => Ok(console),
            LogTarget::File(path) => Ok(Stream::File(Arc::new(open_append(path)?))),
        }
    }

    fn make_writer(&self) -> BoxMakeWriter {
        match self {
            Stream::Stdout => BoxMakeWriter::new(io::stdout),
            Stream::Stderr => BoxMakeWriter::new(io::stderr),
            Stream::File(file) => BoxMakeWriter::new(Arc::clone(file)),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self {
            Stream::Stdout => io::stdout().flush(),
            Stream::Stderr => io::stderr().flush(),
            Stream::File(file) => (&**file).flush(),
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Open info and error streams for one run
#[derive(Debug)]
pub struct CrawlLogs {
    info: Stream,
    error: Stream,
    level: LevelFilter,
}

impl CrawlLogs {
    /// Opens (creating if needed) both log targets
    pub fn open(info: &LogTarget, error: &LogTarget, level: LevelFilter) -> io::Result<Self> {
        Ok(Self {
            info: Stream::open(info, Stream::Stdout)?,
            error: Stream::open(error, Stream::Stderr)?,
            level,
        })
    }

    /// Builds a dispatcher writing this run's events to both streams
    ///
    /// Use it with `WithSubscriber::with_subscriber` so it only applies to
    /// the crawl future and the tasks it spawns.
    pub fn dispatch(&self) -> Dispatch {
        let level = self.level;
        let info_layer = tracing_subscriber::fmt::layer()
            .with_writer(self.info.make_writer())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_filter(filter_fn(move |meta| {
                is_ours(meta) && *meta.level() != Level::ERROR && *meta.level() <= level
            }));

        let error_layer = tracing_subscriber::fmt::layer()
            .with_writer(self.error.make_writer())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_filter(filter_fn(|meta| {
                is_ours(meta) && *meta.level() == Level::ERROR
            }));

        Dispatch::new(
            tracing_subscriber::registry()
                .with(info_layer)
                .with(error_layer),
        )
    }

    /// Flushes both streams; files are closed once the last writer drops
    pub fn close(self) -> io::Result<()> {
        self.info.flush()?;
        self.error.flush()
    }
}

fn is_ours(meta: &Metadata<'_>) -> bool {
    meta.target().starts_with(CRATE_TARGET)
}
