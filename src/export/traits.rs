//! Export sink trait and associated types
//!
//! A sink consumes `(address, selector, text)` matches as they are found.
//! The crawler awaits every export but never inspects anything beyond
//! success or failure.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while exporting matches
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Export sink lock poisoned")]
    LockPoisoned,

    #[error("Export task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Sink(String),

    #[error("{failed} of {total} combined sinks failed, first error: {first}")]
    Combined {
        failed: usize,
        total: usize,
        first: Box<ExportError>,
    },
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// One piece of extracted content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Address of the page the text came from
    pub address: String,

    /// The content selector that matched, as written in the config
    pub selector: String,

    /// Sanitized element text
    pub text: String,
}

impl Match {
    pub fn new(
        address: impl Into<String>,
        selector: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            selector: selector.into(),
            text: text.into(),
        }
    }
}

/// Trait for export sinks
///
/// Sinks may be invoked concurrently from several page workers, so any
/// shared handle (file, connection) must be serialized by the sink itself.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Exports a single match
    async fn export(&self, record: &Match) -> ExportResult<()>;

    /// Flushes buffered output; called once when a crawl finishes
    async fn flush(&self) -> ExportResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: ExportSink + ?Sized> ExportSink for Arc<T> {
    async fn export(&self, record: &Match) -> ExportResult<()> {
        (**self).export(record).await
    }

    async fn flush(&self) -> ExportResult<()> {
        (**self).flush().await
    }
}

/// A sink backed by an async closure
pub struct FnSink<F> {
    f: F,
}

/// Wraps an async closure as an export sink
///
/// # Example
///
/// ```
/// use sumi_spider::export::{sink_fn, ExportSink, Match};
///
/// let sink = sink_fn(|record: Match| async move {
///     println!("{} => {}", record.address, record.text);
///     Ok(())
/// });
/// # let _ = &sink as &dyn ExportSink;
/// ```
pub fn sink_fn<F, Fut>(f: F) -> FnSink<F>
where
    F: Fn(Match) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ExportResult<()>> + Send + 'static,
{
    FnSink { f }
}

#[async_trait]
impl<F, Fut> ExportSink for FnSink<F>
where
    F: Fn(Match) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ExportResult<()>> + Send + 'static,
{
    async fn export(&self, record: &Match) -> ExportResult<()> {
        (self.f)(record.clone()).await
    }
}
