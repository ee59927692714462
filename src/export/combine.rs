use crate::export::{ExportError, ExportResult, ExportSink, Match};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

/// Fans each match out to several sinks
///
/// All child sinks run concurrently for one match, and the export resolves
/// only after every child has finished. If any child fails, the combined
/// export fails with the first error.
#[derive(Clone, Default)]
pub struct CombinedSink {
    sinks: Vec<Arc<dyn ExportSink>>,
}

impl CombinedSink {
    /// Creates an empty combination
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a child sink
    pub fn with(mut self, sink: impl ExportSink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Number of child sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

/// Combines several sinks into one
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sumi_spider::export::{combine, ConsoleSink, ExportSink, SqliteSink};
///
/// let sinks: Vec<Arc<dyn ExportSink>> = vec![
///     Arc::new(ConsoleSink::stdout()),
///     Arc::new(SqliteSink::new("results.db", false)),
/// ];
/// let sink = combine(sinks);
/// ```
pub fn combine(sinks: impl IntoIterator<Item = Arc<dyn ExportSink>>) -> CombinedSink {
    CombinedSink {
        sinks: sinks.into_iter().collect(),
    }
}

fn collect_failures(results: Vec<ExportResult<()>>) -> ExportResult<()> {
    let total = results.len();
    let mut errors = results.into_iter().filter_map(Result::err);
    match errors.next() {
        None => Ok(()),
        Some(first) => Err(ExportError::Combined {
            failed: 1 + errors.count(),
            total,
            first: Box::new(first),
        }),
    }
}

#[async_trait]
impl ExportSink for CombinedSink {
    async fn export(&self, record: &Match) -> ExportResult<()> {
        let results = join_all(self.sinks.iter().map(|sink| sink.export(record))).await;
        collect_failures(results)
    }

    async fn flush(&self) -> ExportResult<()> {
        let results = join_all(self.sinks.iter().map(|sink| sink.flush())).await;
        collect_failures(results)
    }
}
