//! Export pipeline for extracted matches
//!
//! This module handles:
//! - The `ExportSink` trait every sink implements
//! - Console, file (CSV) and SQLite sinks
//! - Combining several sinks into one fan-out sink

mod combine;
mod console;
mod file;
pub mod format;
mod sqlite;
mod traits;

pub use combine::{combine, CombinedSink};
pub use console::ConsoleSink;
pub use file::{default_results_path, FileSink};
pub use format::{csv_format, plain_format, FormatFn};
pub use sqlite::SqliteSink;
pub use traits::{sink_fn, ExportError, ExportResult, ExportSink, FnSink, Match};
