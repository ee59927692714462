use crate::export::format::{csv_format, FormatFn};
use crate::export::{ExportResult, ExportSink, Match};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

/// Appends every match to a buffered file, CSV formatted by default
pub struct FileSink {
    path: PathBuf,
    format: FormatFn,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Creates (or truncates) the output file
    ///
    /// With `path == None` the file is named after the current time, e.g.
    /// `results-2024-05-01T09-30-12-345Z.csv`, in the working directory.
    pub async fn create(path: Option<&Path>) -> ExportResult<Self> {
        Self::with_format(path, csv_format).await
    }

    /// Same as [`FileSink::create`] with a custom line format
    pub async fn with_format(path: Option<&Path>, format: FormatFn) -> ExportResult<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_results_path);
        let file = File::create(&path).await?;
        tracing::debug!("Writing results to {}", path.display());

        Ok(Self {
            path,
            format,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// The file this sink writes to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Timestamped default name for the results file
pub fn default_results_path() -> PathBuf {
    PathBuf::from(format!(
        "results-{}.csv",
        Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ")
    ))
}

#[async_trait]
impl ExportSink for FileSink {
    async fn export(&self, record: &Match) -> ExportResult<()> {
        let line = (self.format)(record);
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        Ok(())
    }

    async fn flush(&self) -> ExportResult<()> {
        let mut writer = self.writer.lock().await;
        writer.flush().await?;
        Ok(())
    }
}
