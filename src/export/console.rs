use crate::export::format::{plain_format, FormatFn};
use crate::export::{ExportError, ExportResult, ExportSink, Match};
use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;

/// Writes every match to an output stream, stdout by default
pub struct ConsoleSink {
    format: FormatFn,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    /// Console sink writing `address selector text` lines to stdout
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()), plain_format)
    }

    /// Console sink with a custom writer and line format
    pub fn with_writer(out: Box<dyn Write + Send>, format: FormatFn) -> Self {
        Self {
            format,
            out: Mutex::new(out),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stdout()
    }
}

#[async_trait]
impl ExportSink for ConsoleSink {
    async fn export(&self, record: &Match) -> ExportResult<()> {
        let line = (self.format)(record);
        let mut out = self.out.lock().map_err(|_| ExportError::LockPoisoned)?;
        out.write_all(line.as_bytes())?;
        Ok(())
    }

    async fn flush(&self) -> ExportResult<()> {
        let mut out = self.out.lock().map_err(|_| ExportError::LockPoisoned)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Writer that shares its buffer so the test can read it back
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_console_sink_writes_lines() {
        let buf = SharedBuf::default();
        let sink = ConsoleSink::with_writer(Box::new(buf.clone()), plain_format);

        sink.export(&Match::new("https://a.com/", "h1", "One"))
            .await
            .unwrap();
        sink.export(&Match::new("https://a.com/", "h2", "Two"))
            .await
            .unwrap();

        let written = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(written, "https://a.com/ h1 One\nhttps://a.com/ h2 Two\n");
    }
}
