//! SQLite export sink
//!
//! Inserts one row per match into a `results` table. The connection is
//! opened lazily on first use and owned by the sink for its lifetime; all
//! writes go through one mutex on a blocking thread.

use crate::export::{ExportError, ExportResult, ExportSink, Match};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const CREATE_RESULTS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    selector TEXT NOT NULL,
    address TEXT NOT NULL
);
"#;

/// Exports matches into a SQLite database
pub struct SqliteSink {
    path: PathBuf,
    fresh: bool,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteSink {
    /// Creates a sink for the database at `path`
    ///
    /// Nothing is opened until the first export. When `fresh` is set, or the
    /// database file does not exist yet, the `results` table is dropped and
    /// recreated; otherwise it is only created if absent.
    pub fn new(path: impl AsRef<Path>, fresh: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            fresh,
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Runs `f` against the lazily opened connection on a blocking thread
    async fn with_connection<T, F>(&self, f: F) -> ExportResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let path = self.path.clone();
        let fresh = self.fresh;

        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| ExportError::LockPoisoned)?;
            if guard.is_none() {
                *guard = Some(open_database(&path, fresh)?);
            }
            match guard.as_ref() {
                Some(conn) => Ok(f(conn)?),
                None => Err(ExportError::Sink("database connection unavailable".to_string())),
            }
        })
        .await?
    }

    /// Number of stored matches
    pub async fn count(&self) -> ExportResult<u64> {
        self.with_connection(|conn| {
            conn.query_row("SELECT COUNT(*) FROM results", [], |row| row.get::<_, i64>(0))
                .map(|n| n as u64)
        })
        .await
    }

    /// All stored matches in insertion order
    pub async fn load_results(&self) -> ExportResult<Vec<Match>> {
        self.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT address, selector, text FROM results ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok(Match {
                    address: row.get(0)?,
                    selector: row.get(1)?,
                    text: row.get(2)?,
                })
            })?;
            rows.collect()
        })
        .await
    }
}

/// Opens the database and prepares the `results` table
fn open_database(path: &Path, fresh: bool) -> Result<Connection, rusqlite::Error> {
    let existed = path.exists();
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;

    if fresh || !existed {
        conn.execute_batch("DROP TABLE IF EXISTS results;")?;
    }
    conn.execute_batch(CREATE_RESULTS_SQL)?;

    tracing::debug!("Opened results database {}", path.display());
    Ok(conn)
}

#[async_trait]
impl ExportSink for SqliteSink {
    async fn export(&self, record: &Match) -> ExportResult<()> {
        let record = record.clone();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO results (text, selector, address) VALUES (?1, ?2, ?3)",
                params![record.text, record.selector, record.address],
            )
            .map(|_| ())
        })
        .await
    }
}
