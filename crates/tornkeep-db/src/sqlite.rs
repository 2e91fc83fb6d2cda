//! `SQLite` connection pools and the [`Store`] handle.
//!
//! One database file is opened through two pools:
//!
//! - a **writer** pool, one connection by default, through which every
//!   mutating statement flows. In-process writers serialize on it; other
//!   processes are held off by `SQLite` file locking with a bounded
//!   `busy_timeout`.
//! - a **reader** pool opened `read_only`, used by the Query Gateway, health
//!   metrics and history reads. In WAL mode readers never block the writer.
//!
//! Queries are built at runtime (not compile-time checked) so the crate
//! builds without a live database. Values are always bound, never
//! interpolated.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use crate::clock::{Clock, SystemClock};
use crate::error::DbError;
use crate::history::HistoryRecorder;
use crate::pruner::Pruner;
use crate::query::{QueryConfig, QueryGateway};
use crate::schema::SchemaManager;
use crate::state_store::StateStore;
use crate::summarizer::Summarizer;

/// Default number of reader connections.
const DEFAULT_MAX_READERS: u32 = 8;

/// Default time a connection waits on a locked database.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Default time a caller waits for a pooled connection.
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

/// Page cache size in KiB (negative means KiB to `SQLite`).
const CACHE_SIZE: &str = "-64000";

/// Configuration for opening the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the database file. Created if missing.
    pub path: PathBuf,
    /// Maximum connections in the read-only pool.
    pub max_readers: u32,
    /// How long a statement waits on a lock held by another connection.
    pub busy_timeout: Duration,
    /// How long a caller waits for a free pooled connection.
    pub acquire_timeout: Duration,
}

impl StoreConfig {
    /// Configuration for `path` with default pool settings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_readers: DEFAULT_MAX_READERS,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            acquire_timeout: Duration::from_millis(DEFAULT_ACQUIRE_TIMEOUT_MS),
        }
    }

    /// Set the reader pool size.
    #[must_use]
    pub const fn with_max_readers(mut self, max: u32) -> Self {
        self.max_readers = max;
        self
    }

    /// Set the lock wait timeout.
    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Set the pool acquire timeout.
    #[must_use]
    pub const fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    fn base_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout)
            .pragma("cache_size", CACHE_SIZE)
            .pragma("temp_store", "MEMORY")
    }
}

/// Handle to an open store.
///
/// Cheap to clone; clones share both pools and the clock. Component views
/// ([`StateStore`], [`HistoryRecorder`], ...) borrow from it.
#[derive(Debug, Clone)]
pub struct Store {
    writer: SqlitePool,
    reader: SqlitePool,
    clock: Arc<dyn Clock>,
    path: PathBuf,
}

impl Store {
    /// Open (creating if needed) the database file and connect both pools.
    ///
    /// Does not migrate; call [`SchemaManager::migrate_latest`] before
    /// serving traffic.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the parent directory cannot be created and
    /// [`DbError::Sqlite`] if either pool fails to connect.
    pub async fn open(config: &StoreConfig) -> Result<Self, DbError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let writer_options = config
            .base_options()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(writer_options)
            .await?;

        // The writer has already switched the file to WAL; readers inherit it.
        let reader_options = config.base_options().read_only(true);
        let reader = SqlitePoolOptions::new()
            .max_connections(config.max_readers.max(1))
            .acquire_timeout(config.acquire_timeout)
            .connect_with(reader_options)
            .await?;

        tracing::info!(
            path = %config.path.display(),
            max_readers = config.max_readers,
            "Opened SQLite store"
        );

        Ok(Self {
            writer,
            reader,
            clock: Arc::new(SystemClock),
            path: config.path.clone(),
        })
    }

    /// Replace the clock. Affects every component view created afterwards.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The single-connection pool all writes go through.
    pub const fn writer(&self) -> &SqlitePool {
        &self.writer
    }

    /// The read-only pool.
    pub const fn reader(&self) -> &SqlitePool {
        &self.reader
    }

    /// The clock timestamps are taken from.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Schema Manager over the shipped migrations.
    pub fn schema(&self) -> SchemaManager<'_> {
        SchemaManager::new(&self.writer, self.clock())
    }

    /// State Store view.
    pub fn state(&self) -> StateStore<'_> {
        StateStore::new(&self.writer, &self.reader, self.clock())
    }

    /// History Recorder view.
    pub fn history(&self) -> HistoryRecorder<'_> {
        HistoryRecorder::new(&self.writer, &self.reader, self.clock())
    }

    /// Summarizer view.
    pub fn summarizer(&self) -> Summarizer<'_> {
        Summarizer::new(&self.writer, &self.reader, self.clock())
    }

    /// Retention Pruner view.
    pub fn pruner(&self) -> Pruner<'_> {
        Pruner::new(&self.writer, self.clock())
    }

    /// Query Gateway view over the read-only pool.
    pub fn gateway<'a>(&'a self, config: &'a QueryConfig) -> QueryGateway<'a> {
        QueryGateway::new(&self.reader, config)
    }

    /// Close both pools gracefully.
    pub async fn close(&self) {
        self.reader.close().await;
        self.writer.close().await;
        tracing::info!("SQLite store closed");
    }
}

/// Start a write transaction holding the database write lock from its
/// first statement.
///
/// A deferred transaction that reads and then writes cannot wait out a
/// writer from another process; `BEGIN IMMEDIATE` waits up to
/// `busy_timeout` for the lock instead.
pub(crate) async fn begin_write(
    pool: &SqlitePool,
) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

/// Convert stored unix seconds into a UTC timestamp.
pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
