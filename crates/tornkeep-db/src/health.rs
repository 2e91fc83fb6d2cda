//! Health metrics and online backup.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};
use tornkeep_types::ObservationKind;

use crate::catalog::{self, TableSpec};
use crate::error::DbError;
use crate::sqlite::{Store, from_unix};

/// Backup file name pattern, formatted with the clock's current time.
pub const BACKUP_FILE_FORMAT: &str = "torn_data_backup_%Y%m%d_%H%M%S.db";

/// Row count of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    /// Table name.
    pub table: &'static str,
    /// Number of rows.
    pub rows: i64,
}

/// Age profile of one history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryAge {
    /// Observation kind stored in the table.
    pub kind: ObservationKind,
    /// History table name.
    pub table: &'static str,
    /// Oldest `recorded_at`, if any rows exist.
    pub oldest: Option<DateTime<Utc>>,
    /// Newest `recorded_at`, if any rows exist.
    pub newest: Option<DateTime<Utc>>,
    /// Rows recorded before the retention horizon.
    pub past_horizon: i64,
}

/// Snapshot of the store's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Applied schema version, 0 for a fresh file.
    pub schema_version: i64,
    /// Row counts of catalogued tables present in the file.
    pub tables: Vec<TableCount>,
    /// Per-kind history ages.
    pub history: Vec<HistoryAge>,
    /// Horizon used for `past_horizon`.
    pub horizon_days: i64,
    /// `page_count * page_size`.
    pub size_bytes: i64,
}

impl Store {
    /// Collect health metrics on the read-only pool.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] for a horizon that overflows the clock and
    /// [`DbError::Sqlite`] if the engine fails.
    pub async fn health(&self, horizon_days: i64) -> Result<HealthReport, DbError> {
        let cutoff = TimeDelta::try_days(horizon_days)
            .and_then(|delta| self.clock().now().checked_sub_signed(delta))
            .ok_or_else(|| DbError::Config(format!("invalid horizon: {horizon_days} days")))?;

        let present: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(self.reader())
                .await?;
        let is_present = |table: &TableSpec| present.iter().any(|name| name == table.name);

        let schema_version = if is_present(&catalog::SCHEMA_VERSION) {
            sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(version) FROM schema_version")
                .fetch_one(self.reader())
                .await?
                .unwrap_or(0)
        } else {
            0
        };

        let mut tables = Vec::new();
        for table in catalog::ALL_TABLES.into_iter().filter(|t| is_present(t)) {
            let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ");
            count.push(table.name);
            let rows = count
                .build_query_scalar::<i64>()
                .fetch_one(self.reader())
                .await?;
            tables.push(TableCount {
                table: table.name,
                rows,
            });
        }

        let mut history = Vec::new();
        for kind in ObservationKind::ALL {
            let table = catalog::layout(kind).history;
            if !is_present(table) {
                continue;
            }
            let mut ages = QueryBuilder::<Sqlite>::new(
                "SELECT MIN(recorded_at), MAX(recorded_at), \
                 COALESCE(SUM(CASE WHEN recorded_at < ",
            );
            ages.push_bind(cutoff.timestamp())
                .push(" THEN 1 ELSE 0 END), 0) FROM ")
                .push(table.name);
            let (oldest, newest, past_horizon): (Option<i64>, Option<i64>, i64) =
                ages.build_query_as().fetch_one(self.reader()).await?;
            history.push(HistoryAge {
                kind,
                table: table.name,
                oldest: oldest.map(from_unix),
                newest: newest.map(from_unix),
                past_horizon,
            });
        }

        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(self.reader())
            .await?;
        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(self.reader())
            .await?;

        Ok(HealthReport {
            schema_version,
            tables,
            history,
            horizon_days,
            size_bytes: page_count.saturating_mul(page_size),
        })
    }

    /// Write a consistent copy of the database into `dir`.
    ///
    /// Runs `VACUUM INTO` on the writer connection, so the copy reflects
    /// every committed write and no half-applied one.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if `dir` cannot be created,
    /// [`DbError::Config`] for a non UTF-8 path and [`DbError::Sqlite`] if the
    /// engine fails (including when the target file already exists).
    pub async fn backup_to(&self, dir: &Path) -> Result<PathBuf, DbError> {
        tokio::fs::create_dir_all(dir).await?;
        let target = dir.join(self.clock().now().format(BACKUP_FILE_FORMAT).to_string());
        let target_str = target
            .to_str()
            .ok_or_else(|| DbError::Config(format!("non UTF-8 backup path: {}", target.display())))?;

        sqlx::query("VACUUM INTO ?1")
            .bind(target_str)
            .execute(self.writer())
            .await?;

        tracing::info!(path = %target.display(), "Database backup written");
        Ok(target)
    }
}
