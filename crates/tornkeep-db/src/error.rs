//! Error types for the store.
//!
//! Each component returns its own typed error so callers can tell a bad
//! argument from an engine failure without string matching. Engine errors
//! are wrapped with [`sqlx::Error`] as the source; constraint violations
//! reported by `SQLite` are reclassified as [`ValidationError`] on the write
//! paths.

use sqlx::error::ErrorKind;
use tornkeep_types::{ObservationKind, UnknownPeriodType, ValidationError};

/// Errors opening, configuring or backing up the store.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// A filesystem operation around the database file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A State Store or History Recorder write was rejected.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The payload violated a shape, value or reference constraint.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The engine failed for a reason unrelated to the payload.
    #[error("SQLite error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for WriteError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if matches!(
                db.kind(),
                ErrorKind::CheckViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
            ) {
                return Self::Validation(ValidationError::Constraint(db.message().to_owned()));
            }
        }
        Self::Database(err)
    }
}

/// Schema migration failed. Fatal to startup.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The requested target is not a known migration version.
    #[error("unknown target version {target} (latest known is {latest})")]
    UnknownTarget {
        /// Requested version.
        target: i64,
        /// Highest version this build knows.
        latest: i64,
    },

    /// A version between the current one and the target has no migration.
    #[error("no migration for version {missing}; refusing to skip it")]
    Gap {
        /// The first missing version.
        missing: i64,
    },

    /// The target is below the stored version. Migrations only go forward.
    #[error("schema is at version {current}, cannot migrate down to {target}")]
    Downgrade {
        /// Stored version.
        current: i64,
        /// Requested version.
        target: i64,
    },

    /// One migration failed and was rolled back.
    #[error("migration {version} failed: {source}")]
    Failed {
        /// Version that failed.
        version: i64,
        /// Underlying engine error.
        #[source]
        source: sqlx::Error,
    },

    /// Reading or bootstrapping the version table failed.
    #[error("SQLite error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Summarization rejected its arguments or failed in the engine.
#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    /// `period_end` is not after `period_start`.
    #[error("invalid period: end {end} is not after start {start}")]
    InvalidPeriod {
        /// Period start, unix seconds.
        start: i64,
        /// Period end, unix seconds.
        end: i64,
    },

    /// The period has not ended yet. Observations can still arrive in it.
    #[error("period is still open: it ends at {end}, now is {now}")]
    OpenPeriod {
        /// Period end, unix seconds.
        end: i64,
        /// Clock reading at the call, unix seconds.
        now: i64,
    },

    /// The period type label is not one of the supported granularities.
    #[error(transparent)]
    UnknownPeriodType(#[from] UnknownPeriodType),

    /// The engine failed. Safe to retry the whole call.
    #[error("SQLite error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Pruning rejected its arguments or failed in the engine.
#[derive(Debug, thiserror::Error)]
pub enum PruneError {
    /// A negative retention horizon.
    #[error("invalid retention horizon: {0} days")]
    InvalidHorizon(i64),

    /// The engine failed. Safe to retry the whole call.
    #[error("SQLite error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A Query Gateway read was rejected or failed. Never mutates state.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The table is not in the allow-list.
    #[error("unknown table `{0}`")]
    UnknownTable(String),

    /// The column is not part of the table.
    #[error("unknown column `{column}` in table `{table}`")]
    UnknownColumn {
        /// Table searched.
        table: &'static str,
        /// Rejected column name.
        column: String,
    },

    /// Page numbers start at 1.
    #[error("invalid page {0}: pages start at 1")]
    InvalidPage(i64),

    /// The filter or ordering text could not be parsed.
    #[error("malformed {what}: {reason}")]
    Malformed {
        /// `filter` or `order_by`.
        what: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// The literal does not fit the column's type, or the operator does not
    /// apply to it.
    #[error("type mismatch on `{column}`: {reason}")]
    TypeMismatch {
        /// Column the predicate targets.
        column: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// The read exceeded its deadline and was abandoned.
    #[error("query timed out after {0} ms")]
    Timeout(u64),

    /// The engine failed.
    #[error("SQLite error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Which step of monthly maintenance failed.
#[derive(Debug, thiserror::Error)]
pub enum MaintenanceError {
    /// The requested month does not exist.
    #[error("invalid month {year}-{month:02}")]
    InvalidMonth {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },

    /// Summarizing one kind failed. Later kinds were not touched.
    #[error("summarizing {kind} failed: {source}")]
    Summarize {
        /// Kind being summarized.
        kind: ObservationKind,
        /// Underlying failure.
        #[source]
        source: SummarizeError,
    },

    /// Pruning one kind failed. Its summaries are already committed.
    #[error("pruning {kind} failed: {source}")]
    Prune {
        /// Kind being pruned.
        kind: ObservationKind,
        /// Underlying failure.
        #[source]
        source: PruneError,
    },
}
