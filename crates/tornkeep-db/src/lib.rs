//! Embedded `SQLite` store for Torn game data.
//!
//! One database file holds current entity state, append-only observation
//! history, monthly summaries and the schema version table. All access goes
//! through a [`Store`] handle, which owns a single-connection writer pool and
//! a read-only reader pool over the same file.
//!
//! # Data flow
//!
//! ```text
//! Snapshot
//!     |
//!     +-- Ingestor --+-- StateStore      (players, factions: upsert)
//!     |              +-- HistoryRecorder (*_history: append)
//!     |
//! Maintenance (monthly)
//!     |-- Summarizer (history -> *_summary, idempotent)
//!     +-- Pruner     (delete history older than the horizon, gated)
//!
//! QueryGateway (read-only pool) -- paginated reads over every table
//! ```
//!
//! # Modules
//!
//! - [`sqlite`] -- Pools, [`StoreConfig`] and the [`Store`] handle
//! - [`schema`] / [`migrations`] -- Versioned forward-only migrations
//! - [`state_store`] -- Current player and faction state
//! - [`history`] -- Append-only observation history
//! - [`summarizer`] / [`period`] -- Per-period summaries
//! - [`pruner`] -- Retention pruning gated on summaries
//! - [`maintenance`] -- Monthly summarize-then-prune cycle
//! - [`query`] / [`filter`] / [`render`] -- Query Gateway
//! - [`health`] -- Health metrics and backup
//! - [`ingest`] -- Snapshot routing
//! - [`catalog`] -- Table and column allow-list
//! - [`clock`] -- Time source
//! - [`error`] -- Error types

pub mod catalog;
pub mod clock;
pub mod error;
pub mod filter;
pub mod health;
pub mod history;
pub mod ingest;
pub mod maintenance;
pub mod migrations;
pub mod period;
pub mod pruner;
pub mod query;
pub mod render;
pub mod schema;
pub mod sqlite;
pub mod state_store;
pub mod summarizer;

// Re-export primary types for convenience.
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{
    DbError, MaintenanceError, MigrationError, PruneError, QueryError, SummarizeError, WriteError,
};
pub use health::{HealthReport, HistoryAge, TableCount};
pub use history::{FactionHistoryRecord, HistoryRecorder, PlayerStatsRecord};
pub use ingest::{IngestOutcome, Ingestor};
pub use maintenance::{DEFAULT_HORIZON_DAYS, KindReport, Maintenance, MaintenanceReport};
pub use migrations::{LATEST_VERSION, Migration};
pub use period::Period;
pub use pruner::{PruneStats, Pruner};
pub use query::{PagedRows, QueryConfig, QueryGateway, QueryRequest, TableInfo};
pub use render::Cell;
pub use schema::SchemaManager;
pub use sqlite::{Store, StoreConfig};
pub use state_store::{FactionRecord, PlayerRecord, StateStore};
pub use summarizer::{Summarizer, SummaryDetails, SummaryRecord, SummaryStats, TrackedField};
