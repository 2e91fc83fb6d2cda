//! Error types for the tornkeep binary.
//!
//! [`ServerError`] is the top-level error type that wraps all possible
//! failure modes during startup and command execution.

/// Top-level error for the tornkeep binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// Opening or backing up the store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: tornkeep_db::DbError,
    },

    /// The schema could not be brought to the latest version.
    #[error("migration error: {source}")]
    Migration {
        /// The underlying migration error.
        #[from]
        source: tornkeep_db::MigrationError,
    },

    /// Monthly maintenance stopped on a failure.
    #[error("maintenance error: {source}")]
    Maintenance {
        /// The underlying maintenance error.
        #[from]
        source: tornkeep_db::MaintenanceError,
    },

    /// The HTTP server failed to start or stopped unexpectedly.
    #[error("api error: {source}")]
    Api {
        /// The underlying server error.
        #[from]
        source: tornkeep_api::ServerError,
    },

    /// A report could not be rendered.
    #[error("output error: {source}")]
    Output {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
