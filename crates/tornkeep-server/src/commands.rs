//! Command implementations.
//!
//! Every command opens the store and passes the migration gate first, so
//! nothing reads or writes a file whose schema is behind this build.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tornkeep_api::AppState;
use tornkeep_db::{Maintenance, Store};
use tracing::info;

use crate::config::TornkeepConfig;
use crate::error::ServerError;

/// Open the store and migrate it to the latest schema.
///
/// # Errors
///
/// Returns [`ServerError::Store`] if the file cannot be opened and
/// [`ServerError::Migration`] if the schema cannot be brought up to date.
pub async fn open_store(config: &TornkeepConfig) -> Result<Store, ServerError> {
    let store = Store::open(&config.database.store_config()).await?;
    let schema = store.schema();
    let before = schema.current_version().await?;
    let applied = schema.migrate_latest().await?;
    info!(
        from_version = before,
        to_version = schema.latest_version(),
        applied,
        "Schema ready"
    );
    Ok(store)
}

/// Serve the query API until `Ctrl-C`.
///
/// # Errors
///
/// Returns [`ServerError`] if startup or serving fails.
pub async fn serve(config: &TornkeepConfig) -> Result<(), ServerError> {
    let store = open_store(config).await?;
    let state = Arc::new(AppState::new(
        store.clone(),
        config.query.query_config(),
        config.retention.horizon_days,
    ));
    let result = tornkeep_api::start_server(&config.server.server_config(), state).await;
    store.close().await;
    Ok(result?)
}

/// Apply pending migrations and exit.
///
/// # Errors
///
/// Returns [`ServerError`] if the store cannot be opened or migrated.
pub async fn migrate(config: &TornkeepConfig) -> Result<(), ServerError> {
    let store = open_store(config).await?;
    store.close().await;
    Ok(())
}

/// Summarize and prune one month (the previous one by default).
///
/// # Errors
///
/// Returns [`ServerError::Maintenance`] naming the kind and step that
/// failed. Steps already committed stay committed; re-running is safe.
pub async fn maintain(
    config: &TornkeepConfig,
    month: Option<(i32, u32)>,
) -> Result<(), ServerError> {
    let store = open_store(config).await?;
    let maintenance = Maintenance::new(&store, config.retention.horizon_days);
    let result = match month {
        Some((year, month)) => maintenance.run_for_month(year, month).await,
        None => maintenance.run_previous_month().await,
    };
    store.close().await;
    print_json(&result?)
}

/// Write a backup into the configured (or given) directory.
///
/// # Errors
///
/// Returns [`ServerError::Store`] if the backup cannot be written.
pub async fn backup(config: &TornkeepConfig, dir: Option<&Path>) -> Result<(), ServerError> {
    let store = open_store(config).await?;
    let result = store.backup_to(dir.unwrap_or(&config.backup.dir)).await;
    store.close().await;
    print_json(&serde_json::json!({ "backup": result? }))
}

/// Print health metrics.
///
/// # Errors
///
/// Returns [`ServerError::Store`] if the metrics cannot be read.
pub async fn health(config: &TornkeepConfig) -> Result<(), ServerError> {
    let store = open_store(config).await?;
    let result = store.health(config.retention.horizon_days).await;
    store.close().await;
    print_json(&result?)
}

#[allow(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<(), ServerError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse `YYYY-MM`.
///
/// # Errors
///
/// Returns a message for anything that is not a year and a month `1..=12`.
pub fn parse_month(text: &str) -> Result<(i32, u32), String> {
    let (year, month) = text
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got `{text}`"))?;
    let year: i32 = year
        .parse()
        .map_err(|e| format!("invalid year `{year}`: {e}"))?;
    let month: u32 = month
        .parse()
        .map_err(|e| format!("invalid month `{month}`: {e}"))?;
    if !(1..=12).contains(&month) {
        return Err(format!("month must be 1..=12, got {month}"));
    }
    Ok((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_year_month() {
        assert_eq!(parse_month("2025-03"), Ok((2025, 3)));
        assert_eq!(parse_month("2024-12"), Ok((2024, 12)));
    }

    #[test]
    fn rejects_bad_months() {
        assert!(parse_month("2025").is_err());
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("2025-00").is_err());
        assert!(parse_month("March-2025").is_err());
    }
}
