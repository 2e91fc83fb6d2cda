//! tornkeep binary: the process around the Torn data store.
//!
//! Loads configuration, initializes structured logging, opens the store
//! behind the migration gate, and runs one command:
//!
//! - `serve` -- the read-only query API (default)
//! - `migrate` -- apply pending schema migrations and exit
//! - `maintain [--month YYYY-MM]` -- summarize then prune one month
//! - `backup [--dir DIR]` -- write a consistent copy of the database
//! - `health` -- print schema version, row counts and history ages
//!
//! Scheduling is external: run `maintain` from cron (or any timer) once a
//! month. Any failure exits non-zero before the listener is bound.

mod commands;
mod config;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig, TornkeepConfig};
use crate::error::ServerError;

#[derive(Parser, Debug)]
#[command(author, version, about = "Torn game-data store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the read-only query API.
    Serve,
    /// Apply pending schema migrations and exit.
    Migrate,
    /// Summarize and prune one month (the previous calendar month by default).
    Maintain {
        /// Month to process, as `YYYY-MM`.
        #[arg(long, value_parser = commands::parse_month)]
        month: Option<(i32, u32)>,
    },
    /// Write a backup of the database.
    Backup {
        /// Destination directory (defaults to `backup.dir`).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print health metrics as JSON.
    Health,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the migration gate, or the command
/// fails.
#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let cli = Cli::parse();
    let config = TornkeepConfig::load()?;
    init_logging(&config.logging);

    info!(
        database = %config.database.path.display(),
        horizon_days = config.retention.horizon_days,
        "tornkeep starting"
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => commands::serve(&config).await,
        Command::Migrate => commands::migrate(&config).await,
        Command::Maintain { month } => commands::maintain(&config, month).await,
        Command::Backup { dir } => commands::backup(&config, dir.as_deref()).await,
        Command::Health => commands::health(&config).await,
    }
}

/// Initialize the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
