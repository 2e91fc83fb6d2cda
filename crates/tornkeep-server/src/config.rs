//! Configuration loading and typed config structures.
//!
//! The configuration lives in `tornkeep.yaml` at the working directory (or
//! wherever `TORNKEEP_CONFIG` points). Every section and field has a
//! default, so an empty or missing file is valid. `DATABASE_PATH` and
//! `WEB_PORT` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tornkeep_api::ServerConfig;
use tornkeep_db::{QueryConfig, StoreConfig};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "TORNKEEP_CONFIG";

/// Config file used when `TORNKEEP_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "tornkeep.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value for {name}: {value}")]
    Env {
        /// Variable name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration. Mirrors the structure of `tornkeep.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TornkeepConfig {
    /// Database file and pool settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// History retention.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Query Gateway limits.
    #[serde(default)]
    pub query: QuerySection,

    /// Backup destination.
    #[serde(default)]
    pub backup: BackupConfig,

    /// HTTP listener.
    #[serde(default)]
    pub server: ServerSection,

    /// Log level and format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TornkeepConfig {
    /// Load from `TORNKEEP_CONFIG` or `tornkeep.yaml`, falling back to
    /// defaults when the file does not exist. Environment overrides are
    /// applied either way.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed, or an override is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        if path.exists() {
            Self::from_file(&path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides()?;
            Ok(config)
        }
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Override infrastructure values with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if `WEB_PORT` is not a port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("DATABASE_PATH") {
            self.database.path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("WEB_PORT") {
            self.server.port = val.parse().map_err(|e| ConfigError::Env {
                name: "WEB_PORT",
                value: format!("{val} ({e})"),
            })?;
        }
        Ok(())
    }
}

/// Database file and pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the `SQLite` file.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Maximum read-only connections.
    #[serde(default = "default_max_readers")]
    pub max_readers: u32,

    /// How long a statement waits on a lock, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// How long a caller waits for a pooled connection, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

impl DatabaseConfig {
    /// Store settings for [`tornkeep_db::Store::open`].
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.path)
            .with_max_readers(self.max_readers)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
            .with_acquire_timeout(Duration::from_millis(self.acquire_timeout_ms))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_readers: default_max_readers(),
            busy_timeout_ms: default_timeout_ms(),
            acquire_timeout_ms: default_timeout_ms(),
        }
    }
}

/// History retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetentionConfig {
    /// Observations older than this many days are pruned once summarized.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
        }
    }
}

/// Query Gateway limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QuerySection {
    /// Rows per page when the request names none.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper bound on rows per page.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Text cells are cut to this many characters.
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,

    /// Deadline for one query, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl QuerySection {
    /// Gateway settings for [`tornkeep_db::QueryGateway`].
    pub const fn query_config(&self) -> QueryConfig {
        QueryConfig {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            max_text_len: self.max_text_len,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

impl Default for QuerySection {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_text_len: default_max_text_len(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Backup destination.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackupConfig {
    /// Directory backups are written into.
    #[serde(default = "default_backup_dir")]
    pub dir: PathBuf,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_backup_dir(),
        }
    }
}

/// HTTP listener.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSection {
    /// Listener settings for [`tornkeep_api::start_server`].
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/torn_data.db")
}

const fn default_max_readers() -> u32 {
    8
}

const fn default_timeout_ms() -> u64 {
    5_000
}

const fn default_horizon_days() -> i64 {
    tornkeep_db::DEFAULT_HORIZON_DAYS
}

const fn default_page_size() -> u32 {
    tornkeep_db::query::DEFAULT_PAGE_SIZE
}

const fn default_max_page_size() -> u32 {
    tornkeep_db::query::DEFAULT_MAX_PAGE_SIZE
}

const fn default_max_text_len() -> usize {
    tornkeep_db::query::DEFAULT_MAX_TEXT_LEN
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("data/backups")
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_without_env(yaml: &str) -> TornkeepConfig {
        let config: TornkeepConfig = serde_yml::from_str(yaml).ok().unwrap_or_default();
        config
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = TornkeepConfig::default();
        assert_eq!(config.database.path, PathBuf::from("data/torn_data.db"));
        assert_eq!(config.retention.horizon_days, 60);
        assert_eq!(config.query.default_page_size, 50);
        assert_eq!(config.query.max_page_size, 200);
        assert_eq!(config.query.max_text_len, 50);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn parse_partial_yaml() {
        let config = parse_without_env(
            "retention:\n  horizon_days: 90\nlogging:\n  format: json\nquery:\n  max_page_size: 25\n",
        );
        assert_eq!(config.retention.horizon_days, 90);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.query.max_page_size, 25);
        // Everything else uses defaults
        assert_eq!(config.query.default_page_size, 50);
        assert_eq!(config.backup.dir, PathBuf::from("data/backups"));
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(TornkeepConfig::parse("").is_ok());
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        assert!(TornkeepConfig::parse("retention: [not, a, map]").is_err());
    }

    #[test]
    fn query_section_converts_to_gateway_limits() {
        let limits = QuerySection::default().query_config();
        assert_eq!(limits, QueryConfig::default());
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join(DEFAULT_CONFIG_PATH);
        if path.exists() {
            let config = TornkeepConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
