//! Forward-only schema migrations.
//!
//! Each migration is a list of statements applied inside one transaction by
//! [`SchemaManager`](crate::schema::SchemaManager). Versions are dense and
//! start at 1. Once released, a migration's SQL never changes; new shape
//! goes into a new version.
//!
//! All timestamps are unix seconds (UTC) in `INTEGER` columns.

/// One schema migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    /// Version this migration brings the schema to.
    pub version: i64,
    /// Short description recorded in `schema_version`.
    pub description: &'static str,
    /// Statements executed in order.
    pub statements: &'static [&'static str],
}

/// The migrations shipped with this build, in ascending version order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "initial_schema",
        statements: V1_INITIAL_SCHEMA,
    },
    Migration {
        version: 2,
        description: "summary_tables",
        statements: V2_SUMMARY_TABLES,
    },
    Migration {
        version: 3,
        description: "history_indexes",
        statements: V3_HISTORY_INDEXES,
    },
];

/// Highest version shipped with this build.
pub const LATEST_VERSION: i64 = 3;

/// Bootstrap statement for the version table. Runs outside any migration.
pub const CREATE_SCHEMA_VERSION: &str = r"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at INTEGER NOT NULL
)";

// =============================================================================
// v1: current-state and history tables
// =============================================================================

const V1_INITIAL_SCHEMA: &[&str] = &[
    r"
CREATE TABLE factions (
    faction_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    tag TEXT,
    leader_id INTEGER,
    co_leader_id INTEGER,
    respect INTEGER CHECK (respect >= 0),
    age INTEGER CHECK (age >= 0),
    best_chain INTEGER CHECK (best_chain >= 0),
    member_count INTEGER CHECK (member_count >= 0),
    created_at INTEGER NOT NULL,
    last_updated INTEGER NOT NULL
)",
    r"
CREATE TABLE players (
    player_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    level INTEGER CHECK (level >= 1),
    rank TEXT,
    faction_id INTEGER REFERENCES factions(faction_id),
    status_state TEXT,
    status_description TEXT,
    life_current INTEGER CHECK (life_current >= 0),
    life_maximum INTEGER CHECK (life_maximum > 0),
    created_at INTEGER NOT NULL,
    last_updated INTEGER NOT NULL
)",
    r"
CREATE TABLE player_stats_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES players(player_id),
    recorded_at INTEGER NOT NULL,
    strength INTEGER CHECK (strength >= 0),
    defense INTEGER CHECK (defense >= 0),
    speed INTEGER CHECK (speed >= 0),
    dexterity INTEGER CHECK (dexterity >= 0),
    total_stats INTEGER CHECK (total_stats >= 0),
    level INTEGER CHECK (level >= 1),
    life_maximum INTEGER CHECK (life_maximum > 0),
    networth INTEGER,
    data_source TEXT
)",
    r"
CREATE TABLE faction_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    faction_id INTEGER NOT NULL REFERENCES factions(faction_id),
    recorded_at INTEGER NOT NULL,
    respect INTEGER CHECK (respect >= 0),
    member_count INTEGER CHECK (member_count >= 0),
    best_chain INTEGER CHECK (best_chain >= 0),
    data_source TEXT
)",
    r"
CREATE TABLE war_status_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    war_id INTEGER NOT NULL,
    war_type TEXT NOT NULL CHECK (war_type IN ('territory', 'ranked')),
    territory_id INTEGER,
    attacking_faction_id INTEGER REFERENCES factions(faction_id),
    defending_faction_id INTEGER REFERENCES factions(faction_id),
    attacking_score INTEGER CHECK (attacking_score >= 0),
    defending_score INTEGER CHECK (defending_score >= 0),
    required_score INTEGER CHECK (required_score >= 0),
    status TEXT CHECK (status IN ('ongoing', 'completed', 'cancelled')),
    started_at INTEGER,
    ends_at INTEGER,
    recorded_at INTEGER NOT NULL,
    data_source TEXT
)",
    r"
CREATE TABLE territory_ownership_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    territory_id INTEGER NOT NULL,
    faction_id INTEGER REFERENCES factions(faction_id),
    sector TEXT,
    coordinates TEXT,
    racket_level INTEGER CHECK (racket_level >= 0),
    racket_type TEXT,
    war_status TEXT CHECK (war_status IN ('none', 'under_attack', 'defending')),
    recorded_at INTEGER NOT NULL,
    data_source TEXT
)",
];

// =============================================================================
// v2: summary tables
// =============================================================================

const V2_SUMMARY_TABLES: &[&str] = &[
    r"
CREATE TABLE player_stats_summary (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES players(player_id),
    period_start INTEGER NOT NULL,
    period_end INTEGER NOT NULL,
    period_type TEXT NOT NULL DEFAULT 'monthly'
        CHECK (period_type IN ('daily', 'weekly', 'monthly')),
    strength_start INTEGER,
    strength_end INTEGER,
    strength_change INTEGER,
    defense_start INTEGER,
    defense_end INTEGER,
    defense_change INTEGER,
    speed_start INTEGER,
    speed_end INTEGER,
    speed_change INTEGER,
    dexterity_start INTEGER,
    dexterity_end INTEGER,
    dexterity_change INTEGER,
    total_stats_start INTEGER,
    total_stats_end INTEGER,
    total_stats_change INTEGER,
    level_start INTEGER,
    level_end INTEGER,
    level_change INTEGER,
    life_maximum_start INTEGER,
    life_maximum_end INTEGER,
    life_maximum_change INTEGER,
    networth_start INTEGER,
    networth_end INTEGER,
    networth_change INTEGER,
    record_count INTEGER NOT NULL CHECK (record_count >= 1),
    created_at INTEGER NOT NULL,
    CHECK (period_end > period_start),
    UNIQUE (player_id, period_start, period_end, period_type)
)",
    r"
CREATE TABLE faction_summary (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    faction_id INTEGER NOT NULL REFERENCES factions(faction_id),
    period_start INTEGER NOT NULL,
    period_end INTEGER NOT NULL,
    period_type TEXT NOT NULL DEFAULT 'monthly'
        CHECK (period_type IN ('daily', 'weekly', 'monthly')),
    respect_start INTEGER,
    respect_end INTEGER,
    respect_change INTEGER,
    member_count_start INTEGER,
    member_count_end INTEGER,
    member_count_change INTEGER,
    best_chain_start INTEGER,
    best_chain_end INTEGER,
    best_chain_change INTEGER,
    record_count INTEGER NOT NULL CHECK (record_count >= 1),
    created_at INTEGER NOT NULL,
    CHECK (period_end > period_start),
    UNIQUE (faction_id, period_start, period_end, period_type)
)",
    r"
CREATE TABLE war_summary (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    war_id INTEGER NOT NULL,
    period_start INTEGER NOT NULL,
    period_end INTEGER NOT NULL,
    period_type TEXT NOT NULL DEFAULT 'monthly'
        CHECK (period_type IN ('daily', 'weekly', 'monthly')),
    war_type TEXT NOT NULL CHECK (war_type IN ('territory', 'ranked')),
    territory_id INTEGER,
    attacking_faction_id INTEGER REFERENCES factions(faction_id),
    defending_faction_id INTEGER REFERENCES factions(faction_id),
    attacking_score_start INTEGER,
    attacking_score_end INTEGER,
    attacking_score_change INTEGER,
    defending_score_start INTEGER,
    defending_score_end INTEGER,
    defending_score_change INTEGER,
    status_end TEXT CHECK (status_end IN ('ongoing', 'completed', 'cancelled')),
    winner_faction_id INTEGER REFERENCES factions(faction_id),
    duration_seconds INTEGER CHECK (duration_seconds >= 0),
    record_count INTEGER NOT NULL CHECK (record_count >= 1),
    created_at INTEGER NOT NULL,
    CHECK (period_end > period_start),
    UNIQUE (war_id, period_start, period_end, period_type)
)",
    r"
CREATE TABLE territory_ownership_summary (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    territory_id INTEGER NOT NULL,
    period_start INTEGER NOT NULL,
    period_end INTEGER NOT NULL,
    period_type TEXT NOT NULL DEFAULT 'monthly'
        CHECK (period_type IN ('daily', 'weekly', 'monthly')),
    faction_id_start INTEGER REFERENCES factions(faction_id),
    faction_id_end INTEGER REFERENCES factions(faction_id),
    ownership_changes INTEGER NOT NULL CHECK (ownership_changes >= 0),
    days_owned INTEGER NOT NULL CHECK (days_owned >= 0),
    racket_level_start INTEGER,
    racket_level_end INTEGER,
    racket_level_change INTEGER,
    record_count INTEGER NOT NULL CHECK (record_count >= 1),
    created_at INTEGER NOT NULL,
    CHECK (period_end > period_start),
    UNIQUE (territory_id, period_start, period_end, period_type)
)",
];

// =============================================================================
// v3: indexes
// =============================================================================

const V3_HISTORY_INDEXES: &[&str] = &[
    "CREATE INDEX idx_players_faction ON players(faction_id)",
    "CREATE INDEX idx_players_last_updated ON players(last_updated)",
    "CREATE INDEX idx_factions_last_updated ON factions(last_updated)",
    "CREATE INDEX idx_player_stats_player_time ON player_stats_history(player_id, recorded_at)",
    "CREATE INDEX idx_player_stats_time ON player_stats_history(recorded_at)",
    "CREATE INDEX idx_faction_history_faction_time ON faction_history(faction_id, recorded_at)",
    "CREATE INDEX idx_faction_history_time ON faction_history(recorded_at)",
    "CREATE INDEX idx_war_status_war_time ON war_status_history(war_id, recorded_at)",
    "CREATE INDEX idx_war_status_territory ON war_status_history(territory_id, recorded_at)",
    "CREATE INDEX idx_war_status_time ON war_status_history(recorded_at)",
    "CREATE INDEX idx_territory_territory_time ON territory_ownership_history(territory_id, recorded_at)",
    "CREATE INDEX idx_territory_faction ON territory_ownership_history(faction_id, recorded_at)",
    "CREATE INDEX idx_territory_time ON territory_ownership_history(recorded_at)",
    "CREATE INDEX idx_player_stats_summary_period ON player_stats_summary(period_type, period_start)",
    "CREATE INDEX idx_faction_summary_period ON faction_summary(period_type, period_start)",
    "CREATE INDEX idx_war_summary_period ON war_summary(period_type, period_start)",
    "CREATE INDEX idx_war_summary_territory ON war_summary(territory_id, period_start)",
    "CREATE INDEX idx_territory_summary_period ON territory_ownership_summary(period_type, period_start)",
    "CREATE INDEX idx_territory_summary_owner ON territory_ownership_summary(faction_id_end, period_start)",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_dense_and_ascending() {
        for (expected, migration) in (1_i64..).zip(MIGRATIONS) {
            assert_eq!(migration.version, expected);
            assert!(!migration.statements.is_empty());
        }
        assert_eq!(MIGRATIONS.last().map(|m| m.version), Some(LATEST_VERSION));
    }
}
