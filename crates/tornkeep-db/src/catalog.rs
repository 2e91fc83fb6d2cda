//! Static catalog of every table the store owns.
//!
//! The catalog is the allow-list the Query Gateway validates table and
//! column names against, and the layout the Summarizer and Pruner use to
//! pick tables per [`ObservationKind`]. Identifiers only ever reach SQL text
//! from here, never from caller input.
//!
//! Column order mirrors the `CREATE TABLE` statements in
//! [`crate::migrations`]; `catalog_matches_migrated_schema` in the integration tests
//! keeps the two in lockstep.

use tornkeep_types::ObservationKind;

/// Storage class of a column, as far as reads and filters care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// `INTEGER` holding a plain number.
    Integer,
    /// `INTEGER` holding unix seconds, rendered as an absolute time.
    Timestamp,
    /// `TEXT`.
    Text,
}

/// One column of a catalogued table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name.
    pub name: &'static str,
    /// Storage class.
    pub ty: ColumnType,
}

/// One catalogued table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// Table name.
    pub name: &'static str,
    /// Primary key column, used as the stable ordering tie-breaker.
    pub primary_key: &'static str,
    /// All columns in declaration order.
    pub columns: &'static [ColumnSpec],
}

impl TableSpec {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&'static ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

const fn int(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        ty: ColumnType::Integer,
    }
}

const fn ts(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        ty: ColumnType::Timestamp,
    }
}

const fn text(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        ty: ColumnType::Text,
    }
}

// =============================================================================
// Tables
// =============================================================================

/// `schema_version`
pub const SCHEMA_VERSION: TableSpec = TableSpec {
    name: "schema_version",
    primary_key: "version",
    columns: &[int("version"), text("description"), ts("applied_at")],
};

/// `players`
pub const PLAYERS: TableSpec = TableSpec {
    name: "players",
    primary_key: "player_id",
    columns: &[
        int("player_id"),
        text("name"),
        int("level"),
        text("rank"),
        int("faction_id"),
        text("status_state"),
        text("status_description"),
        int("life_current"),
        int("life_maximum"),
        ts("created_at"),
        ts("last_updated"),
    ],
};

/// `factions`
pub const FACTIONS: TableSpec = TableSpec {
    name: "factions",
    primary_key: "faction_id",
    columns: &[
        int("faction_id"),
        text("name"),
        text("tag"),
        int("leader_id"),
        int("co_leader_id"),
        int("respect"),
        int("age"),
        int("best_chain"),
        int("member_count"),
        ts("created_at"),
        ts("last_updated"),
    ],
};

/// `player_stats_history`
pub const PLAYER_STATS_HISTORY: TableSpec = TableSpec {
    name: "player_stats_history",
    primary_key: "id",
    columns: &[
        int("id"),
        int("player_id"),
        ts("recorded_at"),
        int("strength"),
        int("defense"),
        int("speed"),
        int("dexterity"),
        int("total_stats"),
        int("level"),
        int("life_maximum"),
        int("networth"),
        text("data_source"),
    ],
};

/// `faction_history`
pub const FACTION_HISTORY: TableSpec = TableSpec {
    name: "faction_history",
    primary_key: "id",
    columns: &[
        int("id"),
        int("faction_id"),
        ts("recorded_at"),
        int("respect"),
        int("member_count"),
        int("best_chain"),
        text("data_source"),
    ],
};

/// `war_status_history`
pub const WAR_STATUS_HISTORY: TableSpec = TableSpec {
    name: "war_status_history",
    primary_key: "id",
    columns: &[
        int("id"),
        int("war_id"),
        text("war_type"),
        int("territory_id"),
        int("attacking_faction_id"),
        int("defending_faction_id"),
        int("attacking_score"),
        int("defending_score"),
        int("required_score"),
        text("status"),
        ts("started_at"),
        ts("ends_at"),
        ts("recorded_at"),
        text("data_source"),
    ],
};

/// `territory_ownership_history`
pub const TERRITORY_OWNERSHIP_HISTORY: TableSpec = TableSpec {
    name: "territory_ownership_history",
    primary_key: "id",
    columns: &[
        int("id"),
        int("territory_id"),
        int("faction_id"),
        text("sector"),
        text("coordinates"),
        int("racket_level"),
        text("racket_type"),
        text("war_status"),
        ts("recorded_at"),
        text("data_source"),
    ],
};

/// `player_stats_summary`
pub const PLAYER_STATS_SUMMARY: TableSpec = TableSpec {
    name: "player_stats_summary",
    primary_key: "id",
    columns: &[
        int("id"),
        int("player_id"),
        ts("period_start"),
        ts("period_end"),
        text("period_type"),
        int("strength_start"),
        int("strength_end"),
        int("strength_change"),
        int("defense_start"),
        int("defense_end"),
        int("defense_change"),
        int("speed_start"),
        int("speed_end"),
        int("speed_change"),
        int("dexterity_start"),
        int("dexterity_end"),
        int("dexterity_change"),
        int("total_stats_start"),
        int("total_stats_end"),
        int("total_stats_change"),
        int("level_start"),
        int("level_end"),
        int("level_change"),
        int("life_maximum_start"),
        int("life_maximum_end"),
        int("life_maximum_change"),
        int("networth_start"),
        int("networth_end"),
        int("networth_change"),
        int("record_count"),
        ts("created_at"),
    ],
};

/// `faction_summary`
pub const FACTION_SUMMARY: TableSpec = TableSpec {
    name: "faction_summary",
    primary_key: "id",
    columns: &[
        int("id"),
        int("faction_id"),
        ts("period_start"),
        ts("period_end"),
        text("period_type"),
        int("respect_start"),
        int("respect_end"),
        int("respect_change"),
        int("member_count_start"),
        int("member_count_end"),
        int("member_count_change"),
        int("best_chain_start"),
        int("best_chain_end"),
        int("best_chain_change"),
        int("record_count"),
        ts("created_at"),
    ],
};

/// `war_summary`
pub const WAR_SUMMARY: TableSpec = TableSpec {
    name: "war_summary",
    primary_key: "id",
    columns: &[
        int("id"),
        int("war_id"),
        ts("period_start"),
        ts("period_end"),
        text("period_type"),
        text("war_type"),
        int("territory_id"),
        int("attacking_faction_id"),
        int("defending_faction_id"),
        int("attacking_score_start"),
        int("attacking_score_end"),
        int("attacking_score_change"),
        int("defending_score_start"),
        int("defending_score_end"),
        int("defending_score_change"),
        text("status_end"),
        int("winner_faction_id"),
        int("duration_seconds"),
        int("record_count"),
        ts("created_at"),
    ],
};

/// `territory_ownership_summary`
pub const TERRITORY_OWNERSHIP_SUMMARY: TableSpec = TableSpec {
    name: "territory_ownership_summary",
    primary_key: "id",
    columns: &[
        int("id"),
        int("territory_id"),
        ts("period_start"),
        ts("period_end"),
        text("period_type"),
        int("faction_id_start"),
        int("faction_id_end"),
        int("ownership_changes"),
        int("days_owned"),
        int("racket_level_start"),
        int("racket_level_end"),
        int("racket_level_change"),
        int("record_count"),
        ts("created_at"),
    ],
};

/// Every table reachable through the Query Gateway.
pub const ALL_TABLES: [&TableSpec; 11] = [
    &PLAYERS,
    &FACTIONS,
    &PLAYER_STATS_HISTORY,
    &FACTION_HISTORY,
    &WAR_STATUS_HISTORY,
    &TERRITORY_OWNERSHIP_HISTORY,
    &PLAYER_STATS_SUMMARY,
    &FACTION_SUMMARY,
    &WAR_SUMMARY,
    &TERRITORY_OWNERSHIP_SUMMARY,
    &SCHEMA_VERSION,
];

/// Look up a table by name in the allow-list.
pub fn table(name: &str) -> Option<&'static TableSpec> {
    ALL_TABLES.into_iter().find(|t| t.name == name)
}

// =============================================================================
// Per-kind layout
// =============================================================================

/// Tables and columns that make up one observation kind.
#[derive(Debug, Clone, Copy)]
pub struct KindLayout {
    /// Append-only history table.
    pub history: &'static TableSpec,
    /// Summary table.
    pub summary: &'static TableSpec,
    /// Grouping key column, shared by both tables.
    pub key: &'static str,
    /// Numeric fields summarized as `_start`, `_end` and `_change`.
    pub tracked: &'static [&'static str],
}

const PLAYER_STATS_LAYOUT: KindLayout = KindLayout {
    history: &PLAYER_STATS_HISTORY,
    summary: &PLAYER_STATS_SUMMARY,
    key: "player_id",
    tracked: &[
        "strength",
        "defense",
        "speed",
        "dexterity",
        "total_stats",
        "level",
        "life_maximum",
        "networth",
    ],
};

const FACTION_LAYOUT: KindLayout = KindLayout {
    history: &FACTION_HISTORY,
    summary: &FACTION_SUMMARY,
    key: "faction_id",
    tracked: &["respect", "member_count", "best_chain"],
};

const WAR_STATUS_LAYOUT: KindLayout = KindLayout {
    history: &WAR_STATUS_HISTORY,
    summary: &WAR_SUMMARY,
    key: "war_id",
    tracked: &["attacking_score", "defending_score"],
};

const TERRITORY_OWNERSHIP_LAYOUT: KindLayout = KindLayout {
    history: &TERRITORY_OWNERSHIP_HISTORY,
    summary: &TERRITORY_OWNERSHIP_SUMMARY,
    key: "territory_id",
    tracked: &["racket_level"],
};

/// The table layout for an observation kind.
pub const fn layout(kind: ObservationKind) -> &'static KindLayout {
    match kind {
        ObservationKind::PlayerStats => &PLAYER_STATS_LAYOUT,
        ObservationKind::Faction => &FACTION_LAYOUT,
        ObservationKind::WarStatus => &WAR_STATUS_LAYOUT,
        ObservationKind::TerritoryOwnership => &TERRITORY_OWNERSHIP_LAYOUT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_table_is_not_catalogued() {
        assert!(table("players").is_some());
        assert!(table("sqlite_master").is_none());
        assert!(table("players; DROP TABLE players").is_none());
    }

    #[test]
    fn every_tracked_field_has_three_summary_columns() {
        for kind in ObservationKind::ALL {
            let layout = layout(kind);
            assert!(layout.history.column(layout.key).is_some());
            assert!(layout.summary.column(layout.key).is_some());
            for field in layout.tracked {
                assert!(layout.history.column(field).is_some(), "{kind}: {field}");
                for suffix in ["start", "end", "change"] {
                    let column = format!("{field}_{suffix}");
                    assert!(layout.summary.column(&column).is_some(), "{kind}: {column}");
                }
            }
        }
    }

    #[test]
    fn primary_keys_are_columns() {
        for table in ALL_TABLES {
            assert!(table.column(table.primary_key).is_some(), "{}", table.name);
        }
    }
}
