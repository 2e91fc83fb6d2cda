//! Enumeration types shared by the store and its callers.
//!
//! Every enumeration that is persisted has a stable lowercase string form
//! ([`as_str`](ObservationKind::as_str)) which is what the database holds in
//! its `TEXT` columns and `CHECK (... IN (...))` constraints.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

// ---------------------------------------------------------------------------
// Entities and observations
// ---------------------------------------------------------------------------

/// A kind of current-state entity owned by the State Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A single player.
    Player,
    /// A faction (player group).
    Faction,
}

impl EntityKind {
    /// Stable string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Faction => "faction",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kind of append-only observation held by the History Recorder.
///
/// Each kind owns exactly one history table and one summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    /// Periodic battle-stat snapshot for one player.
    PlayerStats,
    /// Periodic metric snapshot for one faction.
    Faction,
    /// Score and status snapshot for one war.
    WarStatus,
    /// Owner and racket snapshot for one territory.
    TerritoryOwnership,
}

impl ObservationKind {
    /// Every observation kind, in the order maintenance processes them.
    pub const ALL: [Self; 4] = [
        Self::PlayerStats,
        Self::Faction,
        Self::WarStatus,
        Self::TerritoryOwnership,
    ];

    /// Stable string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlayerStats => "player_stats",
            Self::Faction => "faction",
            Self::WarStatus => "war_status",
            Self::TerritoryOwnership => "territory_ownership",
        }
    }
}

impl fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObservationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::Malformed(format!("unknown observation kind `{s}`")))
    }
}

// ---------------------------------------------------------------------------
// Summary periods
// ---------------------------------------------------------------------------

/// Granularity label stored alongside every summary row.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    /// One calendar day.
    Daily,
    /// One week.
    Weekly,
    /// One calendar month. The baseline retention policy.
    #[default]
    Monthly,
}

impl PeriodType {
    /// Stable string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a period type label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized period type `{0}`")]
pub struct UnknownPeriodType(pub String);

impl FromStr for PeriodType {
    type Err = UnknownPeriodType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(UnknownPeriodType(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// War and territory enumerations
// ---------------------------------------------------------------------------

/// The kind of war being observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarType {
    /// A fight over a territory block.
    Territory,
    /// A ranked war between two factions.
    Ranked,
}

impl WarType {
    /// Stable string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Territory => "territory",
            Self::Ranked => "ranked",
        }
    }
}

/// Lifecycle state of a war.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarStatus {
    /// Still being fought.
    Ongoing,
    /// Finished with a result.
    Completed,
    /// Called off before completion.
    Cancelled,
}

impl WarStatus {
    /// Stable string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Whether a territory is currently involved in a war.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerritoryWarStatus {
    /// Not contested.
    None,
    /// Being attacked by another faction.
    UnderAttack,
    /// Its owner is defending it.
    Defending,
}

impl TerritoryWarStatus {
    /// Stable string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::UnderAttack => "under_attack",
            Self::Defending => "defending",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_kind_round_trips_through_str() {
        for kind in ObservationKind::ALL {
            assert_eq!(kind.as_str().parse::<ObservationKind>().ok(), Some(kind));
        }
    }

    #[test]
    fn unknown_period_type_is_rejected() {
        let err = "fortnightly".parse::<PeriodType>();
        assert_eq!(err, Err(UnknownPeriodType(String::from("fortnightly"))));
        assert_eq!("monthly".parse::<PeriodType>(), Ok(PeriodType::Monthly));
    }

    #[test]
    fn serde_names_match_column_strings() {
        let json = serde_json::to_string(&TerritoryWarStatus::UnderAttack).unwrap_or_default();
        assert_eq!(json, format!("\"{}\"", TerritoryWarStatus::UnderAttack.as_str()));
    }
}
