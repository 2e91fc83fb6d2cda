//! Typed write payloads for entities and observations.
//!
//! These are the fixed records the store accepts. Loosely-typed API data is
//! coerced into them at the ingestion boundary (see [`crate::snapshot`]);
//! nothing downstream ever sees an untyped map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{EntityKind, ObservationKind, TerritoryWarStatus, WarStatus, WarType};
use crate::ids::{FactionId, PlayerId, TerritoryId, WarId};
use crate::validation::{
    Validate, ValidationError, at_least_one, non_negative, positive, required_text,
};

// =============================================================================
// Current-state entities
// =============================================================================

/// Latest known profile of a player.
///
/// Every upsert overwrites all mutable fields with these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerProfile {
    /// The player's external ID.
    pub player_id: PlayerId,
    /// Display name. Required.
    pub name: String,
    /// Character level (`>= 1`).
    #[serde(default)]
    pub level: Option<i64>,
    /// Rank title.
    #[serde(default)]
    pub rank: Option<String>,
    /// Faction the player belongs to.
    #[serde(default)]
    pub faction_id: Option<FactionId>,
    /// Status state (e.g. `Okay`, `Hospital`).
    #[serde(default)]
    pub status_state: Option<String>,
    /// Free-text status description.
    #[serde(default)]
    pub status_description: Option<String>,
    /// Current life (`>= 0`).
    #[serde(default)]
    pub life_current: Option<i64>,
    /// Maximum life (`> 0`).
    #[serde(default)]
    pub life_maximum: Option<i64>,
}

impl PlayerProfile {
    /// Profile with only the required fields set.
    pub fn new(player_id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            player_id,
            name: name.into(),
            level: None,
            rank: None,
            faction_id: None,
            status_state: None,
            status_description: None,
            life_current: None,
            life_maximum: None,
        }
    }
}

impl Validate for PlayerProfile {
    fn validate(&self) -> Result<(), ValidationError> {
        required_text("name", &self.name)?;
        at_least_one("level", self.level)?;
        non_negative("life_current", self.life_current)?;
        positive("life_maximum", self.life_maximum)
    }
}

/// Latest known profile of a faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactionProfile {
    /// The faction's external ID.
    pub faction_id: FactionId,
    /// Faction name. Required.
    pub name: String,
    /// Short tag.
    #[serde(default)]
    pub tag: Option<String>,
    /// Leader's player ID.
    #[serde(default)]
    pub leader_id: Option<PlayerId>,
    /// Co-leader's player ID.
    #[serde(default)]
    pub co_leader_id: Option<PlayerId>,
    /// Respect (`>= 0`).
    #[serde(default)]
    pub respect: Option<i64>,
    /// Age in days (`>= 0`).
    #[serde(default)]
    pub age: Option<i64>,
    /// Best chain (`>= 0`).
    #[serde(default)]
    pub best_chain: Option<i64>,
    /// Member count (`>= 0`).
    #[serde(default)]
    pub member_count: Option<i64>,
}

impl FactionProfile {
    /// Profile with only the required fields set.
    pub fn new(faction_id: FactionId, name: impl Into<String>) -> Self {
        Self {
            faction_id,
            name: name.into(),
            tag: None,
            leader_id: None,
            co_leader_id: None,
            respect: None,
            age: None,
            best_chain: None,
            member_count: None,
        }
    }
}

impl Validate for FactionProfile {
    fn validate(&self) -> Result<(), ValidationError> {
        required_text("name", &self.name)?;
        non_negative("respect", self.respect)?;
        non_negative("age", self.age)?;
        non_negative("best_chain", self.best_chain)?;
        non_negative("member_count", self.member_count)
    }
}

/// An upsert request for one current-state entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityUpsert {
    /// Upsert a player row.
    Player(PlayerProfile),
    /// Upsert a faction row.
    Faction(FactionProfile),
}

impl EntityUpsert {
    /// Which entity table this upsert targets.
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Player(_) => EntityKind::Player,
            Self::Faction(_) => EntityKind::Faction,
        }
    }

    /// The external ID being upserted.
    pub const fn id(&self) -> i64 {
        match self {
            Self::Player(p) => p.player_id.into_inner(),
            Self::Faction(f) => f.faction_id.into_inner(),
        }
    }
}

impl Validate for EntityUpsert {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Player(p) => p.validate(),
            Self::Faction(f) => f.validate(),
        }
    }
}

// =============================================================================
// Observations
// =============================================================================

/// One battle-stat snapshot for a player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerStatsObservation {
    /// The observed player. Must already exist.
    pub player_id: PlayerId,
    /// Strength (`>= 0`).
    #[serde(default)]
    pub strength: Option<i64>,
    /// Defense (`>= 0`).
    #[serde(default)]
    pub defense: Option<i64>,
    /// Speed (`>= 0`).
    #[serde(default)]
    pub speed: Option<i64>,
    /// Dexterity (`>= 0`).
    #[serde(default)]
    pub dexterity: Option<i64>,
    /// Sum of the four battle stats (`>= 0`).
    #[serde(default)]
    pub total_stats: Option<i64>,
    /// Level (`>= 1`).
    #[serde(default)]
    pub level: Option<i64>,
    /// Maximum life (`> 0`).
    #[serde(default)]
    pub life_maximum: Option<i64>,
    /// Net worth. May be negative.
    #[serde(default)]
    pub networth: Option<i64>,
    /// Masked identifier of the API key that produced the data.
    #[serde(default)]
    pub data_source: Option<String>,
}

impl Validate for PlayerStatsObservation {
    fn validate(&self) -> Result<(), ValidationError> {
        non_negative("strength", self.strength)?;
        non_negative("defense", self.defense)?;
        non_negative("speed", self.speed)?;
        non_negative("dexterity", self.dexterity)?;
        non_negative("total_stats", self.total_stats)?;
        at_least_one("level", self.level)?;
        positive("life_maximum", self.life_maximum)
    }
}

/// One metric snapshot for a faction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactionObservation {
    /// The observed faction. Must already exist.
    pub faction_id: FactionId,
    /// Respect (`>= 0`).
    #[serde(default)]
    pub respect: Option<i64>,
    /// Member count (`>= 0`).
    #[serde(default)]
    pub member_count: Option<i64>,
    /// Best chain (`>= 0`).
    #[serde(default)]
    pub best_chain: Option<i64>,
    /// Masked identifier of the API key that produced the data.
    #[serde(default)]
    pub data_source: Option<String>,
}

impl Validate for FactionObservation {
    fn validate(&self) -> Result<(), ValidationError> {
        non_negative("respect", self.respect)?;
        non_negative("member_count", self.member_count)?;
        non_negative("best_chain", self.best_chain)
    }
}

/// One score/status snapshot of a war.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarStatusObservation {
    /// The observed war.
    pub war_id: WarId,
    /// Territory or ranked.
    pub war_type: WarType,
    /// Contested territory, for territory wars.
    #[serde(default)]
    pub territory_id: Option<TerritoryId>,
    /// Attacking faction. Must exist when set.
    #[serde(default)]
    pub attacking_faction_id: Option<FactionId>,
    /// Defending faction. Must exist when set.
    #[serde(default)]
    pub defending_faction_id: Option<FactionId>,
    /// Attacker's score (`>= 0`).
    #[serde(default)]
    pub attacking_score: Option<i64>,
    /// Defender's score (`>= 0`).
    #[serde(default)]
    pub defending_score: Option<i64>,
    /// Score needed to win (`>= 0`).
    #[serde(default)]
    pub required_score: Option<i64>,
    /// Lifecycle state.
    #[serde(default)]
    pub status: Option<WarStatus>,
    /// When the war started.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the war ends or ended.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub ends_at: Option<DateTime<Utc>>,
    /// Masked identifier of the API key that produced the data.
    #[serde(default)]
    pub data_source: Option<String>,
}

impl WarStatusObservation {
    /// Observation with only the identifying fields set.
    pub const fn new(war_id: WarId, war_type: WarType) -> Self {
        Self {
            war_id,
            war_type,
            territory_id: None,
            attacking_faction_id: None,
            defending_faction_id: None,
            attacking_score: None,
            defending_score: None,
            required_score: None,
            status: None,
            started_at: None,
            ends_at: None,
            data_source: None,
        }
    }
}

impl Validate for WarStatusObservation {
    fn validate(&self) -> Result<(), ValidationError> {
        non_negative("attacking_score", self.attacking_score)?;
        non_negative("defending_score", self.defending_score)?;
        non_negative("required_score", self.required_score)
    }
}

/// One ownership snapshot of a territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TerritoryOwnershipObservation {
    /// The observed territory.
    pub territory_id: TerritoryId,
    /// Owning faction, if any. Must exist when set.
    #[serde(default)]
    pub faction_id: Option<FactionId>,
    /// Map sector.
    #[serde(default)]
    pub sector: Option<String>,
    /// Map coordinates.
    #[serde(default)]
    pub coordinates: Option<String>,
    /// Racket level (`>= 0`).
    #[serde(default)]
    pub racket_level: Option<i64>,
    /// Racket name.
    #[serde(default)]
    pub racket_type: Option<String>,
    /// Whether the territory is contested.
    #[serde(default)]
    pub war_status: Option<TerritoryWarStatus>,
    /// Masked identifier of the API key that produced the data.
    #[serde(default)]
    pub data_source: Option<String>,
}

impl TerritoryOwnershipObservation {
    /// Observation with only the territory set.
    pub const fn new(territory_id: TerritoryId) -> Self {
        Self {
            territory_id,
            faction_id: None,
            sector: None,
            coordinates: None,
            racket_level: None,
            racket_type: None,
            war_status: None,
            data_source: None,
        }
    }
}

impl Validate for TerritoryOwnershipObservation {
    fn validate(&self) -> Result<(), ValidationError> {
        non_negative("racket_level", self.racket_level)
    }
}

/// An append request for one observation, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Append to `player_stats_history`.
    PlayerStats(PlayerStatsObservation),
    /// Append to `faction_history`.
    Faction(FactionObservation),
    /// Append to `war_status_history`.
    WarStatus(WarStatusObservation),
    /// Append to `territory_ownership_history`.
    TerritoryOwnership(TerritoryOwnershipObservation),
}

impl Observation {
    /// The observation kind, which selects the history table.
    pub const fn kind(&self) -> ObservationKind {
        match self {
            Self::PlayerStats(_) => ObservationKind::PlayerStats,
            Self::Faction(_) => ObservationKind::Faction,
            Self::WarStatus(_) => ObservationKind::WarStatus,
            Self::TerritoryOwnership(_) => ObservationKind::TerritoryOwnership,
        }
    }
}

impl Validate for Observation {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::PlayerStats(o) => o.validate(),
            Self::Faction(o) => o.validate(),
            Self::WarStatus(o) => o.validate(),
            Self::TerritoryOwnership(o) => o.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_level_zero_is_rejected() {
        let mut profile = PlayerProfile::new(PlayerId::new(1), "Duke");
        profile.level = Some(0);
        assert!(matches!(
            profile.validate(),
            Err(ValidationError::OutOfRange { field: "level", .. })
        ));
    }

    #[test]
    fn faction_without_name_is_rejected() {
        let profile = FactionProfile::new(FactionId::new(3), "");
        assert_eq!(
            EntityUpsert::Faction(profile).validate(),
            Err(ValidationError::MissingField { field: "name" })
        );
    }

    #[test]
    fn negative_networth_is_allowed() {
        let obs = PlayerStatsObservation {
            player_id: PlayerId::new(7),
            networth: Some(-500),
            ..PlayerStatsObservation::default()
        };
        assert!(obs.validate().is_ok());
    }

    #[test]
    fn negative_score_is_rejected() {
        let mut obs = WarStatusObservation::new(WarId::new(1), WarType::Ranked);
        obs.defending_score = Some(-1);
        assert!(Observation::WarStatus(obs).validate().is_err());
    }

    #[test]
    fn observation_kind_matches_variant() {
        let obs = Observation::TerritoryOwnership(TerritoryOwnershipObservation::new(
            TerritoryId::new(4),
        ));
        assert_eq!(obs.kind(), ObservationKind::TerritoryOwnership);
    }
}
