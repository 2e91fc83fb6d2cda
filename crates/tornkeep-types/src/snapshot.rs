//! The ingestion boundary: one tagged payload per snapshot kind.
//!
//! The API-polling collaborator hands over loosely-typed JSON. It is decoded
//! here into a [`Snapshot`], rejecting unknown kinds and unknown fields, and
//! then split into either an [`EntityUpsert`] or an [`Observation`].
//!
//! Wire shape:
//!
//! ```json
//! { "kind": "player_stats", "data": { "player_id": 7, "strength": 100 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::payloads::{
    EntityUpsert, FactionObservation, FactionProfile, Observation, PlayerProfile,
    PlayerStatsObservation, TerritoryOwnershipObservation, WarStatusObservation,
};
use crate::validation::{Validate, ValidationError};

/// A decoded snapshot, ready to be routed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case", deny_unknown_fields)]
pub enum Snapshot {
    /// Current player profile.
    Player(PlayerProfile),
    /// Current faction profile.
    Faction(FactionProfile),
    /// Player battle-stat observation.
    PlayerStats(PlayerStatsObservation),
    /// Faction metric observation.
    FactionMetrics(FactionObservation),
    /// War status observation.
    WarStatus(WarStatusObservation),
    /// Territory ownership observation.
    TerritoryOwnership(TerritoryOwnershipObservation),
}

/// Where a snapshot goes once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Current-state upsert.
    Entity(EntityUpsert),
    /// History append.
    Observation(Observation),
}

impl Snapshot {
    /// Decode and validate a raw JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Malformed`] for unknown kinds, unknown or
    /// mistyped fields, and any field constraint violation from
    /// [`Validate`].
    pub fn from_json(value: serde_json::Value) -> Result<Self, ValidationError> {
        let snapshot: Self = serde_json::from_value(value)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Split into the store operation this snapshot drives.
    pub fn route(self) -> Routed {
        match self {
            Self::Player(p) => Routed::Entity(EntityUpsert::Player(p)),
            Self::Faction(f) => Routed::Entity(EntityUpsert::Faction(f)),
            Self::PlayerStats(o) => Routed::Observation(Observation::PlayerStats(o)),
            Self::FactionMetrics(o) => Routed::Observation(Observation::Faction(o)),
            Self::WarStatus(o) => Routed::Observation(Observation::WarStatus(o)),
            Self::TerritoryOwnership(o) => {
                Routed::Observation(Observation::TerritoryOwnership(o))
            }
        }
    }
}

impl Validate for Snapshot {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Player(p) => p.validate(),
            Self::Faction(f) => f.validate(),
            Self::PlayerStats(o) => o.validate(),
            Self::FactionMetrics(o) => o.validate(),
            Self::WarStatus(o) => o.validate(),
            Self::TerritoryOwnership(o) => o.validate(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::enums::{WarStatus, WarType};
    use crate::ids::{PlayerId, WarId};

    #[test]
    fn decodes_player_stats() {
        let snapshot = Snapshot::from_json(json!({
            "kind": "player_stats",
            "data": { "player_id": 7, "strength": 100, "data_source": "key...abcd" }
        }));
        let Ok(Snapshot::PlayerStats(obs)) = &snapshot else {
            panic!("expected player stats, got {snapshot:?}");
        };
        assert_eq!(obs.player_id, PlayerId::new(7));
        assert_eq!(obs.strength, Some(100));
        assert_eq!(obs.defense, None);
    }

    #[test]
    fn unknown_field_is_malformed() {
        let result = Snapshot::from_json(json!({
            "kind": "player",
            "data": { "player_id": 1, "name": "Duke", "karma": 3 }
        }));
        assert!(matches!(result, Err(ValidationError::Malformed(_))));
    }

    #[test]
    fn unknown_kind_is_malformed() {
        let result = Snapshot::from_json(json!({ "kind": "stock_market", "data": {} }));
        assert!(matches!(result, Err(ValidationError::Malformed(_))));
    }

    #[test]
    fn constraint_violation_is_reported_after_decoding() {
        let result = Snapshot::from_json(json!({
            "kind": "player",
            "data": { "player_id": 1, "name": "Duke", "life_maximum": 0 }
        }));
        assert!(matches!(
            result,
            Err(ValidationError::OutOfRange { field: "life_maximum", .. })
        ));
    }

    #[test]
    fn war_timestamps_are_unix_seconds() {
        let snapshot = Snapshot::from_json(json!({
            "kind": "war_status",
            "data": {
                "war_id": 55,
                "war_type": "ranked",
                "status": "ongoing",
                "started_at": 1_700_000_000
            }
        }));
        let Ok(Snapshot::WarStatus(obs)) = &snapshot else {
            panic!("expected war status, got {snapshot:?}");
        };
        assert_eq!(obs.war_id, WarId::new(55));
        assert_eq!(obs.war_type, WarType::Ranked);
        assert_eq!(obs.status, Some(WarStatus::Ongoing));
        assert_eq!(obs.started_at.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn faction_metrics_route_to_history() {
        let snapshot = Snapshot::from_json(json!({
            "kind": "faction_metrics",
            "data": { "faction_id": 9, "respect": 1000 }
        }));
        let routed = snapshot.map(Snapshot::route);
        assert!(matches!(routed, Ok(Routed::Observation(Observation::Faction(_)))));
    }
}
