//! Shared type definitions for the tornkeep game-data store.
//!
//! This crate is the single source of truth for the records that flow into
//! and out of the store. It has no storage dependency: the database crate
//! consumes these types, and so does any collaborator that feeds snapshots
//! in.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for external and store-assigned IDs
//! - [`enums`] -- Entity, observation, period and war enumerations
//! - [`payloads`] -- Typed entity and observation write payloads
//! - [`snapshot`] -- Tagged ingestion payload and its routing
//! - [`validation`] -- Field constraints and [`ValidationError`]

pub mod enums;
pub mod ids;
pub mod payloads;
pub mod snapshot;
pub mod validation;

// Re-export all public types at crate root for convenience.
pub use enums::{
    EntityKind, ObservationKind, PeriodType, TerritoryWarStatus, UnknownPeriodType, WarStatus,
    WarType,
};
pub use ids::{FactionId, PlayerId, RecordId, TerritoryId, WarId};
pub use payloads::{
    EntityUpsert, FactionObservation, FactionProfile, Observation, PlayerProfile,
    PlayerStatsObservation, TerritoryOwnershipObservation, WarStatusObservation,
};
pub use snapshot::{Routed, Snapshot};
pub use validation::{Validate, ValidationError};
