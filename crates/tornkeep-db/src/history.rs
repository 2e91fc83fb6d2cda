//! History Recorder: append-only observation rows.
//!
//! Every append inserts a fresh row stamped with the clock's `recorded_at`.
//! Nothing here updates, merges or deduplicates. Referenced players and
//! factions are checked inside the insert transaction; the foreign keys in
//! the schema back the check up.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, Sqlite, SqlitePool, Transaction};
use tornkeep_types::{
    FactionId, FactionObservation, Observation, ObservationKind, PlayerId, PlayerStatsObservation,
    RecordId, TerritoryOwnershipObservation, Validate, ValidationError, WarStatusObservation,
};

use crate::catalog;
use crate::clock::Clock;
use crate::error::WriteError;
use crate::sqlite::{begin_write, from_unix};

/// A stored player-stats observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatsRecord {
    /// Row identifier.
    pub id: RecordId,
    /// When the observation was appended.
    pub recorded_at: DateTime<Utc>,
    /// Observed values.
    pub observation: PlayerStatsObservation,
}

impl FromRow<'_, SqliteRow> for PlayerStatsRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: RecordId::new(row.try_get("id")?),
            recorded_at: from_unix(row.try_get("recorded_at")?),
            observation: PlayerStatsObservation {
                player_id: PlayerId::new(row.try_get("player_id")?),
                strength: row.try_get("strength")?,
                defense: row.try_get("defense")?,
                speed: row.try_get("speed")?,
                dexterity: row.try_get("dexterity")?,
                total_stats: row.try_get("total_stats")?,
                level: row.try_get("level")?,
                life_maximum: row.try_get("life_maximum")?,
                networth: row.try_get("networth")?,
                data_source: row.try_get("data_source")?,
            },
        })
    }
}

/// A stored faction observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactionHistoryRecord {
    /// Row identifier.
    pub id: RecordId,
    /// When the observation was appended.
    pub recorded_at: DateTime<Utc>,
    /// Observed values.
    pub observation: FactionObservation,
}

impl FromRow<'_, SqliteRow> for FactionHistoryRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: RecordId::new(row.try_get("id")?),
            recorded_at: from_unix(row.try_get("recorded_at")?),
            observation: FactionObservation {
                faction_id: FactionId::new(row.try_get("faction_id")?),
                respect: row.try_get("respect")?,
                member_count: row.try_get("member_count")?,
                best_chain: row.try_get("best_chain")?,
                data_source: row.try_get("data_source")?,
            },
        })
    }
}

/// Appends and reads of observation history.
pub struct HistoryRecorder<'a> {
    writer: &'a SqlitePool,
    reader: &'a SqlitePool,
    clock: &'a dyn Clock,
}

impl<'a> HistoryRecorder<'a> {
    /// Create a view over the store's pools.
    pub const fn new(writer: &'a SqlitePool, reader: &'a SqlitePool, clock: &'a dyn Clock) -> Self {
        Self {
            writer,
            reader,
            clock,
        }
    }

    /// Append one observation and return its new row ID.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Validation`] if a field constraint fails or a
    /// referenced player/faction does not exist. Nothing is written in that
    /// case.
    pub async fn append(&self, observation: &Observation) -> Result<RecordId, WriteError> {
        observation.validate()?;
        let recorded_at = self.clock.now().timestamp();

        let mut tx = begin_write(self.writer).await?;
        let id = match observation {
            Observation::PlayerStats(o) => insert_player_stats(&mut tx, o, recorded_at).await?,
            Observation::Faction(o) => insert_faction(&mut tx, o, recorded_at).await?,
            Observation::WarStatus(o) => insert_war_status(&mut tx, o, recorded_at).await?,
            Observation::TerritoryOwnership(o) => {
                insert_territory(&mut tx, o, recorded_at).await?
            }
        };
        tx.commit().await?;

        tracing::debug!(
            kind = %observation.kind(),
            record_id = id,
            recorded_at,
            "Appended observation"
        );
        Ok(RecordId::new(id))
    }

    /// Most recent stat observations for a player, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if the read fails.
    pub async fn recent_player_stats(
        &self,
        player_id: PlayerId,
        limit: u32,
    ) -> Result<Vec<PlayerStatsRecord>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM player_stats_history WHERE player_id = ? \
             ORDER BY recorded_at DESC, id DESC LIMIT ?",
        )
        .bind(player_id.into_inner())
        .bind(i64::from(limit))
        .fetch_all(self.reader)
        .await
    }

    /// Most recent metric observations for a faction, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if the read fails.
    pub async fn recent_faction_history(
        &self,
        faction_id: FactionId,
        limit: u32,
    ) -> Result<Vec<FactionHistoryRecord>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM faction_history WHERE faction_id = ? \
             ORDER BY recorded_at DESC, id DESC LIMIT ?",
        )
        .bind(faction_id.into_inner())
        .bind(i64::from(limit))
        .fetch_all(self.reader)
        .await
    }

    /// Number of history rows of one kind.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if the read fails.
    pub async fn count(&self, kind: ObservationKind) -> Result<i64, sqlx::Error> {
        let table = catalog::layout(kind).history.name;
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.reader)
            .await
    }
}

/// A referenced row: entity label and existence probe.
struct Reference {
    entity: &'static str,
    probe: &'static str,
}

const PLAYER: Reference = Reference {
    entity: "player",
    probe: "SELECT 1 FROM players WHERE player_id = ?",
};

const FACTION: Reference = Reference {
    entity: "faction",
    probe: "SELECT 1 FROM factions WHERE faction_id = ?",
};

async fn require(
    tx: &mut Transaction<'_, Sqlite>,
    reference: &Reference,
    id: i64,
) -> Result<(), WriteError> {
    let found: Option<i64> = sqlx::query_scalar(reference.probe)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    if found.is_none() {
        return Err(ValidationError::MissingReference {
            entity: reference.entity,
            id,
        }
        .into());
    }
    Ok(())
}

async fn require_faction(
    tx: &mut Transaction<'_, Sqlite>,
    id: Option<FactionId>,
) -> Result<(), WriteError> {
    match id {
        Some(id) => require(tx, &FACTION, id.into_inner()).await,
        None => Ok(()),
    }
}

async fn insert_player_stats(
    tx: &mut Transaction<'_, Sqlite>,
    o: &PlayerStatsObservation,
    recorded_at: i64,
) -> Result<i64, WriteError> {
    require(tx, &PLAYER, o.player_id.into_inner()).await?;
    let result = sqlx::query(
        r"INSERT INTO player_stats_history (
            player_id, recorded_at, strength, defense, speed, dexterity,
            total_stats, level, life_maximum, networth, data_source
          ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(o.player_id.into_inner())
    .bind(recorded_at)
    .bind(o.strength)
    .bind(o.defense)
    .bind(o.speed)
    .bind(o.dexterity)
    .bind(o.total_stats)
    .bind(o.level)
    .bind(o.life_maximum)
    .bind(o.networth)
    .bind(&o.data_source)
    .execute(&mut **tx)
    .await?;
    Ok(result.last_insert_rowid())
}

async fn insert_faction(
    tx: &mut Transaction<'_, Sqlite>,
    o: &FactionObservation,
    recorded_at: i64,
) -> Result<i64, WriteError> {
    require(tx, &FACTION, o.faction_id.into_inner()).await?;
    let result = sqlx::query(
        r"INSERT INTO faction_history (
            faction_id, recorded_at, respect, member_count, best_chain, data_source
          ) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(o.faction_id.into_inner())
    .bind(recorded_at)
    .bind(o.respect)
    .bind(o.member_count)
    .bind(o.best_chain)
    .bind(&o.data_source)
    .execute(&mut **tx)
    .await?;
    Ok(result.last_insert_rowid())
}

async fn insert_war_status(
    tx: &mut Transaction<'_, Sqlite>,
    o: &WarStatusObservation,
    recorded_at: i64,
) -> Result<i64, WriteError> {
    require_faction(tx, o.attacking_faction_id).await?;
    require_faction(tx, o.defending_faction_id).await?;
    let result = sqlx::query(
        r"INSERT INTO war_status_history (
            war_id, war_type, territory_id, attacking_faction_id, defending_faction_id,
            attacking_score, defending_score, required_score, status,
            started_at, ends_at, recorded_at, data_source
          ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(o.war_id.into_inner())
    .bind(o.war_type.as_str())
    .bind(o.territory_id.map(i64::from))
    .bind(o.attacking_faction_id.map(FactionId::into_inner))
    .bind(o.defending_faction_id.map(FactionId::into_inner))
    .bind(o.attacking_score)
    .bind(o.defending_score)
    .bind(o.required_score)
    .bind(o.status.map(|s| s.as_str()))
    .bind(o.started_at.map(|t| t.timestamp()))
    .bind(o.ends_at.map(|t| t.timestamp()))
    .bind(recorded_at)
    .bind(&o.data_source)
    .execute(&mut **tx)
    .await?;
    Ok(result.last_insert_rowid())
}

async fn insert_territory(
    tx: &mut Transaction<'_, Sqlite>,
    o: &TerritoryOwnershipObservation,
    recorded_at: i64,
) -> Result<i64, WriteError> {
    require_faction(tx, o.faction_id).await?;
    let result = sqlx::query(
        r"INSERT INTO territory_ownership_history (
            territory_id, faction_id, sector, coordinates, racket_level,
            racket_type, war_status, recorded_at, data_source
          ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(o.territory_id.into_inner())
    .bind(o.faction_id.map(FactionId::into_inner))
    .bind(&o.sector)
    .bind(&o.coordinates)
    .bind(o.racket_level)
    .bind(&o.racket_type)
    .bind(o.war_status.map(|s| s.as_str()))
    .bind(recorded_at)
    .bind(&o.data_source)
    .execute(&mut **tx)
    .await?;
    Ok(result.last_insert_rowid())
}
