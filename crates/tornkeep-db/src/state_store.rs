//! State Store: the current-state rows of players and factions.
//!
//! An upsert is a read-check followed by either an `INSERT` or an `UPDATE`,
//! inside one transaction on the writer pool. `created_at` is written only
//! by the insert branch. All writers share the single writer connection, so
//! concurrent upserts to the same ID apply whole, in commit order.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, Sqlite, SqlitePool, Transaction};
use tornkeep_types::{
    EntityKind, EntityUpsert, FactionId, FactionProfile, PlayerId, PlayerProfile, Validate,
};

use crate::clock::Clock;
use crate::error::WriteError;
use crate::sqlite::{begin_write, from_unix};

/// A stored player row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Latest profile values.
    pub profile: PlayerProfile,
    /// When the row was first inserted.
    pub created_at: DateTime<Utc>,
    /// When the row was last upserted.
    pub last_updated: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for PlayerRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            profile: PlayerProfile {
                player_id: PlayerId::new(row.try_get("player_id")?),
                name: row.try_get("name")?,
                level: row.try_get("level")?,
                rank: row.try_get("rank")?,
                faction_id: row
                    .try_get::<Option<i64>, _>("faction_id")?
                    .map(FactionId::new),
                status_state: row.try_get("status_state")?,
                status_description: row.try_get("status_description")?,
                life_current: row.try_get("life_current")?,
                life_maximum: row.try_get("life_maximum")?,
            },
            created_at: from_unix(row.try_get("created_at")?),
            last_updated: from_unix(row.try_get("last_updated")?),
        })
    }
}

/// A stored faction row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactionRecord {
    /// Latest profile values.
    pub profile: FactionProfile,
    /// When the row was first inserted.
    pub created_at: DateTime<Utc>,
    /// When the row was last upserted.
    pub last_updated: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for FactionRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            profile: FactionProfile {
                faction_id: FactionId::new(row.try_get("faction_id")?),
                name: row.try_get("name")?,
                tag: row.try_get("tag")?,
                leader_id: row.try_get::<Option<i64>, _>("leader_id")?.map(PlayerId::new),
                co_leader_id: row
                    .try_get::<Option<i64>, _>("co_leader_id")?
                    .map(PlayerId::new),
                respect: row.try_get("respect")?,
                age: row.try_get("age")?,
                best_chain: row.try_get("best_chain")?,
                member_count: row.try_get("member_count")?,
            },
            created_at: from_unix(row.try_get("created_at")?),
            last_updated: from_unix(row.try_get("last_updated")?),
        })
    }
}

/// Upserts and typed reads of current-state entities.
pub struct StateStore<'a> {
    writer: &'a SqlitePool,
    reader: &'a SqlitePool,
    clock: &'a dyn Clock,
}

impl<'a> StateStore<'a> {
    /// Create a view over the store's pools.
    pub const fn new(writer: &'a SqlitePool, reader: &'a SqlitePool, clock: &'a dyn Clock) -> Self {
        Self {
            writer,
            reader,
            clock,
        }
    }

    /// Insert or overwrite one entity.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Validation`] if the payload fails a field
    /// constraint (checked before any transaction opens, and again by the
    /// engine), leaving every row unchanged.
    pub async fn upsert(&self, entity: &EntityUpsert) -> Result<(), WriteError> {
        match entity {
            EntityUpsert::Player(p) => self.upsert_player(p).await,
            EntityUpsert::Faction(f) => self.upsert_faction(f).await,
        }
    }

    /// Insert or overwrite a player.
    ///
    /// A `faction_id` with no faction row yet gets a placeholder faction in
    /// the same transaction; the next faction upsert overwrites it.
    ///
    /// # Errors
    ///
    /// See [`StateStore::upsert`].
    pub async fn upsert_player(&self, profile: &PlayerProfile) -> Result<(), WriteError> {
        profile.validate()?;
        let now = self.clock.now().timestamp();
        let id = profile.player_id.into_inner();

        let mut tx = begin_write(self.writer).await?;
        if let Some(faction_id) = profile.faction_id {
            ensure_faction(&mut tx, faction_id, now).await?;
        }

        let exists = row_exists(&mut tx, "SELECT 1 FROM players WHERE player_id = ?", id).await?;
        let sql = if exists {
            r"UPDATE players SET
                name = ?2, level = ?3, rank = ?4, faction_id = ?5,
                status_state = ?6, status_description = ?7,
                life_current = ?8, life_maximum = ?9, last_updated = ?10
              WHERE player_id = ?1"
        } else {
            r"INSERT INTO players (
                player_id, name, level, rank, faction_id, status_state,
                status_description, life_current, life_maximum, last_updated, created_at
              ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)"
        };
        sqlx::query(sql)
            .bind(id)
            .bind(&profile.name)
            .bind(profile.level)
            .bind(&profile.rank)
            .bind(profile.faction_id.map(FactionId::into_inner))
            .bind(&profile.status_state)
            .bind(&profile.status_description)
            .bind(profile.life_current)
            .bind(profile.life_maximum)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(player_id = id, inserted = !exists, "Upserted player");
        Ok(())
    }

    /// Insert or overwrite a faction.
    ///
    /// # Errors
    ///
    /// See [`StateStore::upsert`].
    pub async fn upsert_faction(&self, profile: &FactionProfile) -> Result<(), WriteError> {
        profile.validate()?;
        let now = self.clock.now().timestamp();
        let id = profile.faction_id.into_inner();

        let mut tx = begin_write(self.writer).await?;
        let exists = row_exists(&mut tx, "SELECT 1 FROM factions WHERE faction_id = ?", id).await?;
        let sql = if exists {
            r"UPDATE factions SET
                name = ?2, tag = ?3, leader_id = ?4, co_leader_id = ?5,
                respect = ?6, age = ?7, best_chain = ?8, member_count = ?9,
                last_updated = ?10
              WHERE faction_id = ?1"
        } else {
            r"INSERT INTO factions (
                faction_id, name, tag, leader_id, co_leader_id, respect,
                age, best_chain, member_count, last_updated, created_at
              ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)"
        };
        sqlx::query(sql)
            .bind(id)
            .bind(&profile.name)
            .bind(&profile.tag)
            .bind(profile.leader_id.map(PlayerId::into_inner))
            .bind(profile.co_leader_id.map(PlayerId::into_inner))
            .bind(profile.respect)
            .bind(profile.age)
            .bind(profile.best_chain)
            .bind(profile.member_count)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(faction_id = id, inserted = !exists, "Upserted faction");
        Ok(())
    }

    /// Fetch one player.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if the read fails.
    pub async fn player(&self, id: PlayerId) -> Result<Option<PlayerRecord>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM players WHERE player_id = ?")
            .bind(id.into_inner())
            .fetch_optional(self.reader)
            .await
    }

    /// Fetch one faction.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if the read fails.
    pub async fn faction(&self, id: FactionId) -> Result<Option<FactionRecord>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM factions WHERE faction_id = ?")
            .bind(id.into_inner())
            .fetch_optional(self.reader)
            .await
    }

    /// Number of rows of one entity kind.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if the read fails.
    pub async fn count(&self, kind: EntityKind) -> Result<i64, sqlx::Error> {
        let sql = match kind {
            EntityKind::Player => "SELECT COUNT(*) FROM players",
            EntityKind::Faction => "SELECT COUNT(*) FROM factions",
        };
        sqlx::query_scalar(sql).fetch_one(self.reader).await
    }
}

async fn row_exists(
    tx: &mut Transaction<'_, Sqlite>,
    sql: &'static str,
    id: i64,
) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar(sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(found.is_some())
}

/// Insert a placeholder faction if `faction_id` is unknown.
async fn ensure_faction(
    tx: &mut Transaction<'_, Sqlite>,
    faction_id: FactionId,
    now: i64,
) -> Result<(), sqlx::Error> {
    let id = faction_id.into_inner();
    if row_exists(tx, "SELECT 1 FROM factions WHERE faction_id = ?", id).await? {
        return Ok(());
    }
    sqlx::query(
        "INSERT INTO factions (faction_id, name, created_at, last_updated) VALUES (?, ?, ?, ?)",
    )
    .bind(id)
    .bind(format!("Faction {id}"))
    .bind(now)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    tracing::debug!(faction_id = id, "Created placeholder faction");
    Ok(())
}
