//! Retention Pruner: deletes summarized history past the horizon.
//!
//! A history row is deleted only when it is older than the cutoff **and** a
//! monthly summary exists for the same key over a period containing its
//! `recorded_at`, written after that period closed. Rows in unsummarized
//! periods survive regardless of age.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tornkeep_types::{ObservationKind, PeriodType};

use crate::catalog::{self, KindLayout};
use crate::clock::Clock;
use crate::error::PruneError;
use crate::sqlite::begin_write;

/// Outcome of one pruning call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PruneStats {
    /// Kind pruned.
    pub kind: ObservationKind,
    /// Rows recorded before this instant were eligible.
    pub cutoff: DateTime<Utc>,
    /// Rows deleted.
    pub deleted: u64,
    /// Rows past the cutoff kept because their period has no summary yet.
    pub blocked: i64,
}

/// Deletes history rows that a summary already covers.
pub struct Pruner<'a> {
    pool: &'a SqlitePool,
    clock: &'a dyn Clock,
}

impl<'a> Pruner<'a> {
    /// Create a pruner bound to the writer pool.
    pub const fn new(pool: &'a SqlitePool, clock: &'a dyn Clock) -> Self {
        Self { pool, clock }
    }

    /// Delete observations of `kind` older than `horizon_days` that sit in
    /// a summarized monthly period.
    ///
    /// Running it again without new summaries deletes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PruneError::InvalidHorizon`] for a negative horizon and
    /// [`PruneError::Database`] if the engine fails, in which case nothing
    /// was deleted.
    pub async fn prune_older_than(
        &self,
        kind: ObservationKind,
        horizon_days: i64,
    ) -> Result<PruneStats, PruneError> {
        if horizon_days < 0 {
            return Err(PruneError::InvalidHorizon(horizon_days));
        }
        let now = self.clock.now();
        let cutoff = TimeDelta::try_days(horizon_days)
            .and_then(|horizon| now.checked_sub_signed(horizon))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let cutoff_secs = cutoff.timestamp();
        let layout = catalog::layout(kind);

        let mut tx = begin_write(self.pool).await?;
        let deleted = sqlx::query(&delete_sql(layout))
            .bind(cutoff_secs)
            .bind(PeriodType::Monthly.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let blocked: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE recorded_at < ?",
            layout.history.name
        ))
        .bind(cutoff_secs)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        if blocked > 0 {
            tracing::warn!(
                kind = %kind,
                blocked,
                cutoff = %cutoff,
                "Rows past the retention horizon kept: their period has no summary yet"
            );
        }
        tracing::info!(kind = %kind, deleted, horizon_days, "Pruned history");

        Ok(PruneStats {
            kind,
            cutoff,
            deleted,
            blocked,
        })
    }
}

fn delete_sql(layout: &KindLayout) -> String {
    let history = layout.history.name;
    let summary = layout.summary.name;
    let key = layout.key;
    format!(
        "DELETE FROM {history} \
         WHERE recorded_at < ?1 \
           AND EXISTS ( \
             SELECT 1 FROM {summary} s \
             WHERE s.{key} = {history}.{key} \
               AND s.period_type = ?2 \
               AND s.period_start <= {history}.recorded_at \
               AND {history}.recorded_at < s.period_end \
               AND s.created_at >= s.period_end)"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_is_gated_on_a_matching_summary() {
        let sql = delete_sql(catalog::layout(ObservationKind::PlayerStats));
        assert!(sql.starts_with("DELETE FROM player_stats_history"));
        assert!(sql.contains("EXISTS"));
        assert!(sql.contains("s.player_id = player_stats_history.player_id"));
        assert!(sql.contains("s.created_at >= s.period_end"));
    }
}
