//! Summarizer: rolls a closed window of history into one row per key.
//!
//! For every key (player, faction, war or territory) with observations in
//! `[start, end)`, the earliest row supplies `_start`, the latest row
//! supplies `_end`, and `_change = end - start` when both are present.
//! `record_count` is the number of rows in the group. War and territory
//! summaries carry a few derived outcome columns on top.
//!
//! Re-running is safe. Without `force`, an existing summary for the
//! `(key, period_start, period_end, period_type)` tuple wins and the insert
//! is a no-op. With `force`, each key's old row is deleted and the new one
//! inserted in a single transaction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use tornkeep_types::{ObservationKind, PeriodType};

use crate::catalog::{self, KindLayout};
use crate::clock::Clock;
use crate::error::SummarizeError;
use crate::period::Period;
use crate::sqlite::{begin_write, from_unix};

const SECONDS_PER_DAY: i64 = 86_400;

/// History columns read for war summaries beyond the tracked scores.
const WAR_EXTRA_COLUMNS: &[&str] = &[
    "war_type",
    "territory_id",
    "attacking_faction_id",
    "defending_faction_id",
    "status",
    "started_at",
    "ends_at",
];

/// Outcome of one summarization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    /// Kind summarized.
    pub kind: ObservationKind,
    /// Window summarized.
    pub period: Period,
    /// Keys with at least one observation in the window.
    pub groups: usize,
    /// Summary rows inserted fresh.
    pub created: usize,
    /// Keys skipped because a summary already existed.
    pub skipped: usize,
    /// Keys whose existing summary was replaced (`force` only).
    pub replaced: usize,
}

/// Start, end and change of one tracked field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackedField {
    /// Field name in the history table.
    pub name: &'static str,
    /// Value in the earliest observation.
    pub start: Option<i64>,
    /// Value in the latest observation.
    pub end: Option<i64>,
    /// `end - start`, when both are present.
    pub change: Option<i64>,
}

/// Kind-specific summary columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SummaryDetails {
    /// Player stats and faction summaries have only tracked fields.
    Plain,
    /// War outcome.
    War {
        /// `territory` or `ranked`.
        war_type: String,
        /// Lifecycle state in the latest observation.
        status_end: Option<String>,
        /// Faction with the higher final score of a completed war.
        winner_faction_id: Option<i64>,
        /// Seconds from start to end (or to the last observation).
        duration_seconds: Option<i64>,
    },
    /// Territory tenure.
    Territory {
        /// Owner in the earliest observation.
        faction_id_start: Option<i64>,
        /// Owner in the latest observation.
        faction_id_end: Option<i64>,
        /// Owner changes between consecutive observations.
        ownership_changes: i64,
        /// Whole days the final owner held the territory in the window.
        days_owned: i64,
    },
}

/// A stored summary row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRecord {
    /// Kind summarized.
    pub kind: ObservationKind,
    /// Player, faction, war or territory ID.
    pub key: i64,
    /// Window covered.
    pub period: Period,
    /// Tracked fields in catalog order.
    pub tracked: Vec<TrackedField>,
    /// Kind-specific columns.
    pub details: SummaryDetails,
    /// Observations that contributed.
    pub record_count: i64,
    /// When the summary was written.
    pub created_at: DateTime<Utc>,
}

/// Builds and reads summary rows.
pub struct Summarizer<'a> {
    writer: &'a SqlitePool,
    reader: &'a SqlitePool,
    clock: &'a dyn Clock,
}

impl<'a> Summarizer<'a> {
    /// Create a view over the store's pools.
    pub const fn new(writer: &'a SqlitePool, reader: &'a SqlitePool, clock: &'a dyn Clock) -> Self {
        Self {
            writer,
            reader,
            clock,
        }
    }

    /// Summarize `[start, end)` for one kind, parsing the period type label.
    ///
    /// # Errors
    ///
    /// - [`SummarizeError::UnknownPeriodType`] for a label other than
    ///   `daily`, `weekly` or `monthly`
    /// - [`SummarizeError::InvalidPeriod`] if `end <= start`
    /// - [`SummarizeError::OpenPeriod`] if `end` is after the clock's now
    /// - [`SummarizeError::Database`] if the engine fails
    pub async fn summarize_period(
        &self,
        kind: ObservationKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period_type: &str,
        force: bool,
    ) -> Result<SummaryStats, SummarizeError> {
        let period_type: PeriodType = period_type.parse()?;
        let period = Period::new(start, end, period_type)?;
        self.summarize(kind, &period, force).await
    }

    /// Summarize one window for one kind.
    ///
    /// # Errors
    ///
    /// See [`Summarizer::summarize_period`].
    pub async fn summarize(
        &self,
        kind: ObservationKind,
        period: &Period,
        force: bool,
    ) -> Result<SummaryStats, SummarizeError> {
        let period = Period::new(period.start, period.end, period.period_type)?;
        let now = self.clock.now();
        if period.end > now {
            return Err(SummarizeError::OpenPeriod {
                end: period.end.timestamp(),
                now: now.timestamp(),
            });
        }
        let layout = catalog::layout(kind);
        let rows = load_rows(self.reader, kind, layout, &period).await?;
        let summaries: Vec<SummaryValues> = rows
            .chunk_by(|a, b| a.key == b.key)
            .filter_map(|group| summarize_group(layout, group, &period))
            .collect();
        let created_at = now.timestamp();

        let mut stats = SummaryStats {
            kind,
            period,
            groups: summaries.len(),
            created: 0,
            skipped: 0,
            replaced: 0,
        };

        if force {
            for summary in &summaries {
                let mut tx = begin_write(self.writer).await?;
                let deleted = delete_summary(&mut tx, layout, summary.key, &period).await?;
                insert_summary(&mut tx, layout, summary, &period, created_at, false).await?;
                tx.commit().await?;
                if deleted > 0 {
                    stats.replaced = stats.replaced.saturating_add(1);
                } else {
                    stats.created = stats.created.saturating_add(1);
                }
            }
        } else {
            let mut tx = begin_write(self.writer).await?;
            for summary in &summaries {
                let inserted =
                    insert_summary(&mut tx, layout, summary, &period, created_at, true).await?;
                if inserted > 0 {
                    stats.created = stats.created.saturating_add(1);
                } else {
                    stats.skipped = stats.skipped.saturating_add(1);
                }
            }
            tx.commit().await?;
        }

        tracing::info!(
            kind = %kind,
            period_type = %period.period_type,
            period_start = %period.start,
            period_end = %period.end,
            groups = stats.groups,
            created = stats.created,
            skipped = stats.skipped,
            replaced = stats.replaced,
            force,
            "Summarized period"
        );
        Ok(stats)
    }

    /// Fetch the summary for one key and window.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if the read fails.
    pub async fn summary(
        &self,
        kind: ObservationKind,
        key: i64,
        period: &Period,
    ) -> Result<Option<SummaryRecord>, sqlx::Error> {
        let layout = catalog::layout(kind);
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ? AND period_start = ? AND period_end = ? AND period_type = ?",
            layout.summary.name, layout.key
        );
        let row = sqlx::query(&sql)
            .bind(key)
            .bind(period.start.timestamp())
            .bind(period.end.timestamp())
            .bind(period.period_type.as_str())
            .fetch_optional(self.reader)
            .await?;
        row.map(|row| summary_record(kind, layout, *period, &row))
            .transpose()
    }

    /// Number of summary rows of one kind for a window.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if the read fails.
    pub async fn count_summaries(
        &self,
        kind: ObservationKind,
        period: &Period,
    ) -> Result<i64, sqlx::Error> {
        let table = catalog::layout(kind).summary.name;
        let sql = format!(
            "SELECT COUNT(*) FROM {table} \
             WHERE period_start = ? AND period_end = ? AND period_type = ?"
        );
        sqlx::query_scalar(&sql)
            .bind(period.start.timestamp())
            .bind(period.end.timestamp())
            .bind(period.period_type.as_str())
            .fetch_one(self.reader)
            .await
    }
}

// =============================================================================
// Loading
// =============================================================================

/// A history row reduced to what summarization reads.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ObservedRow {
    key: i64,
    recorded_at: i64,
    tracked: Vec<Option<i64>>,
    extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Extra {
    None,
    War(WarFacts),
    Territory { faction_id: Option<i64> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct WarFacts {
    war_type: String,
    territory_id: Option<i64>,
    attacking_faction_id: Option<i64>,
    defending_faction_id: Option<i64>,
    status: Option<String>,
    started_at: Option<i64>,
    ends_at: Option<i64>,
}

async fn load_rows(
    pool: &SqlitePool,
    kind: ObservationKind,
    layout: &KindLayout,
    period: &Period,
) -> Result<Vec<ObservedRow>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
    qb.push(layout.key).push(", recorded_at, id");
    for field in layout.tracked {
        qb.push(", ").push(field);
    }
    match kind {
        ObservationKind::WarStatus => {
            for column in WAR_EXTRA_COLUMNS {
                qb.push(", ").push(column);
            }
        }
        ObservationKind::TerritoryOwnership => {
            qb.push(", faction_id");
        }
        ObservationKind::PlayerStats | ObservationKind::Faction => {}
    }
    qb.push(" FROM ")
        .push(layout.history.name)
        .push(" WHERE recorded_at >= ")
        .push_bind(period.start.timestamp())
        .push(" AND recorded_at < ")
        .push_bind(period.end.timestamp())
        .push(" ORDER BY ")
        .push(layout.key)
        .push(", recorded_at, id");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter()
        .map(|row| observed_row(kind, layout, row))
        .collect()
}

fn observed_row(
    kind: ObservationKind,
    layout: &KindLayout,
    row: &SqliteRow,
) -> Result<ObservedRow, sqlx::Error> {
    let tracked = layout
        .tracked
        .iter()
        .map(|field| row.try_get::<Option<i64>, _>(*field))
        .collect::<Result<Vec<_>, _>>()?;
    let extra = match kind {
        ObservationKind::WarStatus => Extra::War(WarFacts {
            war_type: row.try_get("war_type")?,
            territory_id: row.try_get("territory_id")?,
            attacking_faction_id: row.try_get("attacking_faction_id")?,
            defending_faction_id: row.try_get("defending_faction_id")?,
            status: row.try_get("status")?,
            started_at: row.try_get("started_at")?,
            ends_at: row.try_get("ends_at")?,
        }),
        ObservationKind::TerritoryOwnership => Extra::Territory {
            faction_id: row.try_get("faction_id")?,
        },
        ObservationKind::PlayerStats | ObservationKind::Faction => Extra::None,
    };
    Ok(ObservedRow {
        key: row.try_get(layout.key)?,
        recorded_at: row.try_get("recorded_at")?,
        tracked,
        extra,
    })
}

// =============================================================================
// Computing
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum SqlValue {
    Int(Option<i64>),
    Text(Option<String>),
}

/// One computed summary row, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SummaryValues {
    key: i64,
    columns: Vec<(String, SqlValue)>,
    record_count: i64,
}

impl SummaryValues {
    #[cfg(test)]
    fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

fn change(start: Option<i64>, end: Option<i64>) -> Option<i64> {
    end?.checked_sub(start?)
}

/// Reduce one key's rows (sorted by time) to its summary. `None` if empty.
fn summarize_group(layout: &KindLayout, group: &[ObservedRow], period: &Period) -> Option<SummaryValues> {
    let first = group.first()?;
    let last = group.last()?;

    let mut columns = Vec::new();
    for (i, field) in layout.tracked.iter().enumerate() {
        let start = first.tracked.get(i).copied().flatten();
        let end = last.tracked.get(i).copied().flatten();
        columns.push((format!("{field}_start"), SqlValue::Int(start)));
        columns.push((format!("{field}_end"), SqlValue::Int(end)));
        columns.push((format!("{field}_change"), SqlValue::Int(change(start, end))));
    }

    match &last.extra {
        Extra::War(war) => {
            let scores = (
                layout_value(layout, last, "attacking_score"),
                layout_value(layout, last, "defending_score"),
            );
            columns.extend(war_columns(war, scores, last.recorded_at));
        }
        Extra::Territory { .. } => columns.extend(territory_columns(group, period)),
        Extra::None => {}
    }

    Some(SummaryValues {
        key: first.key,
        columns,
        record_count: i64::try_from(group.len()).unwrap_or(i64::MAX),
    })
}

fn layout_value(layout: &KindLayout, row: &ObservedRow, field: &str) -> Option<i64> {
    let index = layout.tracked.iter().position(|f| *f == field)?;
    row.tracked.get(index).copied().flatten()
}

fn war_columns(
    war: &WarFacts,
    (attacking_score, defending_score): (Option<i64>, Option<i64>),
    last_recorded_at: i64,
) -> Vec<(String, SqlValue)> {
    let completed = war.status.as_deref() == Some("completed");
    let winner = match (completed, attacking_score, defending_score) {
        (true, Some(a), Some(d)) if a > d => war.attacking_faction_id,
        (true, Some(a), Some(d)) if d > a => war.defending_faction_id,
        _ => None,
    };
    let duration = war.started_at.map(|started| {
        let until = match (completed, war.ends_at) {
            (true, Some(ends)) => ends,
            _ => last_recorded_at,
        };
        until.saturating_sub(started).max(0)
    });

    vec![
        ("war_type".to_owned(), SqlValue::Text(Some(war.war_type.clone()))),
        ("territory_id".to_owned(), SqlValue::Int(war.territory_id)),
        (
            "attacking_faction_id".to_owned(),
            SqlValue::Int(war.attacking_faction_id),
        ),
        (
            "defending_faction_id".to_owned(),
            SqlValue::Int(war.defending_faction_id),
        ),
        ("status_end".to_owned(), SqlValue::Text(war.status.clone())),
        ("winner_faction_id".to_owned(), SqlValue::Int(winner)),
        ("duration_seconds".to_owned(), SqlValue::Int(duration)),
    ]
}

fn territory_columns(group: &[ObservedRow], period: &Period) -> Vec<(String, SqlValue)> {
    let owners: Vec<Option<i64>> = group
        .iter()
        .map(|row| match row.extra {
            Extra::Territory { faction_id } => faction_id,
            Extra::None | Extra::War(_) => None,
        })
        .collect();
    let owner_start = owners.first().copied().flatten();
    let owner_end = owners.last().copied().flatten();
    let changes = owners
        .windows(2)
        .filter(|pair| pair.first() != pair.get(1))
        .count();

    let days_owned = if owner_end.is_some() {
        // The final owner's run starts after the last row with another owner.
        let run_start = owners
            .iter()
            .rposition(|owner| *owner != owner_end)
            .map_or(0, |i| i.saturating_add(1));
        let since = match run_start {
            0 => period.start.timestamp(),
            i => group
                .get(i)
                .map_or(period.start.timestamp(), |row| row.recorded_at),
        };
        period.end.timestamp().saturating_sub(since).max(0) / SECONDS_PER_DAY
    } else {
        0
    };

    vec![
        ("faction_id_start".to_owned(), SqlValue::Int(owner_start)),
        ("faction_id_end".to_owned(), SqlValue::Int(owner_end)),
        (
            "ownership_changes".to_owned(),
            SqlValue::Int(Some(i64::try_from(changes).unwrap_or(i64::MAX))),
        ),
        ("days_owned".to_owned(), SqlValue::Int(Some(days_owned))),
    ]
}

// =============================================================================
// Writing
// =============================================================================

async fn insert_summary(
    conn: &mut SqliteConnection,
    layout: &KindLayout,
    summary: &SummaryValues,
    period: &Period,
    created_at: i64,
    skip_existing: bool,
) -> Result<u64, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO ");
    qb.push(layout.summary.name)
        .push(" (")
        .push(layout.key)
        .push(", period_start, period_end, period_type");
    for (name, _) in &summary.columns {
        qb.push(", ").push(name);
    }
    qb.push(", record_count, created_at) VALUES (");
    {
        let mut values = qb.separated(", ");
        values
            .push_bind(summary.key)
            .push_bind(period.start.timestamp())
            .push_bind(period.end.timestamp())
            .push_bind(period.period_type.as_str());
        for (_, value) in &summary.columns {
            match value {
                SqlValue::Int(v) => values.push_bind(*v),
                SqlValue::Text(v) => values.push_bind(v.clone()),
            };
        }
        values.push_bind(summary.record_count).push_bind(created_at);
    }
    qb.push(")");
    if skip_existing {
        qb.push(" ON CONFLICT (")
            .push(layout.key)
            .push(", period_start, period_end, period_type) DO NOTHING");
    }

    let result = qb.build().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

async fn delete_summary(
    conn: &mut SqliteConnection,
    layout: &KindLayout,
    key: i64,
    period: &Period,
) -> Result<u64, sqlx::Error> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ? AND period_start = ? AND period_end = ? AND period_type = ?",
        layout.summary.name, layout.key
    );
    let result = sqlx::query(&sql)
        .bind(key)
        .bind(period.start.timestamp())
        .bind(period.end.timestamp())
        .bind(period.period_type.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

// =============================================================================
// Reading
// =============================================================================

fn summary_record(
    kind: ObservationKind,
    layout: &KindLayout,
    period: Period,
    row: &SqliteRow,
) -> Result<SummaryRecord, sqlx::Error> {
    let tracked = layout
        .tracked
        .iter()
        .map(|&name| {
            Ok(TrackedField {
                name,
                start: row.try_get(format!("{name}_start").as_str())?,
                end: row.try_get(format!("{name}_end").as_str())?,
                change: row.try_get(format!("{name}_change").as_str())?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    let details = match kind {
        ObservationKind::WarStatus => SummaryDetails::War {
            war_type: row.try_get("war_type")?,
            status_end: row.try_get("status_end")?,
            winner_faction_id: row.try_get("winner_faction_id")?,
            duration_seconds: row.try_get("duration_seconds")?,
        },
        ObservationKind::TerritoryOwnership => SummaryDetails::Territory {
            faction_id_start: row.try_get("faction_id_start")?,
            faction_id_end: row.try_get("faction_id_end")?,
            ownership_changes: row.try_get("ownership_changes")?,
            days_owned: row.try_get("days_owned")?,
        },
        ObservationKind::PlayerStats | ObservationKind::Faction => SummaryDetails::Plain,
    };

    Ok(SummaryRecord {
        kind,
        key: row.try_get(layout.key)?,
        period,
        tracked,
        details,
        record_count: row.try_get("record_count")?,
        created_at: from_unix(row.try_get("created_at")?),
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn march() -> Period {
        Period::month(2025, 3).unwrap_or_else(|| Period {
            start: DateTime::default(),
            end: DateTime::default(),
            period_type: PeriodType::Monthly,
        })
    }

    fn at_day(day: i64) -> i64 {
        march().start.timestamp() + (day - 1) * SECONDS_PER_DAY
    }

    fn stats_row(day: i64, strength: Option<i64>) -> ObservedRow {
        let mut tracked = vec![None; 8];
        if let Some(slot) = tracked.first_mut() {
            *slot = strength;
        }
        ObservedRow {
            key: 7,
            recorded_at: at_day(day),
            tracked,
            extra: Extra::None,
        }
    }

    fn territory_row(day: i64, owner: Option<i64>) -> ObservedRow {
        ObservedRow {
            key: 40,
            recorded_at: at_day(day),
            tracked: vec![Some(3)],
            extra: Extra::Territory { faction_id: owner },
        }
    }

    fn war_row(day: i64, attacking: i64, defending: i64, status: &str) -> ObservedRow {
        ObservedRow {
            key: 900,
            recorded_at: at_day(day),
            tracked: vec![Some(attacking), Some(defending)],
            extra: Extra::War(WarFacts {
                war_type: "territory".to_owned(),
                territory_id: Some(40),
                attacking_faction_id: Some(1),
                defending_faction_id: Some(2),
                status: Some(status.to_owned()),
                started_at: Some(at_day(2)),
                ends_at: Some(at_day(5)),
            }),
        }
    }

    #[test]
    fn start_end_and_change_come_from_earliest_and_latest_rows() {
        let layout = catalog::layout(ObservationKind::PlayerStats);
        let rows = [
            stats_row(1, Some(100)),
            stats_row(10, Some(120)),
            stats_row(20, Some(150)),
        ];
        let summary = summarize_group(layout, &rows, &march());
        let Some(summary) = summary else {
            panic!("expected a summary");
        };
        assert_eq!(summary.key, 7);
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.get("strength_start"), Some(&SqlValue::Int(Some(100))));
        assert_eq!(summary.get("strength_end"), Some(&SqlValue::Int(Some(150))));
        assert_eq!(summary.get("strength_change"), Some(&SqlValue::Int(Some(50))));
    }

    #[test]
    fn null_endpoint_gives_null_change() {
        let layout = catalog::layout(ObservationKind::PlayerStats);
        let rows = [stats_row(1, None), stats_row(2, Some(80))];
        let summary = summarize_group(layout, &rows, &march());
        assert_eq!(
            summary.as_ref().and_then(|s| s.get("strength_change")),
            Some(&SqlValue::Int(None))
        );
        assert_eq!(
            summary.as_ref().and_then(|s| s.get("strength_end")),
            Some(&SqlValue::Int(Some(80)))
        );
    }

    #[test]
    fn empty_group_has_no_summary() {
        let layout = catalog::layout(ObservationKind::Faction);
        assert!(summarize_group(layout, &[], &march()).is_none());
    }

    #[test]
    fn territory_counts_owner_changes_and_final_tenure() {
        let layout = catalog::layout(ObservationKind::TerritoryOwnership);
        let rows = [
            territory_row(1, Some(1)),
            territory_row(5, Some(2)),
            territory_row(11, Some(3)),
            territory_row(20, Some(3)),
        ];
        let Some(summary) = summarize_group(layout, &rows, &march()) else {
            panic!("expected a summary");
        };
        assert_eq!(summary.get("faction_id_start"), Some(&SqlValue::Int(Some(1))));
        assert_eq!(summary.get("faction_id_end"), Some(&SqlValue::Int(Some(3))));
        assert_eq!(summary.get("ownership_changes"), Some(&SqlValue::Int(Some(2))));
        // Held from March 11 to April 1.
        assert_eq!(summary.get("days_owned"), Some(&SqlValue::Int(Some(21))));
    }

    #[test]
    fn territory_held_all_window_counts_whole_month() {
        let layout = catalog::layout(ObservationKind::TerritoryOwnership);
        let rows = [territory_row(3, Some(9)), territory_row(30, Some(9))];
        let Some(summary) = summarize_group(layout, &rows, &march()) else {
            panic!("expected a summary");
        };
        assert_eq!(summary.get("ownership_changes"), Some(&SqlValue::Int(Some(0))));
        assert_eq!(summary.get("days_owned"), Some(&SqlValue::Int(Some(31))));
    }

    #[test]
    fn unowned_territory_has_zero_days_owned() {
        let layout = catalog::layout(ObservationKind::TerritoryOwnership);
        let rows = [territory_row(3, Some(9)), territory_row(4, None)];
        let Some(summary) = summarize_group(layout, &rows, &march()) else {
            panic!("expected a summary");
        };
        assert_eq!(summary.get("days_owned"), Some(&SqlValue::Int(Some(0))));
        assert_eq!(summary.get("ownership_changes"), Some(&SqlValue::Int(Some(1))));
    }

    #[test]
    fn completed_war_names_the_higher_scorer() {
        let layout = catalog::layout(ObservationKind::WarStatus);
        let rows = [war_row(2, 0, 0, "ongoing"), war_row(6, 300, 120, "completed")];
        let Some(summary) = summarize_group(layout, &rows, &march()) else {
            panic!("expected a summary");
        };
        assert_eq!(summary.get("winner_faction_id"), Some(&SqlValue::Int(Some(1))));
        assert_eq!(
            summary.get("status_end"),
            Some(&SqlValue::Text(Some("completed".to_owned())))
        );
        // Completed with an end time: ends_at - started_at.
        assert_eq!(
            summary.get("duration_seconds"),
            Some(&SqlValue::Int(Some(3 * SECONDS_PER_DAY)))
        );
        assert_eq!(summary.get("attacking_score_change"), Some(&SqlValue::Int(Some(300))));
    }

    #[test]
    fn ongoing_or_tied_war_has_no_winner() {
        let layout = catalog::layout(ObservationKind::WarStatus);
        let ongoing = [war_row(3, 50, 10, "ongoing")];
        let tied = [war_row(3, 50, 50, "completed")];
        for rows in [&ongoing[..], &tied[..]] {
            let summary = summarize_group(layout, rows, &march());
            assert_eq!(
                summary.as_ref().and_then(|s| s.get("winner_faction_id")),
                Some(&SqlValue::Int(None))
            );
        }
        // Ongoing: measured to the last observation.
        let summary = summarize_group(layout, &ongoing, &march());
        assert_eq!(
            summary.as_ref().and_then(|s| s.get("duration_seconds")),
            Some(&SqlValue::Int(Some(SECONDS_PER_DAY)))
        );
    }
}
