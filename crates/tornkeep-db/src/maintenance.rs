//! Monthly maintenance: summarize a month, then prune, for every kind.
//!
//! This is the Scheduling interface. Something outside the store (a timer,
//! a cron job, an operator) decides when to call it. Every step is either
//! idempotent or gated, so a crashed run can simply be started again.

use serde::Serialize;
use tornkeep_types::ObservationKind;

use crate::error::MaintenanceError;
use crate::period::Period;
use crate::pruner::PruneStats;
use crate::sqlite::Store;
use crate::summarizer::SummaryStats;

/// Default retention horizon in days.
pub const DEFAULT_HORIZON_DAYS: i64 = 60;

/// Result of summarizing and pruning one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindReport {
    /// Summarization outcome.
    pub summary: SummaryStats,
    /// Pruning outcome.
    pub prune: PruneStats,
}

/// Result of one maintenance run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    /// Month summarized.
    pub period: Period,
    /// Per-kind results in processing order.
    pub kinds: Vec<KindReport>,
}

/// Runs the monthly summarize-then-prune cycle.
pub struct Maintenance<'a> {
    store: &'a Store,
    horizon_days: i64,
}

impl<'a> Maintenance<'a> {
    /// Maintenance over `store` with the given retention horizon.
    pub const fn new(store: &'a Store, horizon_days: i64) -> Self {
        Self {
            store,
            horizon_days,
        }
    }

    /// Summarize and prune the calendar month `year-month`.
    ///
    /// Kinds are processed in [`ObservationKind::ALL`] order. The run stops
    /// at the first failure; kinds already processed keep their results.
    ///
    /// # Errors
    ///
    /// Returns [`MaintenanceError::InvalidMonth`] for a month outside
    /// `1..=12`, or the failing kind and step. A month that has not ended
    /// fails on the first kind with [`crate::SummarizeError::OpenPeriod`].
    pub async fn run_for_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<MaintenanceReport, MaintenanceError> {
        let period =
            Period::month(year, month).ok_or(MaintenanceError::InvalidMonth { year, month })?;
        self.run(period).await
    }

    /// Summarize and prune the month before the clock's current month.
    ///
    /// # Errors
    ///
    /// See [`Maintenance::run_for_month`].
    pub async fn run_previous_month(&self) -> Result<MaintenanceReport, MaintenanceError> {
        let now = self.store.clock().now();
        let period = Period::previous_month(now).ok_or(MaintenanceError::InvalidMonth {
            year: 0,
            month: 0,
        })?;
        self.run(period).await
    }

    async fn run(&self, period: Period) -> Result<MaintenanceReport, MaintenanceError> {
        tracing::info!(
            period_start = %period.start,
            period_end = %period.end,
            horizon_days = self.horizon_days,
            "Starting monthly maintenance"
        );

        let mut kinds = Vec::with_capacity(ObservationKind::ALL.len());
        for kind in ObservationKind::ALL {
            let summary = self
                .store
                .summarizer()
                .summarize(kind, &period, false)
                .await
                .map_err(|source| MaintenanceError::Summarize { kind, source })?;
            let prune = self
                .store
                .pruner()
                .prune_older_than(kind, self.horizon_days)
                .await
                .map_err(|source| MaintenanceError::Prune { kind, source })?;
            kinds.push(KindReport { summary, prune });
        }

        tracing::info!(kinds = kinds.len(), "Monthly maintenance complete");
        Ok(MaintenanceReport { period, kinds })
    }
}
