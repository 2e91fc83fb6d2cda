//! Half-open time windows `[start, end)` that summaries are computed over.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use tornkeep_types::PeriodType;

use crate::error::SummarizeError;

/// A summarization window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
    /// Granularity label stored with the summary.
    pub period_type: PeriodType,
}

impl Period {
    /// Build a window, rejecting `end <= start`.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizeError::InvalidPeriod`] for an empty or inverted
    /// window.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period_type: PeriodType,
    ) -> Result<Self, SummarizeError> {
        if end <= start {
            return Err(SummarizeError::InvalidPeriod {
                start: start.timestamp(),
                end: end.timestamp(),
            });
        }
        Ok(Self {
            start,
            end,
            period_type,
        })
    }

    /// The calendar month `year-month` in UTC. `None` for an invalid month.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()?;
        let (next_year, next_month) = if month == 12 {
            (year.checked_add(1)?, 1)
        } else {
            (year, month.checked_add(1)?)
        };
        let end = Utc
            .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
            .single()?;
        Some(Self {
            start,
            end,
            period_type: PeriodType::Monthly,
        })
    }

    /// The calendar month containing `at`.
    pub fn containing_month(at: DateTime<Utc>) -> Option<Self> {
        Self::month(at.year(), at.month())
    }

    /// The calendar month before the one containing `at`.
    pub fn previous_month(at: DateTime<Utc>) -> Option<Self> {
        let (year, month) = if at.month() == 1 {
            (at.year().checked_sub(1)?, 12)
        } else {
            (at.year(), at.month().checked_sub(1)?)
        };
        Self::month(year, month)
    }

    /// Whether `at` falls inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// Length of the window in seconds.
    pub fn len_secs(&self) -> i64 {
        self.end.timestamp().saturating_sub(self.start.timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).single().unwrap_or_default()
    }

    #[test]
    fn december_rolls_into_next_year() {
        let period = Period::month(2024, 12);
        assert_eq!(period.map(|p| p.end), Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single());
    }

    #[test]
    fn previous_month_of_january_is_december() {
        let period = Period::previous_month(at(2025, 1, 15));
        assert_eq!(period, Period::month(2024, 12));
    }

    #[test]
    fn month_is_half_open() {
        let Some(march) = Period::month(2025, 3) else {
            return;
        };
        assert!(march.contains(march.start));
        assert!(!march.contains(march.end));
        assert!(march.contains(at(2025, 3, 31)));
        assert_eq!(march.len_secs(), 31 * 86_400);
    }

    #[test]
    fn inverted_window_is_rejected() {
        let start = at(2025, 3, 2);
        assert!(matches!(
            Period::new(start, start, PeriodType::Daily),
            Err(SummarizeError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn invalid_month_is_none() {
        assert!(Period::month(2025, 13).is_none());
        assert_eq!(Period::containing_month(at(2025, 2, 10)), Period::month(2025, 2));
    }
}
