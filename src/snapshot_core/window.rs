//! Lookback window resolution over the collect-date history

use chrono::NaiveDate;

/// Dates fetched for lookback-based analyses (buy / sell)
pub const LOOKBACK_DATE_LIMIT: usize = 30;

/// Dates fetched for day-over-day weight signals (also bounds streak length)
pub const MOMENTUM_DATE_LIMIT: usize = 10;

/// A pair of dates to compare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonWindow {
    pub latest: NaiveDate,
    pub older: NaiveDate,
}

impl ComparisonWindow {
    /// Resolve "latest vs `days` steps back" from a most-recent-first date list
    ///
    /// The older side is clamped to the oldest available date, so asking for
    /// more history than exists degrades to oldest-vs-newest. Returns `None`
    /// with fewer than two dates (nothing to compare).
    ///
    /// `days == 0` compares the latest date with itself.
    pub fn lookback(dates: &[NaiveDate], days: usize) -> Option<Self> {
        if dates.len() < 2 {
            return None;
        }
        let idx = days.min(dates.len() - 1);
        Some(Self {
            latest: dates[0],
            older: dates[idx],
        })
    }

    /// Latest date vs the immediately preceding one
    pub fn day_over_day(dates: &[NaiveDate]) -> Option<Self> {
        Self::lookback(dates, 1)
    }
}
