//! Consecutive-direction streaks of fund-averaged weight

use super::error::StoreError;
use super::store::SnapshotReader;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Strict move from `prev` to `curr` in this direction
    fn holds(&self, curr: f64, prev: f64) -> bool {
        match self {
            Direction::Up => curr > prev,
            Direction::Down => curr < prev,
        }
    }
}

pub struct StreakCalculator;

impl StreakCalculator {
    /// Count consecutive date pairs (most recent first) in which the average
    /// weight of `security_name` moved strictly in `direction`
    ///
    /// The walk stops at the first pair that does not conform, so the result
    /// is the run ending at `dates[0]`, not the longest run in the history.
    /// A security with no weight on a date counts as 0 for that date.
    pub fn consecutive_days<R: SnapshotReader + ?Sized>(
        reader: &R,
        security_name: &str,
        dates: &[NaiveDate],
        direction: Direction,
    ) -> Result<u32, StoreError> {
        let Some((&first, rest)) = dates.split_first() else {
            return Ok(0);
        };

        let avg = |date: NaiveDate| -> Result<f64, StoreError> {
            Ok(reader.average_weight(security_name, date)?.unwrap_or(0.0))
        };

        let mut streak = 0;
        let mut curr = avg(first)?;

        for &prev_date in rest {
            let prev = avg(prev_date)?;
            if !direction.holds(curr, prev) {
                break;
            }
            streak += 1;
            curr = prev;
        }

        Ok(streak)
    }
}
