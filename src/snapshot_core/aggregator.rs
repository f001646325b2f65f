//! Cross-fund aggregation into ranked security signals
//!
//! # Analyses
//! - **Top buy**: quantity increases (new positions included) over a lookback
//! - **Top sell**: full liquidations over a lookback
//! - **Overlap**: securities held by 2+ funds on the latest date
//! - **Weight up / down**: day-over-day weight moves, enriched with streaks
//!
//! All analyses return an empty list when the store has fewer than two
//! collect dates (overlap needs only one). Store failures propagate.

use super::diff::{SnapshotDiff, SnapshotDiffEngine, TOTAL_WEIGHT_DECIMALS};
use super::error::StoreError;
use super::signals::{
    BuySignal, OverlapSignal, SellSignal, WeightDecreaseSignal, WeightIncreaseSignal,
};
use super::store::SnapshotReader;
use super::streak::{Direction, StreakCalculator};
use super::types::round_to;
use super::window::{ComparisonWindow, LOOKBACK_DATE_LIMIT, MOMENTUM_DATE_LIMIT};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const DEFAULT_LOOKBACK_DAYS: usize = 3;
pub const DEFAULT_FLOW_TOP_N: usize = 20;
pub const DEFAULT_SIGNAL_TOP_N: usize = 30;

/// Per-security accumulator that remembers first-seen order
///
/// Ranking uses a stable sort, so equal keys keep computation order.
struct Tally<T> {
    index: HashMap<String, usize>,
    entries: Vec<T>,
}

impl<T> Tally<T> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, name: &str, init: impl FnOnce() -> T) -> &mut T {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.entries.push(init());
                self.index.insert(name.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }

    fn into_vec(self) -> Vec<T> {
        self.entries
    }
}

fn desc_f64(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Cross-fund aggregator over a snapshot reader
pub struct CrossFundAggregator<'a, R: SnapshotReader + ?Sized> {
    reader: &'a R,
}

impl<'a, R: SnapshotReader + ?Sized> CrossFundAggregator<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    fn load_diff(&self, window: ComparisonWindow) -> Result<SnapshotDiff, StoreError> {
        let latest = self.reader.get_snapshot(None, window.latest)?;
        let older = self.reader.get_snapshot(None, window.older)?;
        Ok(SnapshotDiffEngine::diff(&latest, &older))
    }

    /// Securities whose held quantity grew across funds over `days`
    ///
    /// Ranked by `(total_increase, fund_count)` descending.
    pub fn top_buy_increase(&self, days: usize, top_n: usize) -> Result<Vec<BuySignal>, StoreError> {
        let dates = self.reader.list_collect_dates(LOOKBACK_DATE_LIMIT)?;
        let Some(window) = ComparisonWindow::lookback(&dates, days) else {
            return Ok(Vec::new());
        };
        let diff = self.load_diff(window)?;

        let mut tally = Tally::new();
        for (key, delta) in &diff {
            if delta.is_removed || delta.quantity_delta <= 0 {
                continue;
            }
            let signal = tally.entry(&key.security_name, || BuySignal {
                security_name: key.security_name.clone(),
                fund_count: 0,
                total_increase: 0,
                weight_change: 0.0,
            });
            signal.fund_count += 1;
            signal.total_increase += delta.quantity_delta;
            signal.weight_change += round_to(delta.weight_delta, TOTAL_WEIGHT_DECIMALS);
        }

        let mut result = tally.into_vec();
        for signal in &mut result {
            signal.weight_change = round_to(signal.weight_change, TOTAL_WEIGHT_DECIMALS);
        }
        result.sort_by(|a, b| {
            b.total_increase
                .cmp(&a.total_increase)
                .then(b.fund_count.cmp(&a.fund_count))
        });
        result.truncate(top_n);

        log::debug!(
            "Top buy ({} vs {}): {} securities",
            window.latest,
            window.older,
            result.len()
        );
        Ok(result)
    }

    /// Securities fully dropped by funds over `days`
    ///
    /// Ranked by `(fund_count, total_decrease)` descending.
    pub fn top_sell_liquidation(
        &self,
        days: usize,
        top_n: usize,
    ) -> Result<Vec<SellSignal>, StoreError> {
        let dates = self.reader.list_collect_dates(LOOKBACK_DATE_LIMIT)?;
        let Some(window) = ComparisonWindow::lookback(&dates, days) else {
            return Ok(Vec::new());
        };
        let diff = self.load_diff(window)?;

        let mut tally = Tally::new();
        for (key, delta) in diff.iter().filter(|(_, d)| d.is_removed) {
            let signal = tally.entry(&key.security_name, || SellSignal {
                security_name: key.security_name.clone(),
                fund_count: 0,
                total_decrease: 0,
                prev_weight: 0.0,
            });
            signal.fund_count += 1;
            signal.total_decrease += delta.old_quantity;
            signal.prev_weight += round_to(delta.old_weight, TOTAL_WEIGHT_DECIMALS);
        }

        let mut result = tally.into_vec();
        for signal in &mut result {
            signal.prev_weight = round_to(signal.prev_weight, TOTAL_WEIGHT_DECIMALS);
        }
        result.sort_by(|a, b| {
            b.fund_count
                .cmp(&a.fund_count)
                .then(b.total_decrease.cmp(&a.total_decrease))
        });
        result.truncate(top_n);

        log::debug!(
            "Top sell ({} vs {}): {} securities",
            window.latest,
            window.older,
            result.len()
        );
        Ok(result)
    }

    /// Securities held by two or more funds on the latest date
    ///
    /// Ranked by `(fund_count, total_weight)` descending.
    pub fn overlapping_holdings(&self, top_n: usize) -> Result<Vec<OverlapSignal>, StoreError> {
        let Some(latest) = self.reader.latest_date()? else {
            return Ok(Vec::new());
        };
        let rows = self.reader.get_snapshot(None, latest)?;
        let names = self.reader.fund_names()?;

        let mut tally = Tally::new();
        for row in &rows {
            let signal = tally.entry(&row.security_name, || OverlapSignal {
                security_name: row.security_name.clone(),
                fund_count: 0,
                fund_names: Vec::new(),
                total_weight: 0.0,
                avg_weight: 0.0,
            });
            signal.fund_count += 1;
            signal.fund_names.push(
                names
                    .get(&row.fund_id)
                    .cloned()
                    .unwrap_or_else(|| row.fund_id.clone()),
            );
            signal.total_weight += row.weight_or_zero();
        }

        let mut result: Vec<OverlapSignal> = tally
            .into_vec()
            .into_iter()
            .filter(|s| s.fund_count >= 2)
            .map(|mut s| {
                s.total_weight = round_to(s.total_weight, TOTAL_WEIGHT_DECIMALS);
                s.avg_weight = round_to(s.total_weight / s.fund_count as f64, TOTAL_WEIGHT_DECIMALS);
                s.fund_names.sort();
                s
            })
            .collect();

        result.sort_by(|a, b| {
            b.fund_count
                .cmp(&a.fund_count)
                .then(desc_f64(a.total_weight, b.total_weight))
        });
        result.truncate(top_n);
        Ok(result)
    }

    /// Day-over-day weight moves in `direction`, summed per security
    ///
    /// Only pairs present on the latest date are considered (a pair absent on
    /// the previous date counts from zero); liquidations belong to the sell
    /// analysis. Returns `(dates, [(security, |delta| sum, fund_count)])`.
    fn weight_moves(
        &self,
        direction: Direction,
    ) -> Result<Option<(Vec<NaiveDate>, Vec<(String, f64, usize)>)>, StoreError> {
        let dates = self.reader.list_collect_dates(MOMENTUM_DATE_LIMIT)?;
        let Some(window) = ComparisonWindow::day_over_day(&dates) else {
            return Ok(None);
        };
        let diff = self.load_diff(window)?;

        let mut tally: Tally<(String, f64, usize)> = Tally::new();
        for (key, delta) in &diff {
            if delta.is_removed {
                continue;
            }
            let raw = delta.raw_weight_delta();
            let moved = match direction {
                Direction::Up => raw > 0.0,
                Direction::Down => raw < 0.0,
            };
            if !moved {
                continue;
            }
            let entry = tally.entry(&key.security_name, || (key.security_name.clone(), 0.0, 0));
            entry.1 += delta.weight_delta.abs();
            entry.2 += 1;
        }

        Ok(Some((dates, tally.into_vec())))
    }

    fn rank_weight_moves(
        &self,
        direction: Direction,
        top_n: usize,
    ) -> Result<Vec<(String, f64, usize, u32)>, StoreError> {
        let Some((dates, moves)) = self.weight_moves(direction)? else {
            return Ok(Vec::new());
        };

        let mut ranked = Vec::with_capacity(moves.len());
        for (name, total, count) in moves {
            let streak = StreakCalculator::consecutive_days(self.reader, &name, &dates, direction)?;
            ranked.push((name, round_to(total, TOTAL_WEIGHT_DECIMALS), count, streak));
        }

        ranked.sort_by(|a, b| desc_f64(a.1, b.1).then(b.2.cmp(&a.2)));
        ranked.truncate(top_n);
        Ok(ranked)
    }

    /// Securities whose weight rose since the previous collect date
    ///
    /// Ranked by `(weight_increase, fund_count)` descending.
    pub fn weight_increase_signals(
        &self,
        top_n: usize,
    ) -> Result<Vec<WeightIncreaseSignal>, StoreError> {
        Ok(self
            .rank_weight_moves(Direction::Up, top_n)?
            .into_iter()
            .map(|(security_name, weight_increase, fund_count, consecutive_days)| {
                WeightIncreaseSignal {
                    security_name,
                    weight_increase,
                    fund_count,
                    consecutive_days,
                }
            })
            .collect())
    }

    /// Securities whose weight fell since the previous collect date
    ///
    /// Ranked by `(weight_decrease, fund_count)` descending.
    pub fn weight_decrease_signals(
        &self,
        top_n: usize,
    ) -> Result<Vec<WeightDecreaseSignal>, StoreError> {
        Ok(self
            .rank_weight_moves(Direction::Down, top_n)?
            .into_iter()
            .map(|(security_name, weight_decrease, fund_count, consecutive_days)| {
                WeightDecreaseSignal {
                    security_name,
                    weight_decrease,
                    fund_count,
                    consecutive_days,
                }
            })
            .collect())
    }
}
