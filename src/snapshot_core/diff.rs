//! Per-(fund, security) comparison of two dated snapshots

use super::types::{round_to, HoldingKey, SnapshotRow};
use std::collections::BTreeMap;

/// Decimal places kept on a single pairwise weight delta
pub const PAIR_WEIGHT_DECIMALS: i32 = 4;

/// Decimal places kept on aggregated weight totals
pub const TOTAL_WEIGHT_DECIMALS: i32 = 2;

/// Net change of one `(fund, security)` pair between two dates
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingDelta {
    /// `new - old`, absent values counted as zero
    pub quantity_delta: i64,
    /// `new - old`, rounded to [`PAIR_WEIGHT_DECIMALS`]
    pub weight_delta: f64,
    pub is_new: bool,
    pub is_removed: bool,
    /// Old-side values (zero when the pair is new); sell-side reports use these
    /// as the liquidated magnitude.
    pub old_quantity: i64,
    pub old_weight: f64,
    /// New-side weight (zero when the pair is removed)
    pub new_weight: f64,
}

impl HoldingDelta {
    /// Unrounded `new - old` weight, for sign checks near zero
    pub fn raw_weight_delta(&self) -> f64 {
        self.new_weight - self.old_weight
    }
}

/// Result of diffing two snapshots, ordered by `(fund_id, security_name)`
pub type SnapshotDiff = BTreeMap<HoldingKey, HoldingDelta>;

pub struct SnapshotDiffEngine;

impl SnapshotDiffEngine {
    /// Diff `new_rows` (more recent date) against `old_rows`
    ///
    /// Every key in the union of both inputs appears exactly once:
    /// - only in new: `is_new`, deltas equal the new values
    /// - only in old: `is_removed`, deltas are the negated old values
    /// - in both: `new - old`
    pub fn diff(new_rows: &[SnapshotRow], old_rows: &[SnapshotRow]) -> SnapshotDiff {
        let old_map: BTreeMap<HoldingKey, &SnapshotRow> =
            old_rows.iter().map(|r| (r.key(), r)).collect();

        let mut result = SnapshotDiff::new();

        for new in new_rows {
            let key = new.key();
            let delta = match old_map.get(&key) {
                Some(old) => HoldingDelta {
                    quantity_delta: new.quantity_or_zero() - old.quantity_or_zero(),
                    weight_delta: round_to(
                        new.weight_or_zero() - old.weight_or_zero(),
                        PAIR_WEIGHT_DECIMALS,
                    ),
                    is_new: false,
                    is_removed: false,
                    old_quantity: old.quantity_or_zero(),
                    old_weight: old.weight_or_zero(),
                    new_weight: new.weight_or_zero(),
                },
                None => HoldingDelta {
                    quantity_delta: new.quantity_or_zero(),
                    weight_delta: round_to(new.weight_or_zero(), PAIR_WEIGHT_DECIMALS),
                    is_new: true,
                    is_removed: false,
                    old_quantity: 0,
                    old_weight: 0.0,
                    new_weight: new.weight_or_zero(),
                },
            };
            result.insert(key, delta);
        }

        for (key, old) in old_map {
            if result.contains_key(&key) {
                continue;
            }
            result.insert(
                key,
                HoldingDelta {
                    quantity_delta: -old.quantity_or_zero(),
                    weight_delta: round_to(-old.weight_or_zero(), PAIR_WEIGHT_DECIMALS),
                    is_new: false,
                    is_removed: true,
                    old_quantity: old.quantity_or_zero(),
                    old_weight: old.weight_or_zero(),
                    new_weight: 0.0,
                },
            );
        }

        result
    }
}
