//! Change detection gate for new snapshots
//!
//! A freshly acquired holdings list is only written when it differs from the
//! fund's most recent stored snapshot. Flat no-op days would otherwise land
//! in the series as zero-delta generations and break streak counts.

use super::error::StoreError;
use super::store::SnapshotReader;
use super::types::Holding;
use std::collections::HashSet;

/// Comparable identity of one holding: name, quantity, weight bits
type HoldingTriple<'a> = (&'a str, Option<i64>, Option<u64>);

fn triple(security_name: &str, quantity: Option<i64>, weight: Option<f64>) -> HoldingTriple<'_> {
    (security_name, quantity, weight.map(f64::to_bits))
}

pub struct ChangeDetector;

impl ChangeDetector {
    /// Returns `true` when `candidate` should be stored as a new snapshot
    ///
    /// - No prior snapshot for the fund: always `true`
    /// - Otherwise compares the sets of `(security_name, quantity, weight)`
    ///   ignoring order; any cardinality or membership difference is a change
    ///
    /// Weights are compared bit-for-bit (no tolerance).
    pub fn has_changed<R: SnapshotReader + ?Sized>(
        store: &R,
        fund_id: &str,
        candidate: &[Holding],
    ) -> Result<bool, StoreError> {
        let latest = match store.latest_date_for(fund_id)? {
            Some(date) => date,
            None => {
                log::debug!("No prior snapshot for {}, treating as changed", fund_id);
                return Ok(true);
            }
        };

        let prior = store.get_snapshot(Some(fund_id), latest)?;

        if prior.len() != candidate.len() {
            return Ok(true);
        }

        let prior_set: HashSet<HoldingTriple<'_>> = prior
            .iter()
            .map(|r| triple(&r.security_name, r.quantity, r.weight))
            .collect();
        let candidate_set: HashSet<HoldingTriple<'_>> = candidate
            .iter()
            .map(|h| triple(&h.security_name, h.quantity, h.weight))
            .collect();

        Ok(prior_set != candidate_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot_core::sqlite_store::SqliteSnapshotStore;
    use crate::snapshot_core::store::SnapshotWriter;
    use crate::snapshot_core::types::SnapshotRow;
    use chrono::NaiveDate;
    use tempfile::{tempdir, TempDir};

    fn create_store_with(fund: &str, holdings: &[Holding]) -> (TempDir, SqliteSnapshotStore) {
        let dir = tempdir().unwrap();
        let store = SqliteSnapshotStore::open(dir.path().join("test.db")).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let rows: Vec<SnapshotRow> = holdings
            .iter()
            .map(|h| SnapshotRow::from_holding(fund, date, h))
            .collect();
        store.upsert(&rows).unwrap();
        (dir, store)
    }

    fn base_holdings() -> Vec<Holding> {
        vec![
            Holding::new("Samsung Electronics", Some(1200), Some(12.34)),
            Holding::new("SK hynix", Some(300), Some(9.87)),
            Holding::new("Hanmi Semiconductor", Some(50), Some(3.1)),
        ]
    }

    #[test]
    fn test_first_snapshot_is_changed() {
        let dir = tempdir().unwrap();
        let store = SqliteSnapshotStore::open(dir.path().join("test.db")).unwrap();
        assert!(ChangeDetector::has_changed(&store, "494220", &base_holdings()).unwrap());
    }

    #[test]
    fn test_identical_rows_unchanged() {
        let (_dir, store) = create_store_with("494220", &base_holdings());
        assert!(!ChangeDetector::has_changed(&store, "494220", &base_holdings()).unwrap());
        // Calling twice gives the same answer
        assert!(!ChangeDetector::has_changed(&store, "494220", &base_holdings()).unwrap());
    }

    #[test]
    fn test_order_ignored() {
        let (_dir, store) = create_store_with("494220", &base_holdings());
        let mut reordered = base_holdings();
        reordered.reverse();
        assert!(!ChangeDetector::has_changed(&store, "494220", &reordered).unwrap());
    }

    #[test]
    fn test_quantity_change_detected() {
        let (_dir, store) = create_store_with("494220", &base_holdings());
        let mut changed = base_holdings();
        changed[1].quantity = Some(301);
        assert!(ChangeDetector::has_changed(&store, "494220", &changed).unwrap());
    }

    #[test]
    fn test_tiny_weight_change_detected() {
        let (_dir, store) = create_store_with("494220", &base_holdings());
        let mut changed = base_holdings();
        changed[0].weight = Some(12.3400001);
        assert!(ChangeDetector::has_changed(&store, "494220", &changed).unwrap());
    }

    #[test]
    fn test_cardinality_change_detected() {
        let (_dir, store) = create_store_with("494220", &base_holdings());
        let mut fewer = base_holdings();
        fewer.pop();
        assert!(ChangeDetector::has_changed(&store, "494220", &fewer).unwrap());

        let mut more = base_holdings();
        more.push(Holding::new("LG Energy Solution", Some(10), Some(1.0)));
        assert!(ChangeDetector::has_changed(&store, "494220", &more).unwrap());
    }

    #[test]
    fn test_other_fund_history_ignored() {
        let (_dir, store) = create_store_with("494220", &base_holdings());
        assert!(ChangeDetector::has_changed(&store, "474590", &base_holdings()).unwrap());
    }
}
