//! Integration tests for the snapshot analysis pipeline
//!
//! Drives the public `SignalService` facade over a temporary SQLite store:
//! - Buy / sell flow over a lookback window
//! - Cross-fund overlap on the latest date
//! - Weight momentum with streak enrichment
//! - Store idempotence and the change-detection gate

#[cfg(test)]
mod signal_pipeline_tests {
    use chrono::NaiveDate;
    use fundflow::service::SignalService;
    use fundflow::snapshot_core::{
        ChangeDetector, FundInfo, Holding, HoldingKey, SnapshotDiffEngine, SnapshotReader,
        SnapshotRow, SnapshotWriter, SqliteSnapshotStore,
    };
    use std::collections::BTreeSet;
    use tempfile::{tempdir, TempDir};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    fn row(fund: &str, day: u32, name: &str, qty: i64, weight: f64) -> SnapshotRow {
        SnapshotRow {
            fund_id: fund.to_string(),
            collect_date: d(day),
            security_name: name.to_string(),
            quantity: Some(qty),
            weight: Some(weight),
        }
    }

    fn create_service() -> (TempDir, SignalService) {
        let dir = tempdir().unwrap();
        let store = SqliteSnapshotStore::open(dir.path().join("fundflow.db")).unwrap();
        store
            .seed_funds(&[
                FundInfo::new("A", "Alpha Active"),
                FundInfo::new("B", "Beta Active"),
                FundInfo::new("C", "Gamma Active"),
            ])
            .unwrap();
        (dir, SignalService::new(store))
    }

    #[test]
    fn test_buy_ranking_sums_across_funds() {
        let (_dir, service) = create_service();
        service
            .store()
            .upsert(&[
                row("A", 1, "X", 100, 5.0),
                row("B", 1, "X", 50, 2.0),
                row("A", 2, "X", 120, 6.0),
                row("B", 2, "X", 80, 3.5),
                row("A", 2, "Y", 10, 0.5),
            ])
            .unwrap();

        let buys = service.top_buy_increase(1, 20).unwrap();

        assert_eq!(buys.len(), 2);
        assert_eq!(buys[0].security_name, "X");
        assert_eq!(buys[0].total_increase, 50);
        assert_eq!(buys[0].fund_count, 2);
        assert_eq!(buys[0].weight_change, 2.5);
        assert_eq!(buys[1].security_name, "Y");
        assert_eq!(buys[1].total_increase, 10);
        assert_eq!(buys[1].fund_count, 1);
    }

    #[test]
    fn test_sell_reports_full_liquidation_only() {
        let (_dir, service) = create_service();
        service
            .store()
            .upsert(&[
                row("A", 1, "Z", 30, 1.25),
                row("A", 1, "W", 40, 2.0),
                row("A", 2, "W", 10, 0.5),
            ])
            .unwrap();

        let sells = service.top_sell_liquidation(1, 20).unwrap();

        assert_eq!(sells.len(), 1);
        assert_eq!(sells[0].security_name, "Z");
        assert_eq!(sells[0].total_decrease, 30);
        assert_eq!(sells[0].fund_count, 1);
        assert_eq!(sells[0].prev_weight, 1.25);
    }

    #[test]
    fn test_lookback_clamped_to_oldest_date() {
        let (_dir, service) = create_service();
        let rows: Vec<SnapshotRow> = (1..=5)
            .map(|day| row("A", day, "X", 100 * day as i64, day as f64))
            .collect();
        service.store().upsert(&rows).unwrap();

        let clamped = service.top_buy_increase(100, 20).unwrap();
        let explicit = service.top_buy_increase(4, 20).unwrap();

        assert_eq!(clamped, explicit);
        assert_eq!(clamped[0].total_increase, 400);
    }

    #[test]
    fn test_insufficient_history_is_empty() {
        let (_dir, service) = create_service();
        assert!(service.top_buy_increase(3, 20).unwrap().is_empty());
        assert!(service.weight_increase_signals(30).unwrap().is_empty());

        service.store().upsert(&[row("A", 1, "X", 1, 1.0)]).unwrap();
        assert!(service.top_sell_liquidation(3, 20).unwrap().is_empty());
        assert!(service.weight_decrease_signals(30).unwrap().is_empty());
    }

    #[test]
    fn test_overlap_requires_two_funds() {
        let (_dir, service) = create_service();
        service
            .store()
            .upsert(&[
                row("A", 1, "Shared", 1, 10.0),
                row("B", 1, "Shared", 1, 6.0),
                row("C", 1, "Shared", 1, 2.0),
                row("A", 1, "Pair", 1, 4.0),
                row("C", 1, "Pair", 1, 3.0),
                row("B", 1, "Solo", 1, 50.0),
            ])
            .unwrap();

        let overlap = service.overlapping_holdings(30).unwrap();

        let names: Vec<&str> = overlap.iter().map(|s| s.security_name.as_str()).collect();
        assert_eq!(names, vec!["Shared", "Pair"]);
        assert_eq!(overlap[0].fund_count, 3);
        assert_eq!(overlap[0].total_weight, 18.0);
        assert_eq!(overlap[0].avg_weight, 6.0);
        assert_eq!(
            overlap[1].fund_names,
            vec!["Alpha Active".to_string(), "Gamma Active".to_string()]
        );
    }

    #[test]
    fn test_weight_increase_carries_streak() {
        let (_dir, service) = create_service();
        // Oldest first: one decrease, then three consecutive increases
        let weights = [3.0, 2.0, 2.5, 3.0, 4.0];
        let rows: Vec<SnapshotRow> = weights
            .iter()
            .enumerate()
            .map(|(i, w)| row("A", i as u32 + 1, "S", 1, *w))
            .collect();
        service.store().upsert(&rows).unwrap();

        let ups = service.weight_increase_signals(30).unwrap();
        assert_eq!(ups.len(), 1);
        assert_eq!(ups[0].security_name, "S");
        assert_eq!(ups[0].weight_increase, 1.0);
        assert_eq!(ups[0].consecutive_days, 3);

        assert!(service.weight_decrease_signals(30).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_twice_leaves_content_unchanged() {
        let (_dir, service) = create_service();
        let rows = vec![row("A", 1, "X", 10, 1.0), row("B", 1, "Y", 20, 2.0)];

        service.store().upsert(&rows).unwrap();
        let first = service.store().get_snapshot(None, d(1)).unwrap();
        service.store().upsert(&rows).unwrap();
        let second = service.store().get_snapshot(None, d(1)).unwrap();

        assert_eq!(first, second);
        assert_eq!(service.list_collect_dates(30).unwrap(), vec![d(1)]);
    }

    #[test]
    fn test_change_gate_first_and_identical() {
        let (_dir, service) = create_service();
        let store = service.store();
        let holdings = vec![
            Holding::new("X", Some(10), Some(1.0)),
            Holding::new("Y", None, Some(2.0)),
        ];

        assert!(ChangeDetector::has_changed(store, "A", &holdings).unwrap());

        let rows: Vec<SnapshotRow> = holdings
            .iter()
            .map(|h| SnapshotRow::from_holding("A", d(1), h))
            .collect();
        store.upsert(&rows).unwrap();

        let mut reordered = holdings.clone();
        reordered.reverse();
        assert!(!ChangeDetector::has_changed(store, "A", &reordered).unwrap());
    }

    #[test]
    fn test_diff_classifies_union_once() {
        let old = vec![
            row("A", 1, "Kept", 10, 1.0),
            row("A", 1, "Gone", 5, 0.5),
            row("B", 1, "Kept", 7, 0.7),
        ];
        let new = vec![
            row("A", 2, "Kept", 12, 1.1),
            row("A", 2, "Fresh", 3, 0.3),
            row("B", 2, "Kept", 7, 0.7),
        ];

        let diff = SnapshotDiffEngine::diff(&new, &old);

        let union: BTreeSet<HoldingKey> = old.iter().chain(new.iter()).map(|r| r.key()).collect();
        let keys: BTreeSet<HoldingKey> = diff.keys().cloned().collect();
        assert_eq!(keys, union);
        assert!(diff.values().all(|delta| !(delta.is_new && delta.is_removed)));
        assert_eq!(diff.values().filter(|delta| delta.is_new).count(), 1);
        assert_eq!(diff.values().filter(|delta| delta.is_removed).count(), 1);
    }

    #[test]
    fn test_read_path_reports_state() {
        let (_dir, service) = create_service();
        service
            .store()
            .upsert(&[row("A", 1, "X", 1, 1.0), row("B", 2, "Y", 1, 2.0)])
            .unwrap();

        let info = service.get_last_update_info().unwrap();
        assert_eq!(info.last_date, Some(d(2)));
        assert_eq!(info.fund_count, 1);
        assert_eq!(info.security_count, 1);

        assert_eq!(service.funds().unwrap().len(), 3);
        assert_eq!(service.get_holdings("A").unwrap().len(), 1);
    }
}
