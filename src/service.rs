//! Presentation-facing facade over the snapshot store and collector
//!
//! Every analysis runs against its own point-in-time read view, so a
//! collection run writing concurrently never shows up half-applied.

use crate::collector::{CollectStatus, Collector};
use crate::snapshot_core::{
    BuySignal, CrossFundAggregator, FundInfo, OverlapSignal, SellSignal, SnapshotReader,
    SqliteSnapshotStore, StoreError, WeightDecreaseSignal, WeightIncreaseSignal,
};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No collector attached to this service")]
    CollectorUnavailable,
}

/// One row of a fund's latest holdings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingView {
    #[serde(rename = "stock_name")]
    pub security_name: String,
    #[serde(rename = "stock_count")]
    pub quantity: Option<i64>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastUpdateInfo {
    pub last_date: Option<NaiveDate>,
    #[serde(rename = "etf_count")]
    pub fund_count: usize,
    #[serde(rename = "stock_count")]
    pub security_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriggerOutcome {
    Started,
    AlreadyRunning,
}

/// Weight descending, missing weights last, then by name
fn by_weight_desc(a: &HoldingView, b: &HoldingView) -> Ordering {
    match (a.weight, b.weight) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.security_name.cmp(&b.security_name))
}

#[derive(Clone)]
pub struct SignalService {
    store: SqliteSnapshotStore,
    collector: Option<Arc<Collector>>,
}

impl SignalService {
    /// Read-only service (reports, dashboards without a collector)
    pub fn new(store: SqliteSnapshotStore) -> Self {
        Self {
            store,
            collector: None,
        }
    }

    pub fn with_collector(mut self, collector: Arc<Collector>) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn store(&self) -> &SqliteSnapshotStore {
        &self.store
    }

    pub fn top_buy_increase(&self, days: usize, top_n: usize) -> Result<Vec<BuySignal>, ServiceError> {
        let view = self.store.read_view()?;
        Ok(CrossFundAggregator::new(&view).top_buy_increase(days, top_n)?)
    }

    pub fn top_sell_liquidation(&self, days: usize, top_n: usize) -> Result<Vec<SellSignal>, ServiceError> {
        let view = self.store.read_view()?;
        Ok(CrossFundAggregator::new(&view).top_sell_liquidation(days, top_n)?)
    }

    pub fn overlapping_holdings(&self, top_n: usize) -> Result<Vec<OverlapSignal>, ServiceError> {
        let view = self.store.read_view()?;
        Ok(CrossFundAggregator::new(&view).overlapping_holdings(top_n)?)
    }

    pub fn weight_increase_signals(&self, top_n: usize) -> Result<Vec<WeightIncreaseSignal>, ServiceError> {
        let view = self.store.read_view()?;
        Ok(CrossFundAggregator::new(&view).weight_increase_signals(top_n)?)
    }

    pub fn weight_decrease_signals(&self, top_n: usize) -> Result<Vec<WeightDecreaseSignal>, ServiceError> {
        let view = self.store.read_view()?;
        Ok(CrossFundAggregator::new(&view).weight_decrease_signals(top_n)?)
    }

    pub fn list_collect_dates(&self, limit: usize) -> Result<Vec<NaiveDate>, ServiceError> {
        Ok(self.store.list_collect_dates(limit)?)
    }

    /// Latest snapshot of one fund, empty if the fund was never collected
    pub fn get_holdings(&self, fund_id: &str) -> Result<Vec<HoldingView>, ServiceError> {
        let view = self.store.read_view()?;
        let Some(latest) = view.latest_date_for(fund_id)? else {
            return Ok(Vec::new());
        };

        let mut holdings: Vec<HoldingView> = view
            .get_snapshot(Some(fund_id), latest)?
            .into_iter()
            .map(|r| HoldingView {
                security_name: r.security_name,
                quantity: r.quantity,
                weight: r.weight,
            })
            .collect();
        holdings.sort_by(by_weight_desc);

        Ok(holdings)
    }

    pub fn get_last_update_info(&self) -> Result<LastUpdateInfo, ServiceError> {
        let view = self.store.read_view()?;
        let Some(last_date) = view.latest_date()? else {
            return Ok(LastUpdateInfo {
                last_date: None,
                fund_count: 0,
                security_count: 0,
            });
        };

        let rows = view.get_snapshot(None, last_date)?;
        let funds: HashSet<&str> = rows.iter().map(|r| r.fund_id.as_str()).collect();
        let securities: HashSet<&str> = rows.iter().map(|r| r.security_name.as_str()).collect();

        Ok(LastUpdateInfo {
            last_date: Some(last_date),
            fund_count: funds.len(),
            security_count: securities.len(),
        })
    }

    /// Fund master list ordered by fund id
    pub fn funds(&self) -> Result<Vec<FundInfo>, ServiceError> {
        let mut funds: Vec<FundInfo> = self
            .store
            .fund_names()?
            .into_iter()
            .map(|(id, name)| FundInfo::new(id, name))
            .collect();
        funds.sort_by(|a, b| a.fund_id.cmp(&b.fund_id));
        Ok(funds)
    }

    /// Start a background collection for today's local date
    ///
    /// Must be called from within a tokio runtime.
    pub fn trigger_collection(&self) -> Result<TriggerOutcome, ServiceError> {
        let collector = self
            .collector
            .clone()
            .ok_or(ServiceError::CollectorUnavailable)?;

        let guard = match collector.job().try_start() {
            Ok(guard) => guard,
            Err(_) => return Ok(TriggerOutcome::AlreadyRunning),
        };

        let collect_date = Local::now().date_naive();
        tokio::spawn(async move {
            collector.run_claimed(guard, collect_date).await;
        });

        Ok(TriggerOutcome::Started)
    }

    pub fn collection_status(&self) -> CollectStatus {
        match &self.collector {
            Some(collector) => collector.job().status(),
            None => CollectStatus {
                running: false,
                progress: String::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot_core::{SnapshotRow, SnapshotWriter};
    use tempfile::{tempdir, TempDir};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
    }

    fn row(fund: &str, day: u32, name: &str, qty: Option<i64>, weight: Option<f64>) -> SnapshotRow {
        SnapshotRow {
            fund_id: fund.to_string(),
            collect_date: d(day),
            security_name: name.to_string(),
            quantity: qty,
            weight,
        }
    }

    fn create_test_service() -> (TempDir, SignalService) {
        let dir = tempdir().unwrap();
        let store = SqliteSnapshotStore::open(dir.path().join("test.db")).unwrap();
        (dir, SignalService::new(store))
    }

    #[test]
    fn test_get_holdings_latest_sorted_nulls_last() {
        let (_dir, service) = create_test_service();
        service
            .store()
            .upsert(&[
                row("A", 1, "Old", Some(1), Some(99.0)),
                row("A", 2, "Cash", None, None),
                row("A", 2, "Small", Some(5), Some(1.5)),
                row("A", 2, "Big", Some(9), Some(30.0)),
                row("B", 3, "Other", Some(1), Some(50.0)),
            ])
            .unwrap();

        let names: Vec<String> = service
            .get_holdings("A")
            .unwrap()
            .into_iter()
            .map(|h| h.security_name)
            .collect();
        assert_eq!(names, vec!["Big", "Small", "Cash"]);

        assert!(service.get_holdings("ZZZ").unwrap().is_empty());
    }

    #[test]
    fn test_last_update_info() {
        let (_dir, service) = create_test_service();
        assert_eq!(
            service.get_last_update_info().unwrap(),
            LastUpdateInfo {
                last_date: None,
                fund_count: 0,
                security_count: 0
            }
        );

        service
            .store()
            .upsert(&[
                row("A", 1, "X", Some(1), Some(1.0)),
                row("A", 2, "X", Some(1), Some(1.0)),
                row("A", 2, "Y", Some(1), Some(1.0)),
                row("B", 2, "X", Some(1), Some(1.0)),
            ])
            .unwrap();

        let info = service.get_last_update_info().unwrap();
        assert_eq!(info.last_date, Some(d(2)));
        assert_eq!(info.fund_count, 2);
        assert_eq!(info.security_count, 2);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["last_date"], "2025-04-02");
        assert_eq!(json["etf_count"], 2);
        assert_eq!(json["stock_count"], 2);
    }

    #[test]
    fn test_funds_sorted() {
        let (_dir, service) = create_test_service();
        service
            .store()
            .seed_funds(&[FundInfo::new("B", "Beta"), FundInfo::new("A", "Alpha")])
            .unwrap();

        assert_eq!(
            service.funds().unwrap(),
            vec![FundInfo::new("A", "Alpha"), FundInfo::new("B", "Beta")]
        );
    }

    #[test]
    fn test_trigger_without_collector() {
        let (_dir, service) = create_test_service();
        assert!(matches!(
            service.trigger_collection(),
            Err(ServiceError::CollectorUnavailable)
        ));
        assert!(!service.collection_status().running);
    }

    #[test]
    fn test_trigger_outcome_wire_format() {
        assert_eq!(
            serde_json::to_value(TriggerOutcome::AlreadyRunning).unwrap(),
            serde_json::json!({"status": "already_running"})
        );
    }
}
