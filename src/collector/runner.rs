//! Sequential acquisition run over the tracked funds
//!
//! Funds are fetched one at a time with a jittered pause between requests.
//! A failure for one fund is recorded as that fund's status and never aborts
//! the run.

use super::error::CollectError;
use super::job::{CollectionJob, FundCollectResult, FundStatus, JobGuard, RunSummary};
use super::source::HoldingsSource;
use crate::snapshot_core::{
    ChangeDetector, FundInfo, Holding, SnapshotRow, SnapshotStore, StoreError,
};
use chrono::NaiveDate;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Pause between consecutive fund requests: `base + uniform(0, jitter)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlDelay {
    pub base: Duration,
    pub jitter: Duration,
}

impl CrawlDelay {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    /// No pause at all (tests, one-off runs against a local source)
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn sample(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.base;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        self.base + Duration::from_millis(jitter_ms)
    }
}

impl Default for CrawlDelay {
    fn default() -> Self {
        Self::new(Duration::from_millis(1_500), Duration::from_millis(700))
    }
}

/// Acquisition runner bound to one store, one source and the fund list
pub struct Collector {
    store: Arc<dyn SnapshotStore>,
    source: Arc<dyn HoldingsSource>,
    funds: Vec<FundInfo>,
    delay: CrawlDelay,
    job: CollectionJob,
}

impl Collector {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        source: Arc<dyn HoldingsSource>,
        funds: Vec<FundInfo>,
        delay: CrawlDelay,
    ) -> Self {
        Self {
            store,
            source,
            funds,
            delay,
            job: CollectionJob::new(),
        }
    }

    pub fn job(&self) -> &CollectionJob {
        &self.job
    }

    /// Claim the job slot and collect every fund for `collect_date`
    ///
    /// Returns `CollectError::AlreadyRunning` without doing anything if a run
    /// is already in flight.
    pub async fn run(&self, collect_date: NaiveDate) -> Result<Vec<FundCollectResult>, CollectError> {
        let guard = self.job.try_start()?;
        Ok(self.run_claimed(guard, collect_date).await)
    }

    /// Collect with an already claimed slot (used by background triggers that
    /// must report `AlreadyRunning` before spawning)
    pub async fn run_claimed(&self, guard: JobGuard, collect_date: NaiveDate) -> Vec<FundCollectResult> {
        log::info!("📥 Collection run started ({})", collect_date);
        log::info!("   ├─ Funds: {}", self.funds.len());
        log::info!("   └─ Delay: {:?} + up to {:?}", self.delay.base, self.delay.jitter);

        let total = self.funds.len();
        let mut results = Vec::with_capacity(total);

        for (i, fund) in self.funds.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.delay.sample()).await;
            }
            guard.set_progress(format!("{}/{} {}", i + 1, total, fund.display_name));

            results.push(self.collect_fund(fund, collect_date).await);
        }

        let summary = RunSummary::from_results(&results);
        log::info!(
            "✅ Collection run finished: saved {} / unchanged {} / errors {}",
            summary.saved,
            summary.unchanged,
            summary.errors
        );
        guard.finish(summary);

        results
    }

    async fn collect_fund(&self, fund: &FundInfo, collect_date: NaiveDate) -> FundCollectResult {
        let mut result = FundCollectResult {
            fund_id: fund.fund_id.clone(),
            display_name: fund.display_name.clone(),
            status: FundStatus::Error,
            count: 0,
        };

        let holdings = match self.source.fetch_holdings(&fund.fund_id).await {
            Ok(holdings) => holdings,
            Err(e) => {
                log::error!("❌ Fetch failed: {} [{}] - {}", fund.display_name, fund.fund_id, e);
                return result;
            }
        };

        if holdings.is_empty() {
            log::warn!("⚠️  No holdings returned: {} [{}]", fund.display_name, fund.fund_id);
            result.status = FundStatus::Empty;
            return result;
        }

        // rusqlite blocks; keep it off the async workers
        let store = Arc::clone(&self.store);
        let fund_id = fund.fund_id.clone();
        let stored = tokio::task::spawn_blocking(move || {
            store_if_changed(store.as_ref(), &fund_id, collect_date, &holdings)
        })
        .await;

        let stored = match stored {
            Ok(stored) => stored,
            Err(e) => {
                log::error!("❌ Store task failed: {} [{}] - {}", fund.display_name, fund.fund_id, e);
                return result;
            }
        };

        match stored {
            Ok(Some(count)) => {
                log::info!("💾 Saved: {} [{}] - {} holdings", fund.display_name, fund.fund_id, count);
                result.status = FundStatus::Saved;
                result.count = count;
            }
            Ok(None) => {
                log::info!("⏭️  Unchanged, skipped: {} [{}]", fund.display_name, fund.fund_id);
                result.status = FundStatus::Unchanged;
            }
            Err(e) => {
                log::error!("❌ Store failed: {} [{}] - {}", fund.display_name, fund.fund_id, e);
            }
        }

        result
    }
}

/// Write `holdings` as the fund's snapshot for `collect_date` unless they
/// match the last stored snapshot. Returns the row count written.
fn store_if_changed(
    store: &dyn SnapshotStore,
    fund_id: &str,
    collect_date: NaiveDate,
    holdings: &[Holding],
) -> Result<Option<usize>, StoreError> {
    if !ChangeDetector::has_changed(store, fund_id, holdings)? {
        return Ok(None);
    }

    let rows: Vec<SnapshotRow> = holdings
        .iter()
        .map(|h| SnapshotRow::from_holding(fund_id, collect_date, h))
        .collect();

    store.upsert(&rows).map(Some)
}
