//! Snapshot store traits
//!
//! Read and write sides are split so analyses can run against a
//! point-in-time read view while the collector holds the writer.

use super::error::StoreError;
use super::types::{FundInfo, SnapshotRow};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Read access to the holdings time series
pub trait SnapshotReader {
    /// Distinct collect dates, most recent first, truncated to `limit`
    fn list_collect_dates(&self, limit: usize) -> Result<Vec<NaiveDate>, StoreError>;

    /// All rows for `collect_date`, optionally restricted to one fund
    ///
    /// Rows come back ordered by `(fund_id, security_name)`.
    fn get_snapshot(
        &self,
        fund_id: Option<&str>,
        collect_date: NaiveDate,
    ) -> Result<Vec<SnapshotRow>, StoreError>;

    /// Most recent date for which `fund_id` has any rows
    fn latest_date_for(&self, fund_id: &str) -> Result<Option<NaiveDate>, StoreError>;

    /// Mean of the non-null weights of `security_name` across funds on `collect_date`
    ///
    /// `None` when no fund holds it (or every weight is null).
    fn average_weight(
        &self,
        security_name: &str,
        collect_date: NaiveDate,
    ) -> Result<Option<f64>, StoreError>;

    /// Most recent collect date across all funds
    fn latest_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        Ok(self.list_collect_dates(1)?.into_iter().next())
    }

    /// Fund master as `fund_id -> display_name`
    fn fund_names(&self) -> Result<HashMap<String, String>, StoreError>;
}

/// Write access to the holdings time series
pub trait SnapshotWriter {
    /// Insert rows, replacing any row with the same
    /// `(fund_id, collect_date, security_name)` key
    ///
    /// Atomic per call: either every row lands or none does.
    fn upsert(&self, rows: &[SnapshotRow]) -> Result<usize, StoreError>;

    /// Insert-or-replace fund master entries
    fn seed_funds(&self, funds: &[FundInfo]) -> Result<(), StoreError>;
}

/// A store usable by both the collector and the analyses
pub trait SnapshotStore: SnapshotReader + SnapshotWriter + Send + Sync {}

impl<T: SnapshotReader + SnapshotWriter + Send + Sync> SnapshotStore for T {}
