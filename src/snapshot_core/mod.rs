//! Snapshot Core - Holdings time-series analysis engine
//!
//! # Architecture
//!
//! ```text
//! HoldingsSource → ChangeDetector (gate) → SnapshotStore::upsert
//!                                                ↓
//!                      SnapshotReader (point-in-time view)
//!                                                ↓
//!                 SnapshotDiffEngine (per fund/security deltas)
//!                                                ↓
//!          CrossFundAggregator (buy / sell / overlap / weight signals)
//!                                                ↓
//!                StreakCalculator (weight momentum enrichment)
//! ```
//!
//! ## Schema Reference
//!
//! - `fund_master` → `FundInfo`
//! - `holdings_snapshots` → `SnapshotRow`

pub mod aggregator;
pub mod detector;
pub mod diff;
pub mod error;
pub mod schema;
pub mod signals;
pub mod sqlite_store;
pub mod store;
pub mod streak;
pub mod types;
pub mod window;

pub use aggregator::CrossFundAggregator;
pub use detector::ChangeDetector;
pub use diff::{HoldingDelta, SnapshotDiff, SnapshotDiffEngine};
pub use error::StoreError;
pub use signals::{
    BuySignal, OverlapSignal, SellSignal, WeightDecreaseSignal, WeightIncreaseSignal,
};
pub use sqlite_store::{SqliteReadView, SqliteSnapshotStore};
pub use store::{SnapshotReader, SnapshotStore, SnapshotWriter};
pub use streak::{Direction, StreakCalculator};
pub use types::{FundInfo, Holding, HoldingKey, SnapshotRow};
pub use window::ComparisonWindow;
