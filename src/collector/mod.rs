//! Holdings acquisition: source, single-slot job, sequential runner and
//! weekday scheduler

pub mod error;
pub mod job;
pub mod runner;
pub mod scheduler;
pub mod source;

pub use error::{CollectError, SourceError};
pub use job::{CollectStatus, CollectionJob, FundCollectResult, FundStatus, JobState, RunSummary};
pub use runner::{Collector, CrawlDelay};
pub use scheduler::{collection_scheduler_task, next_run_after};
pub use source::{HoldingsSource, HttpHoldingsSource};
