//! Single-slot collection job state
//!
//! At most one collection run may be in flight per process. A second trigger
//! while one is running is rejected, never queued.

use super::error::CollectError;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Per-fund outcome of one acquisition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FundStatus {
    /// Changed snapshot written
    Saved,
    /// Identical to the last stored snapshot, nothing written
    Unchanged,
    /// Source returned no holdings
    Empty,
    /// Fetch, decode or store failure for this fund only
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundCollectResult {
    pub fund_id: String,
    pub display_name: String,
    pub status: FundStatus,
    /// Rows written (only non-zero when `Saved`)
    pub count: usize,
}

/// Counts over one finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub saved: usize,
    pub unchanged: usize,
    /// `Empty` and `Error` together
    pub errors: usize,
}

impl RunSummary {
    pub fn from_results(results: &[FundCollectResult]) -> Self {
        let mut summary = Self::default();
        for r in results {
            match r.status {
                FundStatus::Saved => summary.saved += 1,
                FundStatus::Unchanged => summary.unchanged += 1,
                FundStatus::Empty | FundStatus::Error => summary.errors += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Idle,
    Running { progress: String },
    Done(RunSummary),
    Failed(String),
}

impl JobState {
    pub fn is_running(&self) -> bool {
        matches!(self, JobState::Running { .. })
    }

    /// Human-readable progress line
    pub fn progress(&self) -> String {
        match self {
            JobState::Idle => String::new(),
            JobState::Running { progress } => progress.clone(),
            JobState::Done(s) => format!(
                "done: saved {}, unchanged {}, errors {}",
                s.saved, s.unchanged, s.errors
            ),
            JobState::Failed(e) => format!("failed: {}", e),
        }
    }
}

/// Snapshot of the job state for status endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectStatus {
    pub running: bool,
    pub progress: String,
}

/// Shared handle to the single collection slot
#[derive(Debug, Clone)]
pub struct CollectionJob {
    state: Arc<Mutex<JobState>>,
}

impl Default for CollectionJob {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionJob {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(JobState::Idle)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        // A poisoned lock only means a panicking holder; the state value is still usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> JobState {
        self.lock().clone()
    }

    pub fn status(&self) -> CollectStatus {
        let state = self.lock();
        CollectStatus {
            running: state.is_running(),
            progress: state.progress(),
        }
    }

    /// Claim the slot, or fail with `AlreadyRunning`
    pub fn try_start(&self) -> Result<JobGuard, CollectError> {
        let mut state = self.lock();
        if state.is_running() {
            return Err(CollectError::AlreadyRunning);
        }
        *state = JobState::Running {
            progress: "started".to_string(),
        };
        Ok(JobGuard {
            job: self.clone(),
            finished: false,
        })
    }
}

/// Ownership of the running slot
///
/// Dropping the guard without calling `finish` marks the run failed,
/// so the slot can never stay stuck in `Running`.
#[derive(Debug)]
pub struct JobGuard {
    job: CollectionJob,
    finished: bool,
}

impl JobGuard {
    pub fn set_progress(&self, progress: impl Into<String>) {
        *self.job.lock() = JobState::Running {
            progress: progress.into(),
        };
    }

    pub fn finish(mut self, summary: RunSummary) {
        *self.job.lock() = JobState::Done(summary);
        self.finished = true;
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        if !self.finished {
            *self.job.lock() = JobState::Failed("collection aborted".to_string());
        }
    }
}
