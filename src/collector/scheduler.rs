//! Weekday daily trigger for the collector

use super::error::CollectError;
use super::runner::Collector;
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime, Weekday};
use std::sync::Arc;
use std::time::Duration;

fn is_weekday(weekday: Weekday) -> bool {
    !matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Next Monday-Friday `hour:minute` strictly after `now` (local wall time)
///
/// Returns `None` only for an out-of-range `hour`/`minute`.
pub fn next_run_after(now: NaiveDateTime, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    let at = NaiveTime::from_hms_opt(hour, minute, 0)?;

    let mut day = now.date();
    loop {
        let candidate = day.and_time(at);
        if candidate > now && is_weekday(day.weekday()) {
            return Some(candidate);
        }
        day = day.succ_opt()?;
    }
}

/// Scheduler task - sleeps until the next weekday run time, then collects
///
/// A tick that finds a run already in flight is skipped. Runs indefinitely
/// until cancelled.
pub async fn collection_scheduler_task(collector: Arc<Collector>, hour: u32, minute: u32) {
    log::info!("⏰ Starting collection scheduler (Mon-Fri {:02}:{:02})", hour, minute);

    loop {
        let now = Local::now().naive_local();
        let Some(next) = next_run_after(now, hour, minute) else {
            log::error!("❌ Invalid schedule {:02}:{:02}, scheduler stopped", hour, minute);
            return;
        };

        let wait = (next - now)
            .max(ChronoDuration::zero())
            .to_std()
            .unwrap_or(Duration::ZERO);
        log::info!("   └─ Next collection at {} (in {}s)", next, wait.as_secs());
        tokio::time::sleep(wait).await;

        let collect_date = Local::now().date_naive();
        if let Err(CollectError::AlreadyRunning) = collector.run(collect_date).await {
            log::warn!("⚠️  Scheduled collection skipped: a run is already in progress");
        }
    }
}
