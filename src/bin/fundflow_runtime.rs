//! FundFlow Runtime - holdings collection service
//!
//! - Opens the snapshot store (schema migrations are embedded and idempotent)
//! - Seeds the fund master table from configuration
//! - Spawns the weekday collection scheduler
//! - Optionally runs one collection immediately (`--collect-now`)
//!
//! Usage:
//!   cargo run --release --bin fundflow_runtime [-- --collect-now]
//!
//! Environment variables: see `AppConfig::from_env`.

use dotenv::dotenv;
use fundflow::collector::{collection_scheduler_task, Collector, HttpHoldingsSource};
use fundflow::config::AppConfig;
use fundflow::service::{SignalService, TriggerOutcome};
use fundflow::snapshot_core::{SnapshotWriter, SqliteSnapshotStore};
use log::{error, info, warn};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let collect_now = env::args().any(|a| a == "--collect-now");

    info!("🚀 FundFlow Runtime");
    info!("   ├─ Version: {}", env!("CARGO_PKG_VERSION"));
    info!("   └─ Collect now: {}", collect_now);

    let config = AppConfig::from_env()?;

    info!("✅ Configuration loaded");
    info!("   ├─ Database: {}", config.db_path.display());
    info!("   ├─ Source: {}", config.source_url);
    info!("   ├─ Request timeout: {:?}", config.request_timeout);
    info!("   ├─ Funds: {}", config.funds.len());
    info!(
        "   └─ Schedule: Mon-Fri {:02}:{:02} ({})",
        config.schedule_hour,
        config.schedule_minute,
        if config.scheduler_enabled { "enabled" } else { "disabled" }
    );

    info!("🔧 Initializing database...");
    let store = SqliteSnapshotStore::open(&config.db_path)?;
    store.seed_funds(&config.funds)?;
    info!("✅ Database initialized ({} funds seeded)", config.funds.len());

    let source = HttpHoldingsSource::new(config.source_url.clone(), config.request_timeout)?;
    let collector = Arc::new(Collector::new(
        Arc::new(store.clone()),
        Arc::new(source),
        config.funds.clone(),
        config.crawl_delay,
    ));
    let service = SignalService::new(store).with_collector(collector.clone());

    if config.scheduler_enabled {
        let scheduler_collector = collector.clone();
        let (hour, minute) = (config.schedule_hour, config.schedule_minute);
        tokio::spawn(async move {
            collection_scheduler_task(scheduler_collector, hour, minute).await;
        });
        info!("   └─ ✅ Scheduler task spawned");
    } else {
        warn!("⚠️  Scheduler is DISABLED (set FUNDFLOW_SCHEDULER_ENABLED=true to activate)");
    }

    if collect_now {
        match service.trigger_collection()? {
            TriggerOutcome::Started => info!("📥 Immediate collection started"),
            TriggerOutcome::AlreadyRunning => warn!("⚠️  Collection already running"),
        }
    }

    info!("");
    info!("🔄 Press CTRL+C to shutdown gracefully");

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("");
            info!("⚠️  Received CTRL+C, shutting down...");
        }
        Err(err) => {
            error!("❌ Failed to listen for CTRL+C: {}", err);
        }
    }

    let status = service.collection_status();
    if status.running {
        warn!("⚠️  Collection interrupted at: {}", status.progress);
    }

    info!("✅ FundFlow runtime stopped");
    Ok(())
}
