//! FundFlow Signals - one-shot JSON reports over the holdings store
//!
//! Usage:
//!   fundflow_signals --report <REPORT> [--days N] [--top N] [--fund FUND_ID]
//!
//! Reports:
//!   top-buy      Net buying across funds over the lookback window
//!   top-sell     Full liquidations over the lookback window
//!   overlap      Securities held by two or more funds on the latest date
//!   weight-up    Day-over-day weight increases with streaks
//!   weight-down  Day-over-day weight decreases with streaks
//!   dates        Collected snapshot dates (most recent first)
//!   holdings     Latest holdings of `--fund`
//!   last-update  Latest date with fund and security counts

use dotenv::dotenv;
use fundflow::config::AppConfig;
use fundflow::service::SignalService;
use fundflow::snapshot_core::aggregator::{
    DEFAULT_FLOW_TOP_N, DEFAULT_LOOKBACK_DAYS, DEFAULT_SIGNAL_TOP_N,
};
use fundflow::snapshot_core::window::LOOKBACK_DATE_LIMIT;
use fundflow::snapshot_core::SqliteSnapshotStore;
use serde::Serialize;
use std::env;

#[derive(Debug)]
struct ReportArgs {
    report: String,
    days: Option<usize>,
    top: Option<usize>,
    fund: Option<String>,
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}

fn parse_number(args: &[String], flag: &str) -> Result<Option<usize>, Box<dyn std::error::Error>> {
    match arg_value(args, flag) {
        Some(raw) => Ok(Some(
            raw.parse()
                .map_err(|_| format!("Invalid value for {}: {}", flag, raw))?,
        )),
        None => Ok(None),
    }
}

impl ReportArgs {
    fn from_args() -> Result<Self, Box<dyn std::error::Error>> {
        let args: Vec<String> = env::args().collect();

        let report = arg_value(&args, "--report")
            .ok_or("Missing --report argument. Usage: fundflow_signals --report <REPORT>")?;

        Ok(Self {
            report,
            days: parse_number(&args, "--days")?,
            top: parse_number(&args, "--top")?,
            fund: arg_value(&args, "--fund"),
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = ReportArgs::from_args()?;
    let config = AppConfig::from_env()?;

    log::info!("📊 Report '{}' from {}", args.report, config.db_path.display());

    let service = SignalService::new(SqliteSnapshotStore::open(&config.db_path)?);

    let days = args.days.unwrap_or(DEFAULT_LOOKBACK_DAYS);
    let flow_top = args.top.unwrap_or(DEFAULT_FLOW_TOP_N);
    let signal_top = args.top.unwrap_or(DEFAULT_SIGNAL_TOP_N);

    match args.report.as_str() {
        "top-buy" => print_json(&service.top_buy_increase(days, flow_top)?),
        "top-sell" => print_json(&service.top_sell_liquidation(days, flow_top)?),
        "overlap" => print_json(&service.overlapping_holdings(signal_top)?),
        "weight-up" => print_json(&service.weight_increase_signals(signal_top)?),
        "weight-down" => print_json(&service.weight_decrease_signals(signal_top)?),
        "dates" => print_json(
            &service.list_collect_dates(args.top.unwrap_or(LOOKBACK_DATE_LIMIT))?,
        ),
        "holdings" => {
            let fund = args
                .fund
                .ok_or("Missing --fund argument for the holdings report")?;
            print_json(&service.get_holdings(&fund)?)
        }
        "last-update" => print_json(&service.get_last_update_info()?),
        other => Err(format!("Unknown report: {}", other).into()),
    }
}
