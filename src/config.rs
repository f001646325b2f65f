//! Runtime configuration from environment variables

use crate::collector::CrawlDelay;
use crate::snapshot_core::FundInfo;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Failed to read funds file {path}: {source}")]
    FundsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed funds file {path}: {source}")]
    FundsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tracked Korean active ETFs: (Naver item code, display name)
const DEFAULT_FUNDS: &[(&str, &str)] = &[
    ("494220", "UNICORN SK하이닉스밸류체인액티브"),
    ("474590", "WON 반도체밸류체인액티브"),
    ("388420", "RISE 비메모리반도체액티브"),
    ("0088N0", "WON K-글로벌수급상위"),
    ("476850", "KoAct 배당성장액티브"),
    ("441800", "TIMEFOLIO Korea플러스배당액티브"),
    ("385510", "KODEX 신재생에너지액티브"),
    ("404120", "TIMEFOLIO K신재생에너지액티브"),
    ("422420", "RISE 2차전지액티브"),
    ("385710", "TIMEFOLIO K이노베이션액티브"),
    ("422260", "VITA MZ소비액티브"),
    ("487130", "KoAct AI인프라액티브"),
    ("385720", "TIMEFOLIO 코스피액티브"),
    ("445150", "KODEX 친환경조선해운액티브"),
    ("471780", "TIGER 코리아테크액티브"),
    ("0074K0", "KoAct K수출핵심기업TOP30액티브"),
    ("445290", "KODEX 로봇액티브"),
    ("410870", "TIMEFOLIO K컬처액티브"),
    ("495060", "TIMEFOLIO 코리아밸류업액티브"),
    ("495230", "KoAct 코리아밸류업액티브"),
    ("496130", "TRUSTON 코리아밸류업액티브"),
    ("463050", "TIMEFOLIO K바이오액티브"),
    ("462900", "KoAct 바이오헬스케어액티브"),
    ("0000Z0", "RISE 바이오TOP10액티브"),
    ("494890", "KODEX 200액티브"),
];

pub fn default_funds() -> Vec<FundInfo> {
    DEFAULT_FUNDS
        .iter()
        .map(|&(id, name)| FundInfo::new(id, name))
        .collect()
}

/// Configuration for the collector runtime and report binaries
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to SQLite database file
    pub db_path: PathBuf,

    /// Base URL of the holdings endpoint (`{base}/{fund_id}`)
    pub source_url: String,

    pub request_timeout: Duration,

    /// Pause between fund requests
    pub crawl_delay: CrawlDelay,

    /// Local wall time of the weekday run
    pub schedule_hour: u32,
    pub schedule_minute: u32,

    pub scheduler_enabled: bool,

    pub funds: Vec<FundInfo>,
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn bounded(name: &'static str, default: u32, max: u32) -> Result<u32, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().parse::<u32>() {
            Ok(v) if v <= max => Ok(v),
            _ => Err(ConfigError::InvalidValue { name, value: raw }),
        },
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `FUNDFLOW_DB_PATH` (default: data/fundflow.db)
    /// - `FUNDFLOW_SOURCE_URL` (default: http://127.0.0.1:8788/holdings)
    /// - `FUNDFLOW_REQUEST_TIMEOUT_SECS` (default: 15)
    /// - `FUNDFLOW_CRAWL_SLEEP_MS` (default: 1500)
    /// - `FUNDFLOW_CRAWL_JITTER_MS` (default: 700)
    /// - `FUNDFLOW_SCHEDULE_HOUR` (default: 20, 0-23)
    /// - `FUNDFLOW_SCHEDULE_MINUTE` (default: 0, 0-59)
    /// - `FUNDFLOW_SCHEDULER_ENABLED` (default: true)
    /// - `FUNDFLOW_FUNDS_FILE` (optional JSON `[{"fund_id", "display_name"}]`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let funds = match env::var("FUNDFLOW_FUNDS_FILE") {
            Ok(path) if !path.trim().is_empty() => load_funds_file(PathBuf::from(path))?,
            _ => default_funds(),
        };

        Ok(Self {
            db_path: env::var("FUNDFLOW_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/fundflow.db")),

            source_url: env::var("FUNDFLOW_SOURCE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8788/holdings".to_string()),

            request_timeout: Duration::from_secs(parsed("FUNDFLOW_REQUEST_TIMEOUT_SECS", 15)),

            crawl_delay: CrawlDelay::new(
                Duration::from_millis(parsed("FUNDFLOW_CRAWL_SLEEP_MS", 1_500)),
                Duration::from_millis(parsed("FUNDFLOW_CRAWL_JITTER_MS", 700)),
            ),

            schedule_hour: bounded("FUNDFLOW_SCHEDULE_HOUR", 20, 23)?,
            schedule_minute: bounded("FUNDFLOW_SCHEDULE_MINUTE", 0, 59)?,

            scheduler_enabled: parsed("FUNDFLOW_SCHEDULER_ENABLED", true),

            funds,
        })
    }
}

fn load_funds_file(path: PathBuf) -> Result<Vec<FundInfo>, ConfigError> {
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(source) => return Err(ConfigError::FundsFile { path, source }),
    };
    serde_json::from_str(&raw).map_err(|source| ConfigError::FundsFormat { path, source })
}
