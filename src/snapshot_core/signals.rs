//! Signal records produced by the cross-fund aggregator
//!
//! Serialized field names follow the dashboard contract
//! (`stock_name`, `etf_count`, ...).

use serde::Serialize;

/// Net buying across funds over the lookback window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuySignal {
    #[serde(rename = "stock_name")]
    pub security_name: String,
    #[serde(rename = "etf_count")]
    pub fund_count: usize,
    pub total_increase: i64,
    pub weight_change: f64,
}

/// Full liquidation: held on the older date, gone on the latest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellSignal {
    #[serde(rename = "stock_name")]
    pub security_name: String,
    #[serde(rename = "etf_count")]
    pub fund_count: usize,
    pub total_decrease: i64,
    pub prev_weight: f64,
}

/// Security held by two or more funds on the latest date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapSignal {
    #[serde(rename = "stock_name")]
    pub security_name: String,
    #[serde(rename = "etf_count")]
    pub fund_count: usize,
    #[serde(rename = "etf_names")]
    pub fund_names: Vec<String>,
    pub total_weight: f64,
    pub avg_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightIncreaseSignal {
    #[serde(rename = "stock_name")]
    pub security_name: String,
    pub weight_increase: f64,
    #[serde(rename = "etf_count")]
    pub fund_count: usize,
    pub consecutive_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightDecreaseSignal {
    #[serde(rename = "stock_name")]
    pub security_name: String,
    pub weight_decrease: f64,
    #[serde(rename = "etf_count")]
    pub fund_count: usize,
    pub consecutive_days: u32,
}
