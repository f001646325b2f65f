//! Core snapshot data structures
//!
//! `SnapshotRow` mirrors one row of the `holdings_snapshots` table
//! (see `sql/01_holdings_snapshots.sql`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One holding as produced by acquisition, before it is dated and attributed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    #[serde(alias = "stock_name")]
    pub security_name: String,
    #[serde(alias = "stock_count")]
    pub quantity: Option<i64>,
    pub weight: Option<f64>,
}

impl Holding {
    pub fn new(security_name: impl Into<String>, quantity: Option<i64>, weight: Option<f64>) -> Self {
        Self {
            security_name: security_name.into(),
            quantity,
            weight,
        }
    }
}

/// The atomic fact: one security held by one fund on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub fund_id: String,
    pub collect_date: NaiveDate,
    pub security_name: String,
    pub quantity: Option<i64>,
    pub weight: Option<f64>,
}

impl SnapshotRow {
    /// Attribute an acquired holding to a fund and date
    pub fn from_holding(fund_id: &str, collect_date: NaiveDate, holding: &Holding) -> Self {
        Self {
            fund_id: fund_id.to_string(),
            collect_date,
            security_name: holding.security_name.clone(),
            quantity: holding.quantity,
            weight: holding.weight,
        }
    }

    pub fn key(&self) -> HoldingKey {
        HoldingKey {
            fund_id: self.fund_id.clone(),
            security_name: self.security_name.clone(),
        }
    }

    pub fn quantity_or_zero(&self) -> i64 {
        self.quantity.unwrap_or(0)
    }

    pub fn weight_or_zero(&self) -> f64 {
        self.weight.unwrap_or(0.0)
    }
}

/// `(fund_id, security_name)` join key used by the diff engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HoldingKey {
    pub fund_id: String,
    pub security_name: String,
}

/// Fund master entry (static reference data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundInfo {
    pub fund_id: String,
    pub display_name: String,
}

impl FundInfo {
    pub fn new(fund_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            fund_id: fund_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Round to a fixed number of decimal places (half away from zero)
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
