//! Holdings acquisition
//!
//! ## HTTP source
//!
//! Endpoint: `{base_url}/{fund_id}`
//! Returns: JSON array of holdings
//!
//! ```json
//! [{"stock_name": "SK hynix", "stock_count": 1520, "weight": 24.81}]
//! ```
//!
//! `quantity`/`weight` may be null. `security_name` is accepted as an alias
//! of `stock_name`.

use super::error::SourceError;
use crate::snapshot_core::Holding;
use async_trait::async_trait;
use std::time::Duration;

/// Provider of the current holdings of one fund
#[async_trait]
pub trait HoldingsSource: Send + Sync {
    async fn fetch_holdings(&self, fund_id: &str) -> Result<Vec<Holding>, SourceError>;
}

/// JSON-over-HTTP holdings provider
#[derive(Debug, Clone)]
pub struct HttpHoldingsSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHoldingsSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fundflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, fund_id: &str) -> String {
        format!("{}/{}", self.base_url, fund_id)
    }
}

#[async_trait]
impl HoldingsSource for HttpHoldingsSource {
    async fn fetch_holdings(&self, fund_id: &str) -> Result<Vec<Holding>, SourceError> {
        let response = self.client.get(self.url_for(fund_id)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_holdings(&body)
    }
}

/// Decode a holdings payload, dropping rows without a security name
pub fn parse_holdings(body: &[u8]) -> Result<Vec<Holding>, SourceError> {
    let holdings: Vec<Holding> = serde_json::from_slice(body)?;
    Ok(holdings
        .into_iter()
        .filter_map(|mut h| {
            let trimmed = h.security_name.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed.len() != h.security_name.len() {
                h.security_name = trimmed.to_string();
            }
            Some(h)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_holdings() {
        let body = br#"[
            {"stock_name": "SK hynix", "stock_count": 1520, "weight": 24.81},
            {"security_name": " Cash ", "quantity": null, "weight": null},
            {"stock_name": "  ", "stock_count": 1, "weight": 1.0}
        ]"#;

        let holdings = parse_holdings(body).unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0], Holding::new("SK hynix", Some(1520), Some(24.81)));
        assert_eq!(holdings[1], Holding::new("Cash", None, None));
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_holdings(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_holdings(b"<html>"),
            Err(SourceError::Decode(_))
        ));
    }

    #[test]
    fn test_url_for_strips_trailing_slash() {
        let source =
            HttpHoldingsSource::new("http://127.0.0.1:8788/holdings/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(source.url_for("474590"), "http://127.0.0.1:8788/holdings/474590");
    }

    #[tokio::test]
    #[ignore] // Requires a running holdings endpoint
    async fn test_fetch_live() {
        let source =
            HttpHoldingsSource::new("http://127.0.0.1:8788/holdings", Duration::from_secs(15))
                .unwrap();
        let holdings = source.fetch_holdings("474590").await.unwrap();
        assert!(!holdings.is_empty());
    }
}
