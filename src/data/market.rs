//! Market-data REST client (Moralis-compatible deep-index API)
//! Serves token metadata, current pair price and the top-holders list.

use super::{retry::retry_with_backoff, DataError, DataResult, TokenDataSource};
use async_trait::async_trait;
use serde::Deserialize;

const VENDOR: &str = "moralis";
const TIMEOUT_SECONDS: u64 = 30;

/// Composite token metadata returned by the metadata endpoint
#[derive(Debug, Clone)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub address: String,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub website: Option<String>,
    /// Total supply adjusted for decimals, rounded to the token's precision
    pub total_supply_formatted: f64,
}

/// Current price and pool liquidity for the token's main pair. Both fields
/// are absent when pools are too thin to price the token.
#[derive(Debug, Clone, Deserialize)]
pub struct PairPrice {
    #[serde(rename = "usdPrice")]
    pub usd_price: Option<f64>,
    #[serde(rename = "pairTotalLiquidityUsd")]
    pub pair_total_liquidity_usd: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MetadataRow {
    name: String,
    symbol: String,
    address: String,
    decimals: Option<String>,
    total_supply_formatted: Option<String>,
    links: Option<MetadataLinks>,
}

#[derive(Debug, Deserialize)]
struct MetadataLinks {
    twitter: Option<String>,
    telegram: Option<String>,
    website: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwnersResponse {
    result: Vec<OwnerRow>,
}

#[derive(Debug, Deserialize)]
struct OwnerRow {
    is_contract: bool,
    percentage_relative_to_total_supply: f64,
}

pub struct MarketDataClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl MarketDataClient {
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECONDS))
            .user_agent("tokenscout/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: "https://deep-index.moralis.io/api/v2.2".to_string(),
        }
    }

    fn api_key(&self) -> DataResult<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            DataError::Config("MORALIS_API_KEY environment variable must be set".to_string())
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> DataResult<T> {
        let api_key = self.api_key()?;
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("X-API-Key", api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| DataError::from_reqwest(VENDOR, TIMEOUT_SECONDS, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                return Err(DataError::RateLimit {
                    vendor: VENDOR,
                    retry_after: 60,
                });
            }
            return Err(DataError::Api {
                vendor: VENDOR,
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DataError::from_reqwest(VENDOR, TIMEOUT_SECONDS, e))
    }
}

#[async_trait]
impl TokenDataSource for MarketDataClient {
    async fn token_metadata(&self, address: &str, chain: &str) -> DataResult<TokenMetadata> {
        tracing::info!("Fetching token metadata for {} on {}", address, chain);

        let query = [("chain", chain), ("addresses[]", address)];
        let rows: Vec<MetadataRow> = retry_with_backoff(
            || self.get_json("erc20/metadata", &query),
            3,
        )
        .await?;

        let row = rows.into_iter().next().ok_or_else(|| DataError::Api {
            vendor: VENDOR,
            status: 200,
            message: format!("no metadata returned for {address}"),
        })?;

        let decimals: i32 = row
            .decimals
            .as_deref()
            .and_then(|d| d.parse().ok())
            .unwrap_or(0);
        let supply: f64 = row
            .total_supply_formatted
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);
        let links = row.links.unwrap_or(MetadataLinks {
            twitter: None,
            telegram: None,
            website: None,
        });

        Ok(TokenMetadata {
            name: row.name,
            symbol: row.symbol,
            address: row.address,
            twitter: links.twitter,
            telegram: links.telegram,
            website: links.website,
            total_supply_formatted: round_to_decimals(supply, decimals),
        })
    }

    async fn top_holder_percentages(&self, address: &str, chain: &str) -> DataResult<Vec<f64>> {
        let path = format!("erc20/{address}/owners");
        let query = [("chain", chain), ("limit", "11"), ("order", "DESC")];
        let response: OwnersResponse = retry_with_backoff(
            || self.get_json(&path, &query),
            3,
        )
        .await?;

        Ok(response
            .result
            .into_iter()
            .filter(|row| !row.is_contract)
            .map(|row| row.percentage_relative_to_total_supply)
            .collect())
    }

    async fn pair_price(&self, address: &str, chain: &str) -> DataResult<PairPrice> {
        let path = format!("erc20/{address}/price");
        let query = [("chain", chain)];
        retry_with_backoff(|| self.get_json(&path, &query), 3).await
    }
}

/// Round a decimals-adjusted supply to the token's own precision
fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_decimals() {
        assert_eq!(round_to_decimals(1234.56789, 2), 1234.57);
        assert_eq!(round_to_decimals(0.123456, 4), 0.1235);
        assert_eq!(round_to_decimals(1000.0, 0), 1000.0);
    }

    #[test]
    fn test_metadata_row_decoding() {
        let body = r#"[{
            "name": "Pepe",
            "symbol": "PEPE",
            "address": "0xabc",
            "decimals": "18",
            "total_supply_formatted": "420690000000000.5",
            "links": {"twitter": "https://x.com/pepe", "website": null}
        }]"#;
        let rows: Vec<MetadataRow> = serde_json::from_str(body).expect("metadata should decode");
        assert_eq!(rows[0].symbol, "PEPE");
        assert_eq!(rows[0].decimals.as_deref(), Some("18"));
        assert!(rows[0].links.as_ref().and_then(|l| l.website.clone()).is_none());
    }

    #[test]
    fn test_owners_filter_contracts() {
        let body = r#"{"result": [
            {"is_contract": false, "percentage_relative_to_total_supply": 4.2},
            {"is_contract": true, "percentage_relative_to_total_supply": 11.0},
            {"is_contract": false, "percentage_relative_to_total_supply": 1.3}
        ]}"#;
        let response: OwnersResponse = serde_json::from_str(body).expect("owners should decode");
        let holders: Vec<f64> = response
            .result
            .into_iter()
            .filter(|row| !row.is_contract)
            .map(|row| row.percentage_relative_to_total_supply)
            .collect();
        assert_eq!(holders, vec![4.2, 1.3]);
    }

    #[test]
    fn test_pair_price_missing_fields() {
        let price: PairPrice = serde_json::from_str("{}").expect("empty object should decode");
        assert!(price.usd_price.is_none());
        assert!(price.pair_total_liquidity_usd.is_none());
    }
}
