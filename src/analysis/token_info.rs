//! Composite point-in-time snapshot of a token's market and holder state.
//! Every call re-fetches live; there is no caching layer.

use crate::data::{DataResult, OnchainSource, TokenDataSource};
use chrono::{Days, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Sentinel embedded directly into prompts when pools are too thin to
/// price the token. Kept as a string so the prompt stays well-formed.
pub const NO_LIQUIDITY_SENTINEL: &str = "Insufficient liquidity in pools to calculate the price";
/// Sentinel for a missing historical max price.
pub const NO_PRICE_DATA_SENTINEL: &str = "NO AVAILABLE DATA";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub name: String,
    pub symbol: String,
    pub address: String,
    pub chain: String,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub website: Option<String>,
    pub total_supply_formatted: f64,
    /// As of the previous calendar day; 0 is the accepted degraded default.
    pub holders_count: u64,
    /// Top non-contract holder percentages joined with ';'
    pub top_holders: String,
    pub liquidity: String,
    pub current_price: String,
    pub max_price: String,
    pub max_price_date: String,
}

/// Map report chain names onto the market provider's chain identifiers.
pub fn normalize_chain(chain: &str) -> String {
    let chain = chain.to_lowercase();
    match chain.as_str() {
        "ethereum" => "eth".to_string(),
        _ => chain,
    }
}

/// Compose the snapshot from the market and chain-indexing providers.
/// Metadata and top-holder failures propagate; holder count, price,
/// liquidity and max price degrade to their documented defaults.
pub async fn fetch_token_snapshot(
    market: &dyn TokenDataSource,
    onchain: &dyn OnchainSource,
    address: &str,
    chain: &str,
) -> DataResult<TokenSnapshot> {
    info!("Building token snapshot for {} on {}", address, chain);

    let metadata = market.token_metadata(address, chain).await?;

    let today = Utc::now().date_naive();
    let yesterday = today - Days::new(1);
    let holders_count = match onchain.holders_count(address, yesterday, chain).await {
        Ok(count) => count,
        Err(e) => {
            warn!("Holder count fetch failed, degrading to 0: {}", e);
            0
        }
    };

    let top_holders = market
        .top_holder_percentages(address, chain)
        .await?
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(";");

    let (current_price, liquidity) = match market.pair_price(address, chain).await {
        Ok(price) => (
            price
                .usd_price
                .map(|p| p.to_string())
                .unwrap_or_else(|| NO_LIQUIDITY_SENTINEL.to_string()),
            price
                .pair_total_liquidity_usd
                .map(display_value)
                .unwrap_or_else(|| NO_LIQUIDITY_SENTINEL.to_string()),
        ),
        Err(e) => {
            warn!("Pair price fetch failed, degrading to sentinel: {}", e);
            (
                NO_LIQUIDITY_SENTINEL.to_string(),
                NO_LIQUIDITY_SENTINEL.to_string(),
            )
        }
    };

    let (max_price, max_price_date) = match onchain.max_price(address, today, chain).await {
        Ok(point) => {
            let at = if point.at.is_empty() {
                NO_PRICE_DATA_SENTINEL.to_string()
            } else {
                point.at
            };
            (point.high.to_string(), at)
        }
        Err(e) => {
            warn!("Max price fetch failed, degrading to sentinel: {}", e);
            (
                NO_PRICE_DATA_SENTINEL.to_string(),
                NO_PRICE_DATA_SENTINEL.to_string(),
            )
        }
    };

    Ok(TokenSnapshot {
        name: metadata.name,
        symbol: metadata.symbol,
        address: metadata.address,
        chain: chain.to_string(),
        twitter: metadata.twitter,
        telegram: metadata.telegram,
        website: metadata.website,
        total_supply_formatted: metadata.total_supply_formatted,
        holders_count,
        top_holders,
        liquidity,
        current_price,
        max_price,
        max_price_date,
    })
}

fn display_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataError, MaxPricePoint, PairPrice, TokenMetadata};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct StubMarket {
        price: Option<PairPrice>,
    }

    #[async_trait]
    impl TokenDataSource for StubMarket {
        async fn token_metadata(&self, address: &str, _chain: &str) -> DataResult<TokenMetadata> {
            Ok(TokenMetadata {
                name: "Acme".to_string(),
                symbol: "ACME".to_string(),
                address: address.to_string(),
                twitter: None,
                telegram: None,
                website: None,
                total_supply_formatted: 1_000_000.0,
            })
        }

        async fn top_holder_percentages(
            &self,
            _address: &str,
            _chain: &str,
        ) -> DataResult<Vec<f64>> {
            Ok(vec![4.2, 1.3])
        }

        async fn pair_price(&self, _address: &str, _chain: &str) -> DataResult<PairPrice> {
            match &self.price {
                Some(price) => Ok(PairPrice {
                    usd_price: price.usd_price,
                    pair_total_liquidity_usd: price.pair_total_liquidity_usd.clone(),
                }),
                None => Err(DataError::Api {
                    vendor: "moralis",
                    status: 500,
                    message: "boom".to_string(),
                }),
            }
        }
    }

    struct StubOnchain {
        holders: DataResult<u64>,
    }

    #[async_trait]
    impl OnchainSource for StubOnchain {
        async fn holders_count(
            &self,
            _address: &str,
            _date: NaiveDate,
            _network: &str,
        ) -> DataResult<u64> {
            match &self.holders {
                Ok(n) => Ok(*n),
                Err(_) => Err(DataError::Api {
                    vendor: "bitquery",
                    status: 500,
                    message: "boom".to_string(),
                }),
            }
        }

        async fn max_price(
            &self,
            _address: &str,
            _before: NaiveDate,
            _network: &str,
        ) -> DataResult<MaxPricePoint> {
            Ok(MaxPricePoint {
                high: 0.01,
                at: "2025-01-15T13:00:00Z".to_string(),
            })
        }
    }

    #[test]
    fn test_normalize_chain() {
        assert_eq!(normalize_chain("Ethereum"), "eth");
        assert_eq!(normalize_chain("base"), "base");
        assert_eq!(normalize_chain("BSC"), "bsc");
    }

    #[tokio::test]
    async fn test_snapshot_happy_path() {
        let market = StubMarket {
            price: Some(PairPrice {
                usd_price: Some(0.0032),
                pair_total_liquidity_usd: Some(serde_json::json!("52000.5")),
            }),
        };
        let onchain = StubOnchain { holders: Ok(1234) };

        let snapshot = fetch_token_snapshot(&market, &onchain, "0xabc", "base")
            .await
            .expect("snapshot");
        assert_eq!(snapshot.holders_count, 1234);
        assert_eq!(snapshot.top_holders, "4.2;1.3");
        assert_eq!(snapshot.current_price, "0.0032");
        assert_eq!(snapshot.liquidity, "52000.5");
        assert_eq!(snapshot.max_price, "0.01");
    }

    #[tokio::test]
    async fn test_holder_count_degrades_to_zero() {
        let market = StubMarket {
            price: Some(PairPrice {
                usd_price: Some(1.0),
                pair_total_liquidity_usd: None,
            }),
        };
        let onchain = StubOnchain {
            holders: Err(DataError::Internal("down".to_string())),
        };

        let snapshot = fetch_token_snapshot(&market, &onchain, "0xabc", "base")
            .await
            .expect("snapshot");
        assert_eq!(snapshot.holders_count, 0);
        assert_eq!(snapshot.liquidity, NO_LIQUIDITY_SENTINEL);
    }

    #[tokio::test]
    async fn test_price_failure_degrades_to_sentinels() {
        let market = StubMarket { price: None };
        let onchain = StubOnchain { holders: Ok(5) };

        let snapshot = fetch_token_snapshot(&market, &onchain, "0xabc", "base")
            .await
            .expect("snapshot");
        assert_eq!(snapshot.current_price, NO_LIQUIDITY_SENTINEL);
        assert_eq!(snapshot.liquidity, NO_LIQUIDITY_SENTINEL);
    }
}
