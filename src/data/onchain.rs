//! Chain-indexing GraphQL client (Bitquery streaming API)
//! Serves historical holder counts and the max observed trade price.

use super::{retry::retry_with_backoff, DataError, DataResult, OnchainSource};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

const VENDOR: &str = "bitquery";
const TIMEOUT_SECONDS: u64 = 30;

/// Highest observed USD trade price with the hour bucket it occurred in
#[derive(Debug, Clone)]
pub struct MaxPricePoint {
    pub high: f64,
    pub at: String,
}

pub struct OnchainStatsClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OnchainStatsClient {
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECONDS))
            .user_agent("tokenscout/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: "https://streaming.bitquery.io/graphql".to_string(),
        }
    }

    async fn run_query(&self, query: String) -> DataResult<Value> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            DataError::Config("BITQUERY_API_KEY environment variable must be set".to_string())
        })?;

        let response = self
            .client
            .post(&self.base_url)
            .header("Content-Type", "application/json")
            .bearer_auth(api_key)
            .json(&serde_json::json!({ "query": query }))
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
            .json::<Value>()
            .await
            .map_err(|e| DataError::from_reqwest(VENDOR, TIMEOUT_SECONDS, e))
    }
}

#[async_trait]
impl OnchainSource for OnchainStatsClient {
    async fn holders_count(
        &self,
        address: &str,
        date: NaiveDate,
        network: &str,
    ) -> DataResult<u64> {
        let query = holders_count_query(address, date, network);
        let body = retry_with_backoff(|| self.run_query(query.clone()), 3).await?;

        extract_holders_count(&body).ok_or_else(|| DataError::Api {
            vendor: VENDOR,
            status: 200,
            message: format!("holder count missing from response for {address}"),
        })
    }

    async fn max_price(
        &self,
        address: &str,
        before: NaiveDate,
        network: &str,
    ) -> DataResult<MaxPricePoint> {
        let query = max_price_query(address, before, network);
        let body = retry_with_backoff(|| self.run_query(query.clone()), 3).await?;

        extract_max_price(&body).ok_or_else(|| DataError::Api {
            vendor: VENDOR,
            status: 200,
            message: format!("no trade history in response for {address}"),
        })
    }
}

fn holders_count_query(address: &str, date: NaiveDate, network: &str) -> String {
    format!(
        r#"{{
  EVM(dataset: archive, network: {network}) {{
    TokenHolders(date: "{date}", tokenSmartContract: "{address}") {{
      uniq(of: Holder_Address)
    }}
  }}
}}"#,
        network = network,
        date = date.format("%Y-%m-%d"),
        address = address
    )
}

fn max_price_query(address: &str, before: NaiveDate, network: &str) -> String {
    format!(
        r#"{{
  EVM(dataset: combined, network: {network}) {{
    DEXTradeByTokens(
      orderBy: {{descendingByField: "Trade_high_maximum"}}
      where: {{
        Trade: {{
          Side: {{Amount: {{gt: "0"}}, AmountInUSD: {{gt: "1000"}}}},
          Currency: {{SmartContract: {{is: "{address}"}}}},
          PriceAsymmetry: {{lt: 0.1}}
        }},
        Block: {{Date: {{before: "{before}"}}}}
      }}
      limit: {{count: 1}}
    ) {{
      Trade {{
        high: PriceInUSD(maximum: Trade_PriceInUSD)
      }}
      Block {{
        Timefield: Time(interval: {{in: hours, count: 1}})
      }}
    }}
  }}
}}"#,
        network = network,
        before = before.format("%Y-%m-%d"),
        address = address
    )
}

/// The provider returns the distinct count as either a number or a string.
fn extract_holders_count(body: &Value) -> Option<u64> {
    let uniq = body
        .get("data")?
        .get("EVM")?
        .get("TokenHolders")?
        .get(0)?
        .get("uniq")?;

    match uniq {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn extract_max_price(body: &Value) -> Option<MaxPricePoint> {
    let trade = body.get("data")?.get("EVM")?.get("DEXTradeByTokens")?.get(0)?;
    let high = trade.get("Trade")?.get("high")?.as_f64()?;
    let at = trade
        .get("Block")
        .and_then(|b| b.get("Timefield"))
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();

    Some(MaxPricePoint { high, at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_holders_count_query_shape() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date");
        let query = holders_count_query("0xabc", date, "eth");
        assert!(query.contains("network: eth"));
        assert!(query.contains(r#"date: "2025-03-01""#));
        assert!(query.contains(r#"tokenSmartContract: "0xabc""#));
    }

    #[test]
    fn test_extract_holders_count_number_and_string() {
        let body = json!({"data": {"EVM": {"TokenHolders": [{"uniq": 1234}]}}});
        assert_eq!(extract_holders_count(&body), Some(1234));

        let body = json!({"data": {"EVM": {"TokenHolders": [{"uniq": "5678"}]}}});
        assert_eq!(extract_holders_count(&body), Some(5678));

        let body = json!({"data": {"EVM": {"TokenHolders": []}}});
        assert_eq!(extract_holders_count(&body), None);
    }

    #[test]
    fn test_extract_max_price() {
        let body = json!({"data": {"EVM": {"DEXTradeByTokens": [{
            "Trade": {"high": 0.0042},
            "Block": {"Timefield": "2025-01-15T13:00:00Z"}
        }]}}});
        let point = extract_max_price(&body).expect("should extract");
        assert_eq!(point.high, 0.0042);
        assert_eq!(point.at, "2025-01-15T13:00:00Z");

        let body = json!({"data": {"EVM": {"DEXTradeByTokens": []}}});
        assert!(extract_max_price(&body).is_none());
    }
}
