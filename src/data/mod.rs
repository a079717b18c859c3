//! Vendor gateway module: one client per external data source plus the
//! capability traits the orchestrator is wired against.

pub mod errors;
pub mod github;
pub mod market;
pub mod onchain;
pub mod retry;
pub mod social;

// Re-export commonly used types
pub use errors::{DataError, DataResult};
pub use github::{GithubClient, RepoInfo};
pub use market::{MarketDataClient, PairPrice, TokenMetadata};
pub use onchain::{MaxPricePoint, OnchainStatsClient};
pub use social::{PlatformKind, SocialClients};

use async_trait::async_trait;
use chrono::NaiveDate;

/// Token metadata / top holders / pair price, served by the market-data
/// REST provider.
#[async_trait]
pub trait TokenDataSource: Send + Sync {
    async fn token_metadata(&self, address: &str, chain: &str) -> DataResult<TokenMetadata>;

    /// Percentage-of-total-supply held by each of the top non-contract
    /// holders, largest first.
    async fn top_holder_percentages(&self, address: &str, chain: &str) -> DataResult<Vec<f64>>;

    async fn pair_price(&self, address: &str, chain: &str) -> DataResult<PairPrice>;
}

/// Historical holder counts and max trade price, served by the
/// chain-indexing GraphQL provider.
#[async_trait]
pub trait OnchainSource: Send + Sync {
    /// Distinct holder count as of the given calendar day.
    async fn holders_count(&self, address: &str, date: NaiveDate, network: &str)
        -> DataResult<u64>;

    /// Highest observed USD trade price strictly before the given day.
    async fn max_price(
        &self,
        address: &str,
        before: NaiveDate,
        network: &str,
    ) -> DataResult<MaxPricePoint>;
}

/// Non-archived repositories of an account with each one's latest commit,
/// newest activity first.
#[async_trait]
pub trait RepoActivitySource: Send + Sync {
    async fn repos_with_activity(&self, account: &str) -> DataResult<Vec<RepoInfo>>;
}

/// Current follower/member count for a social platform handle.
#[async_trait]
pub trait FollowerLookup: Send + Sync {
    async fn follower_count(&self, platform: PlatformKind, handle: &str) -> DataResult<u64>;
}
