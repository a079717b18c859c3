//! Orchestration layer: the dependency-injection context built once at
//! process start, the refresh pipeline and the legacy decision path.

pub mod decision;
pub mod refresh;

pub use decision::DecisionOrchestrator;
pub use refresh::RefreshOrchestrator;

use crate::config::Config;
use crate::data::{
    FollowerLookup, GithubClient, MarketDataClient, OnchainStatsClient, OnchainSource,
    RepoActivitySource, SocialClients, TokenDataSource,
};
use crate::llm::{ChatClient, TextGenerator};
use crate::storage::LocalStorage;
use crate::store::TokenStore;
use sqlx::PgPool;
use std::sync::Arc;

/// Every vendor capability behind its trait object, plus the store and the
/// upload storage. Constructed once from config; tests construct it by hand
/// with stubs per vendor.
pub struct AppContext {
    pub store: TokenStore,
    pub storage: LocalStorage,
    pub market: Arc<dyn TokenDataSource>,
    pub onchain: Arc<dyn OnchainSource>,
    pub github: Arc<dyn RepoActivitySource>,
    pub socials: Arc<dyn FollowerLookup>,
    pub llm: Arc<dyn TextGenerator>,
    pub community_llm: Arc<dyn TextGenerator>,
}

impl AppContext {
    pub fn from_config(pool: PgPool, config: &Config) -> Self {
        Self {
            store: TokenStore::new(pool),
            storage: LocalStorage::new(&config.server.upload_dir),
            market: Arc::new(MarketDataClient::new(config.vendors.moralis_api_key.clone())),
            onchain: Arc::new(OnchainStatsClient::new(
                config.vendors.bitquery_api_key.clone(),
            )),
            github: Arc::new(GithubClient::new()),
            socials: Arc::new(SocialClients::new(config.vendors.twitter_api_key.clone())),
            llm: Arc::new(ChatClient::new("openai", config.llm.to_chat_config())),
            community_llm: Arc::new(ChatClient::new(
                "grok",
                config.community_llm.to_chat_config(),
            )),
        }
    }
}
