//! Social follower-count clients: Twitter-compatible REST, Telegram public
//! page scrape, Discord invite lookup. Handle extraction from platform URLs
//! is pure so callers can test it without network access.

use super::{DataError, DataResult, FollowerLookup};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

const TIMEOUT_SECONDS: u64 = 30;

/// Platforms with a dedicated follower source. Anything else degrades to
/// zero followers at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    Twitter,
    Telegram,
    Discord,
    Other,
}

impl PlatformKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "twitter" | "x" => PlatformKind::Twitter,
            "telegram" => PlatformKind::Telegram,
            "discord" => PlatformKind::Discord,
            _ => PlatformKind::Other,
        }
    }
}

/// Strip the platform's known URL prefixes to obtain a bare handle.
/// Unrecognized platforms keep the URL untouched.
pub fn strip_handle(kind: PlatformKind, url: &str) -> String {
    match kind {
        PlatformKind::Twitter => url
            .replace("https://x.com/", "")
            .replace("https://twitter.com/", ""),
        PlatformKind::Telegram => url.replace("https://t.me/", "").trim_matches('@').to_string(),
        PlatformKind::Discord => url
            .replace("https://discord.gg/", "")
            .replace("https://discord.com/invite/", ""),
        PlatformKind::Other => url.to_string(),
    }
}

pub struct TwitterClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl TwitterClient {
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECONDS))
            .user_agent("tokenscout/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: "https://twitter241.p.rapidapi.com".to_string(),
        }
    }

    pub async fn follower_count(&self, username: &str) -> DataResult<u64> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            DataError::Config("TWITTER_API_KEY environment variable must be set".to_string())
        })?;

        let url = format!("{}/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-rapidapi-host", "twitter241.p.rapidapi.com")
            .header("x-rapidapi-key", api_key)
            .query(&[("username", username)])
            .send()
            .await
            .map_err(|e| DataError::from_reqwest("twitter", TIMEOUT_SECONDS, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DataError::Api {
                vendor: "twitter",
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| DataError::from_reqwest("twitter", TIMEOUT_SECONDS, e))?;
        Ok(extract_twitter_followers(&body))
    }
}

/// Dig the follower count out of the user lookup payload; absent paths
/// count as zero, matching the degraded-fetch policy.
fn extract_twitter_followers(body: &Value) -> u64 {
    body.get("result")
        .and_then(|v| v.get("data"))
        .and_then(|v| v.get("user"))
        .and_then(|v| v.get("result"))
        .and_then(|v| v.get("legacy"))
        .and_then(|v| v.get("followers_count"))
        .and_then(|v| v.as_u64())
        .unwrap_or(0)
}

pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for TelegramClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECONDS))
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
            )
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: "https://t.me".to_string(),
        }
    }

    pub async fn member_count(&self, channel: &str) -> DataResult<u64> {
        let url = format!("{}/{}", self.base_url, channel.trim_matches('@'));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::from_reqwest("telegram", TIMEOUT_SECONDS, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DataError::Api {
                vendor: "telegram",
                status: status.as_u16(),
                message,
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| DataError::from_reqwest("telegram", TIMEOUT_SECONDS, e))?;
        Ok(parse_member_count(&html))
    }
}

/// Scrape the member count from the public channel preview page.
/// Unparseable pages count as zero.
pub fn parse_member_count(html: &str) -> u64 {
    // The count lives in the page-extra block, e.g. "12 345 members".
    let scope = match html.find("tgme_page_extra") {
        Some(pos) => &html[pos..],
        None => html,
    };

    let pattern = Regex::new(r"([0-9][0-9\s]*)\s+(?:members|subscribers)")
        .expect("member count pattern is valid");

    pattern
        .captures(scope)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(' ', "").parse().ok())
        .unwrap_or(0)
}

pub struct DiscordClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for DiscordClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscordClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECONDS))
            .user_agent("tokenscout/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: "https://discord.com/api/v9".to_string(),
        }
    }

    pub async fn member_count(&self, invite_code: &str) -> DataResult<u64> {
        let url = format!("{}/invites/{}", self.base_url, invite_code);
        let response = self
            .client
            .get(&url)
            .query(&[("with_counts", "true")])
            .send()
            .await
            .map_err(|e| DataError::from_reqwest("discord", TIMEOUT_SECONDS, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DataError::Api {
                vendor: "discord",
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| DataError::from_reqwest("discord", TIMEOUT_SECONDS, e))?;
        Ok(body
            .get("approximate_member_count")
            .and_then(|v| v.as_u64())
            .unwrap_or(0))
    }
}

/// One lookup facade over the three platform clients
pub struct SocialClients {
    twitter: TwitterClient,
    telegram: TelegramClient,
    discord: DiscordClient,
}

impl SocialClients {
    pub fn new(twitter_api_key: Option<String>) -> Self {
        Self {
            twitter: TwitterClient::new(twitter_api_key),
            telegram: TelegramClient::new(),
            discord: DiscordClient::new(),
        }
    }
}

#[async_trait]
impl FollowerLookup for SocialClients {
    async fn follower_count(&self, platform: PlatformKind, handle: &str) -> DataResult<u64> {
        match platform {
            PlatformKind::Twitter => self.twitter.follower_count(handle).await,
            PlatformKind::Telegram => self.telegram.member_count(handle).await,
            PlatformKind::Discord => self.discord.member_count(handle).await,
            PlatformKind::Other => Ok(0),
        }
    }
}
