use crate::llm::ChatConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub vendors: VendorConfig,
    pub llm: LlmConfig,
    pub community_llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub upload_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    pub moralis_api_key: Option<String>,
    pub bitquery_api_key: Option<String>,
    pub twitter_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

impl LlmConfig {
    pub fn to_chat_config(&self) -> ChatConfig {
        ChatConfig {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_seconds: self.timeout_seconds,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file - this sets env vars that aren't already set
        dotenvy::dotenv().ok();

        // DATABASE_URL is required
        let database_url = env::var("DATABASE_URL")
            .context("DATABASE_URL environment variable is required but not set")?;

        let config = Config {
            database: DatabaseConfig {
                url: database_url,
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("Invalid DB_MAX_CONNECTIONS value")?,
                min_connections: env::var("DB_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .context("Invalid DB_MIN_CONNECTIONS value")?,
            },
            server: ServerConfig {
                port: env::var("API_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .context("Invalid API_PORT value")?,
                upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            },
            vendors: VendorConfig {
                moralis_api_key: env::var("MORALIS_API_KEY").ok(),
                bitquery_api_key: env::var("BITQUERY_API_KEY").ok(),
                twitter_api_key: env::var("TWITTER_API_KEY").ok(),
            },
            llm: LlmConfig {
                api_key: env::var("OPENAI_API_KEY").ok(),
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                temperature: env::var("LLM_TEMPERATURE")
                    .unwrap_or_else(|_| "0.7".to_string())
                    .parse()
                    .context("Invalid LLM_TEMPERATURE value")?,
                max_tokens: env::var("LLM_MAX_TOKENS")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .context("Invalid LLM_MAX_TOKENS value")?,
                timeout_seconds: env::var("LLM_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .context("Invalid LLM_TIMEOUT_SECONDS value")?,
            },
            community_llm: LlmConfig {
                api_key: env::var("GROK_API_KEY").ok(),
                base_url: env::var("GROK_BASE_URL")
                    .unwrap_or_else(|_| "https://api.x.ai/v1".to_string()),
                model: env::var("GROK_MODEL").unwrap_or_else(|_| "grok-2-1212".to_string()),
                temperature: env::var("LLM_TEMPERATURE")
                    .unwrap_or_else(|_| "0.7".to_string())
                    .parse()
                    .context("Invalid LLM_TEMPERATURE value")?,
                max_tokens: env::var("LLM_MAX_TOKENS")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .context("Invalid LLM_MAX_TOKENS value")?,
                timeout_seconds: env::var("LLM_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .context("Invalid LLM_TIMEOUT_SECONDS value")?,
            },
        };

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/tokenscout".to_string(),
                max_connections: 5,
                min_connections: 1,
            },
            server: ServerConfig {
                port: 8080,
                upload_dir: "uploads".to_string(),
            },
            vendors: VendorConfig {
                moralis_api_key: None,
                bitquery_api_key: None,
                twitter_api_key: None,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                temperature: 0.7,
                max_tokens: 8000,
                timeout_seconds: 60,
            },
            community_llm: LlmConfig {
                api_key: None,
                base_url: "https://api.x.ai/v1".to_string(),
                model: "grok-2-1212".to_string(),
                temperature: 0.7,
                max_tokens: 8000,
                timeout_seconds: 60,
            },
        }
    }
}
