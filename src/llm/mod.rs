//! Generative-text capability: chat-completion REST client with explicit
//! error handling. One request/response per call, no streaming, no retry.

use crate::data::{DataError, DataResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// Opaque text-in/text-out capability. Implemented by `ChatClient` in
/// production and by fixed-response stubs in tests.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, system_role: &str, user_prompt: &str) -> DataResult<String>;
}

/// Chat-completion client configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 8000,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Chat-completion REST client (OpenAI-compatible wire format, also used
/// against the x.ai endpoint for the community analysis)
pub struct ChatClient {
    client: reqwest::Client,
    config: ChatConfig,
    vendor: &'static str,
}

impl ChatClient {
    pub fn new(vendor: &'static str, config: ChatConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .user_agent("tokenscout/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            config,
            vendor,
        }
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn complete(&self, system_role: &str, user_prompt: &str) -> DataResult<String> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            DataError::Config(format!("{} API key is not configured", self.vendor))
        })?;

        info!(
            "Requesting completion from {} ({}, prompt length: {} chars)",
            self.vendor,
            self.config.model,
            user_prompt.len()
        );

        let url = format!("{}/chat/completions", self.config.base_url);
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system_role},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DataError::from_reqwest(self.vendor, self.config.timeout_seconds, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                return Err(DataError::RateLimit {
                    vendor: self.vendor,
                    retry_after: 60,
                });
            }
            return Err(DataError::Api {
                vendor: self.vendor,
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| DataError::from_reqwest(self.vendor, self.config.timeout_seconds, e))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| DataError::Api {
                vendor: self.vendor,
                status: status.as_u16(),
                message: "completion contained no choices".to_string(),
            })?;

        info!("Received {} chars from {}", content.len(), self.vendor);
        Ok(content)
    }
}

/// Extract a JSON object from text that might wrap it in markdown fences
/// or prose. Returns None when no balanced object is present.
pub fn extract_json_from_text(text: &str) -> Option<String> {
    // Fenced ```json block first
    if let Some(start) = text.find("```json") {
        if let Some(end) = text[start + 7..].find("```") {
            return Some(text[start + 7..start + 7 + end].trim().to_string());
        }
    }

    // First balanced top-level object
    let start = text.find('{')?;
    let mut depth = 0;
    for (i, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_plain() {
        let text = r#"Here is the report: {"summary": "ok", "n": 3} done"#;
        assert_eq!(
            extract_json_from_text(text),
            Some(r#"{"summary": "ok", "n": 3}"#.to_string())
        );
    }

    #[test]
    fn test_extract_json_fenced() {
        let text = "```json\n{\"document_title\": \"Acme\"}\n```";
        assert_eq!(
            extract_json_from_text(text),
            Some("{\"document_title\": \"Acme\"}".to_string())
        );
    }

    #[test]
    fn test_extract_json_nested() {
        let text = r#"{"a": {"b": {"c": 1}}, "d": 2}"#;
        assert_eq!(extract_json_from_text(text), Some(text.to_string()));
    }

    #[test]
    fn test_extract_json_absent() {
        assert_eq!(extract_json_from_text("no structured data here"), None);
        assert_eq!(extract_json_from_text("unbalanced { brace"), None);
    }
}
