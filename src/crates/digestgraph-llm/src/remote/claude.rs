//! Anthropic Claude client implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use crate::types::{ChatModel, CompletionOptions, RenderedPrompt};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude API client.
pub struct ClaudeClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl ClaudeClient {
    pub fn new(config: RemoteLlmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { config, client }
    }
}

#[async_trait]
impl ChatModel for ClaudeClient {
    async fn raw_complete(&self, prompt: &RenderedPrompt, opts: &CompletionOptions) -> Result<String> {
        let url = format!("{}/v1/messages", self.config.base_url);

        let req_body = ClaudeRequest {
            model: self.config.model.clone(),
            system: prompt.system.clone(),
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt.user.clone(),
            }],
            max_tokens: opts.max_tokens,
            temperature: opts.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&req_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationError(body),
                429 => LlmError::RateLimitExceeded(body),
                408 => LlmError::Timeout(body),
                _ => LlmError::ProviderError(format!("Claude API error {status}: {body}")),
            });
        }

        let parsed: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join(""))
    }

    fn provider_name(&self) -> &'static str {
        "claude"
    }
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    system: String,
    messages: Vec<ClaudeMessage>,
    max_tokens: usize,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    content_type: String,
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_constructs_without_credential_validation() {
        let config = RemoteLlmConfig::new("unset", "https://api.anthropic.com", "claude-3-5-sonnet-20241022");
        let _client = ClaudeClient::new(config);
    }
}
