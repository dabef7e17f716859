//! OpenAI client implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use crate::types::{ChatModel, CompletionOptions, RenderedPrompt};

/// OpenAI chat-completions API client.
pub struct OpenAiClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: RemoteLlmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { config, client }
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn raw_complete(&self, prompt: &RenderedPrompt, opts: &CompletionOptions) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let req_body = OpenAiRequest {
            model: self.config.model.clone(),
            messages: vec![
                OpenAiMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                OpenAiMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            max_tokens: opts.max_tokens,
            temperature: opts.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
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
                _ => LlmError::ProviderError(format!("OpenAI API error {status}: {body}")),
            });
        }

        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}
