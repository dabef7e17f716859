//! The LLM Gateway: a lazily-initialized, concurrency-bounded front door to
//! a single chat-completion provider.
//!
//! Constructing a [`LlmGateway`] never touches credentials or the network —
//! only [`LlmGateway::complete`] does, via [`LlmGateway::ensure_ready`] on
//! first call. This mirrors the teacher's lazy-client pattern in
//! `llm::remote::*`, generalized so the concrete provider is chosen by
//! [`LlmProvider`] rather than hardcoded per binary.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{OnceCell, Semaphore};

use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use crate::remote::{ClaudeClient, OpenAiClient};
use crate::types::{ChatModel, CompletionOptions, RenderedPrompt, ResponseParser};

/// Which concrete provider backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Claude,
    OpenAi,
}

impl LlmProvider {
    fn env_var(self) -> &'static str {
        match self {
            LlmProvider::Claude => "ANTHROPIC_API_KEY",
            LlmProvider::OpenAi => "OPENAI_API_KEY",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::Claude => "https://api.anthropic.com",
            LlmProvider::OpenAi => "https://api.openai.com/v1",
        }
    }
}

/// Configuration for the gateway itself (as opposed to the provider client
/// it lazily constructs).
#[derive(Debug, Clone)]
pub struct LlmGatewayConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub base_url: Option<String>,
    /// Global cap on concurrently in-flight completions (spec.md §5 default: 8).
    pub max_in_flight: usize,
    pub request_timeout: Duration,
    /// Small internal retry count for transient provider errors, applied
    /// before the failure reaches the workflow engine's own retry policy
    /// (spec.md §4.5: "other 5xx as retryable up to a small count internally").
    pub internal_retry_limit: u32,
}

impl Default for LlmGatewayConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Claude,
            model: "claude-3-5-sonnet-20241022".to_string(),
            base_url: None,
            max_in_flight: 8,
            request_timeout: Duration::from_secs(60),
            internal_retry_limit: 2,
        }
    }
}

/// Concurrency-bounded, lazily-initialized wrapper around a [`ChatModel`].
///
/// Safe to construct with no credentials present; only `complete()` needs
/// them, and only on its first invocation.
pub struct LlmGateway {
    config: LlmGatewayConfig,
    semaphore: Arc<Semaphore>,
    model: OnceCell<Arc<dyn ChatModel>>,
}

impl LlmGateway {
    pub fn new(config: LlmGatewayConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
        Self {
            config,
            semaphore,
            model: OnceCell::new(),
        }
    }

    /// Builds a gateway with its model pre-populated, bypassing
    /// [`LlmGateway::ensure_ready`] entirely. Used to inject a fake
    /// [`ChatModel`] in tests, and available for callers that construct
    /// their own provider client outside the env-var-driven default path.
    pub fn with_model(config: LlmGatewayConfig, model: Arc<dyn ChatModel>) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
        Self {
            config,
            semaphore,
            model: OnceCell::new_with(Some(model)),
        }
    }

    /// Construct the underlying provider client from environment
    /// credentials if it hasn't been built yet. Returns
    /// [`LlmError::ConfigError`] if credentials are missing — this is the
    /// only place that error can originate.
    pub async fn ensure_ready(&self) -> Result<()> {
        self.model
            .get_or_try_init(|| async {
                let provider = self.config.provider;
                let base_url = self
                    .config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| provider.default_base_url().to_string());
                let remote_config = RemoteLlmConfig::from_env(provider.env_var(), base_url, self.config.model.clone())?
                    .with_timeout(self.config.request_timeout);
                let client: Arc<dyn ChatModel> = match provider {
                    LlmProvider::Claude => Arc::new(ClaudeClient::new(remote_config)),
                    LlmProvider::OpenAi => Arc::new(OpenAiClient::new(remote_config)),
                };
                tracing::info!(provider = client.provider_name(), "llm gateway client initialized");
                Ok::<_, LlmError>(client)
            })
            .await?;
        Ok(())
    }

    /// Render a request, run it through the provider (bounded by the
    /// gateway's semaphore), and parse the response with `parser`.
    ///
    /// A small number of transient provider failures are retried internally
    /// (see [`LlmGatewayConfig::internal_retry_limit`]); anything left over,
    /// including a [`LlmError::Parse`], is returned for the caller's own
    /// retry policy to handle.
    pub async fn complete(&self, prompt: RenderedPrompt, parser: &dyn ResponseParser, opts: CompletionOptions) -> Result<Value> {
        self.ensure_ready().await?;
        let model = self.model.get().expect("ensure_ready populates model").clone();

        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore is never closed");

        let mut attempt = 0u32;
        let raw = loop {
            match model.raw_complete(&prompt, &opts).await {
                Ok(raw) => break raw,
                Err(e) if e.is_retryable() && attempt < self.config.internal_retry_limit => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %e, "llm gateway internal retry");
                    continue;
                }
                Err(e) => return Err(e),
            }
        };

        parser.parse(&raw)
    }
}
