//! Configuration for remote LLM provider clients.

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a remote LLM provider (Anthropic, OpenAI, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    /// API key for authentication. Never logged.
    pub api_key: String,

    /// Base URL for the API.
    ///
    /// Examples:
    /// - Anthropic: "https://api.anthropic.com"
    /// - OpenAI: "https://api.openai.com/v1"
    pub base_url: String,

    /// Model name/identifier.
    pub model: String,

    /// Request timeout duration.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Maximum retries for failed requests, applied inside the gateway
    /// before a failure is handed to the workflow engine's retry policy.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl RemoteLlmConfig {
    /// Create a new remote LLM configuration.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
        }
    }

    /// Build configuration by reading the API key from `env_var`. Returns
    /// [`LlmError::ConfigError`] if the variable is unset — callers invoke
    /// this only from [`crate::LlmGateway::ensure_ready`], never eagerly.
    pub fn from_env(env_var: &str, base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var(env_var)
            .map_err(|_| LlmError::ConfigError(format!("missing environment variable: {env_var}")))?;
        Ok(Self::new(api_key, base_url, model))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_retries() -> u32 {
    3
}
