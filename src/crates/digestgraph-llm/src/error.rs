//! Error types for the LLM gateway and its provider clients.

use thiserror::Error;

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when working with the LLM gateway or its
/// underlying provider client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Failed to serialize/deserialize data.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// API authentication failed (bad or revoked key).
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Required credentials were missing. Surfaced lazily at the first
    /// `complete()` call, never at gateway construction — see
    /// [`crate::LlmGateway::ensure_ready`].
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Rate limit exceeded by the provider.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid response envelope from the provider (not the declared
    /// response_format — see [`LlmError::Parse`] for that).
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request timed out.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// General provider-side error (5xx, unexpected status).
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// The model's text did not satisfy the caller-supplied
    /// [`crate::ResponseParser`]'s declared grammar.
    #[error("Response did not match expected format: {0}")]
    Parse(String),
}

impl LlmError {
    /// Errors worth a small number of internal retries inside the gateway
    /// before delegating to the workflow engine's own retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::HttpError(_) | LlmError::ProviderError(_) | LlmError::Timeout(_) | LlmError::RateLimitExceeded(_)
        )
    }

    pub fn is_config_error(&self) -> bool {
        matches!(self, LlmError::ConfigError(_))
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}
