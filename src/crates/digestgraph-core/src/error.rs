//! The error taxonomy for the pipeline (spec.md §7): one variant per
//! category, each carrying enough context to become a
//! [`crate::state::RecordedError`] in `SharedState.errors`.
//!
//! Only [`DigestGraphError::Fatal`] aborts a run outright (routed to
//! `finalize_on_failure` by the engine's conditional edge); every other
//! variant is recorded and the pipeline continues.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DigestGraphError>;

#[derive(Debug, Error)]
pub enum DigestGraphError {
    /// Missing credentials/configuration at first use of an external
    /// service. Fatal for the node that hit it (usually `score_and_filter`
    /// or `summarize_topics`), not for the run as a whole.
    #[error("configuration error: {0}")]
    Config(String),

    /// A single retriever failed or returned nothing. Never fatal; the
    /// Meta-Retriever keeps going.
    #[error("source error ({source_name}): {message}")]
    Source { source_name: String, message: String },

    /// LLM output didn't satisfy its declared response_format grammar.
    /// Retryable up to the node's policy.
    #[error("parse error: {0}")]
    Parse(String),

    /// An `Article` failed schema validation (e.g. malformed URL). The
    /// article is dropped; this is never a run error.
    #[error("validation error: {0}")]
    Validation(String),

    /// A request- or node-level timeout.
    #[error("timeout after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// `initialize` found zero topics, or no LLM provider is reachable
    /// after retries and there is no fallback. Aborts the run.
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("prompt not found: {agent}.{prompt}")]
    PromptNotFound { agent: String, prompt: String },

    #[error(transparent)]
    Llm(#[from] digestgraph_llm::LlmError),

    #[error(transparent)]
    Checkpoint(#[from] digestgraph_checkpoint::CheckpointError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Engine execution was cancelled mid-run (spec.md §5 Cancellation).
    #[error("run cancelled")]
    Cancelled,
}

impl DigestGraphError {
    /// Whether a node-level retry is worth attempting for this error, per
    /// the taxonomy in spec.md §7.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DigestGraphError::Parse(_) | DigestGraphError::Timeout { .. } | DigestGraphError::Llm(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, DigestGraphError::Fatal(_) | DigestGraphError::Cancelled)
    }

    pub fn stage_message(&self) -> String {
        self.to_string()
    }
}
