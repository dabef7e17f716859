//! Error types for checkpoint operations

use thiserror::Error;

/// Result type for checkpoint operations
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors that can occur during checkpoint operations
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// No checkpoint exists for the requested run
    #[error("Checkpoint not found: {0}")]
    NotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend storage error (disk, lock, etc.)
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
