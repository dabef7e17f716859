//! Error types for output composition and image/chart rendering (spec.md §7).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OutputError>;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// The external cover-image API failed or returned nothing usable. Never
    /// fatal to the run — the composer falls back to the deterministic
    /// renderer, or omits the cover entirely (spec.md §4.9).
    #[error("cover image error: {0}")]
    Image(String),

    /// A single chart failed to render. Never fatal — the composer omits
    /// that chart's key from the output mapping (spec.md §4.9).
    #[error("chart error: {0}")]
    Chart(String),
}
