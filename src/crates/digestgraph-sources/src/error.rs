//! Error types for Search Connectors (spec.md §4.6, §7).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum SourceError {
    /// A single retriever failed or returned nothing. Never fatal to the
    /// Meta-Retriever (spec.md §4.6 failure semantics).
    #[error("source '{source_name}' failed: {message}")]
    Retriever { source_name: String, message: String },

    /// A retriever's soft timeout elapsed before it produced results.
    #[error("source '{0}' timed out")]
    Timeout(String),

    /// All constituent retrievers failed AND no articles were obtained.
    #[error("all retrievers failed and no articles were obtained")]
    AllFailed,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
}
