use thiserror::Error;

pub type Result<T> = std::result::Result<T, KgError>;

#[derive(Debug, Error)]
pub enum KgError {
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
