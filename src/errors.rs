use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Swap error: {0}")]
    Swap(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Other: {0}")]
    Other(String),
}
