//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Order book is empty on both sides and no oracle fallback was given")]
    EmptyBook,

    #[error("Invalid tick size: {0}")]
    InvalidTickSize(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Core error: {0}")]
    Core(#[from] pmm_core::CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;
