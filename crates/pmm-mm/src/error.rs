//! Engine error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MmError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Feed error: {0}")]
    Feed(#[from] pmm_feed::FeedError),

    #[error("Risk error: {0}")]
    Risk(#[from] pmm_risk::RiskError),
}

pub type MmResult<T> = Result<T, MmError>;
