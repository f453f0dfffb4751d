//! Risk error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Invalid risk limits: {0}")]
    InvalidLimits(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

pub type RiskResult<T> = Result<T, RiskError>;
