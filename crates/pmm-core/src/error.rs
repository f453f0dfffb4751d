//! Error types for pmm-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Fixed-point overflow: {value} at scale {scale}")]
    ScaleOverflow { value: String, scale: String },

    #[error("Unknown order direction: {0}")]
    UnknownDirection(String),

    #[error("Unknown order kind: {0}")]
    UnknownOrderKind(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
