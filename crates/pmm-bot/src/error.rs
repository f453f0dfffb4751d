//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Snapshot source error: {0}")]
    Source(String),

    #[error("Submission error: {0}")]
    Submit(String),

    #[error("Core error: {0}")]
    Core(#[from] pmm_core::CoreError),

    #[error("Feed error: {0}")]
    Feed(#[from] pmm_feed::FeedError),

    #[error("Engine error: {0}")]
    Engine(#[from] pmm_mm::MmError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] pmm_telemetry::TelemetryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
