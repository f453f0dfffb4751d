//! Prometheus metrics and structured logging for the perp market maker.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus metrics for cycle outcomes, risk, skew and emitted intents

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
