//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,pmm=debug";

/// Initialize structured logging.
///
/// JSON output when `RUST_ENV=production`, pretty output otherwise.
/// Fails if a global subscriber is already installed.
pub fn init_logging() -> TelemetryResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let is_production = std::env::var("RUST_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    let result = if is_production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(true))
            .try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
