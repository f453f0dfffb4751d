//! Core domain types for the perp market-making engine.
//!
//! This crate provides fundamental types used throughout the engine:
//! - `Price`, `Size`: Precision-safe numeric types
//! - `Scale`: Fixed-point precision constants used at the wire boundary
//! - `Direction`, `OrderKind`: Order enums
//! - `RawOrder`, `AccountSnapshot`, `MarketSnapshot`: Per-cycle inputs
//! - `OrderIntent`: Per-cycle output consumed by the submission layer

pub mod decimal;
pub mod error;
pub mod order;
pub mod precision;
pub mod types;

pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use order::{Direction, OrderKind, RawOrder};
pub use precision::Scale;
pub use types::{AccountSnapshot, MarketSnapshot, OpenOrders, OrderIntent};
