//! Risk-driven quoting engine for the perp market maker.
//!
//! Provides:
//! - Skew: funding bias and risk step split target size between sides
//! - Aggression: per-side multipliers on the base oracle offset
//! - LadderBuilder: linear-in-rank weighted ladder per side
//! - evaluate: the full per-cycle pipeline with emergency flatten override
//! - Strategy: config-selected variant behind one evaluate signature
//!
//! # Architecture
//!
//! ```text
//! Strategy::evaluate()
//!   ├─ OrderBookAggregator: bucket resting orders
//!   ├─ RiskState + EmergencyMonitor: flatten short-circuit
//!   └─ skew + aggression → LadderBuilder → DecisionResult
//! ```

pub mod aggression;
pub mod config;
pub mod engine;
pub mod error;
pub mod ladder;
pub mod skew;
pub mod strategy;

pub use aggression::{compute_aggression, Aggression};
pub use config::{FloatingParams, RiskParameters, MAX_LADDER_LEVELS};
pub use engine::{
    assess, assess_with_book, evaluate, evaluate_with_book, DecisionResult, Evaluation,
};
pub use error::{MmError, MmResult};
pub use ladder::{ladder_weights, Ladder, LadderBuilder, LadderWeight, QuoteMode};
pub use skew::compute_skew;
pub use strategy::{Strategy, StrategyKind};
