//! Risk assessment for the perp market maker.
//!
//! Provides:
//! - RiskState: single risk ratio and funding bias per cycle
//! - RiskRegime: low / mid / high classification against thresholds
//! - EmergencyMonitor: one-shot trip-wire that overrides quoting with a flatten

pub mod emergency;
pub mod error;
pub mod risk_state;

pub use emergency::{
    EmergencyMonitor, FlattenInstruction, MonitorState, DEFAULT_EMERGENCY_RISK_RATIO,
};
pub use error::{RiskError, RiskResult};
pub use risk_state::{FundingBias, RiskLimits, RiskRegime, RiskState};
