//! EmergencyMonitor: per-cycle flatten trip-wire.
//!
//! Once tripped within a cycle the monitor stays tripped and no order intents
//! may be emitted for that cycle. It is reset to Normal at the start of every
//! cycle; nothing carries over between cycles.

use pmm_core::{AccountSnapshot, Direction, Size};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::risk_state::RiskState;

/// Default trip level for the risk ratio.
pub const DEFAULT_EMERGENCY_RISK_RATIO: Decimal = dec!(0.98);

// ============================================================================
// FlattenInstruction
// ============================================================================

/// Cancel everything and close the position at market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenInstruction {
    /// Cancel all resting orders.
    pub cancel_all: bool,
    /// Side of the closing market order, `None` when flat.
    pub close_side: Option<Direction>,
    /// Absolute size to close.
    pub close_size: Size,
    /// Risk ratio that caused the trip.
    pub risk_ratio: Decimal,
}

// ============================================================================
// MonitorState
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Normal,
    FlattenTriggered,
}

// ============================================================================
// EmergencyMonitor
// ============================================================================

#[derive(Debug, Clone)]
pub struct EmergencyMonitor {
    threshold: Decimal,
    state: MonitorState,
    instruction: Option<FlattenInstruction>,
}

impl Default for EmergencyMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_EMERGENCY_RISK_RATIO)
    }
}

impl EmergencyMonitor {
    /// Create a monitor that trips when `risk_ratio > threshold`.
    #[must_use]
    pub fn new(threshold: Decimal) -> Self {
        Self {
            threshold,
            state: MonitorState::Normal,
            instruction: None,
        }
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.state == MonitorState::FlattenTriggered
    }

    /// Reset to Normal. Called at the start of each cycle.
    pub fn begin_cycle(&mut self) {
        if self.is_triggered() {
            debug!("EmergencyMonitor reset for new cycle");
        }
        self.state = MonitorState::Normal;
        self.instruction = None;
    }

    /// Check the risk state; returns the flatten instruction if tripped.
    ///
    /// Repeated observations after a trip return the first instruction.
    pub fn observe(
        &mut self,
        risk: &RiskState,
        account: &AccountSnapshot,
    ) -> Option<FlattenInstruction> {
        if let Some(instruction) = self.instruction {
            warn!(
                risk_ratio = %risk.risk_ratio,
                "EmergencyMonitor already tripped this cycle"
            );
            return Some(instruction);
        }

        if risk.risk_ratio <= self.threshold {
            return None;
        }

        let close_side = account.position_direction().map(|d| d.opposite());
        let instruction = FlattenInstruction {
            cancel_all: true,
            close_side,
            close_size: account.position_size.abs(),
            risk_ratio: risk.risk_ratio,
        };

        self.state = MonitorState::FlattenTriggered;
        self.instruction = Some(instruction);

        error!(
            risk_ratio = %risk.risk_ratio,
            threshold = %self.threshold,
            close_side = ?close_side,
            close_size = %instruction.close_size,
            "FLATTEN TRIGGERED"
        );

        Some(instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk_state::FundingBias;

    fn risk(ratio: Decimal, position: Decimal) -> RiskState {
        RiskState {
            risk_ratio: ratio,
            funding_bias: FundingBias::Neutral,
            position_size: Size::new(position),
            funding_rate: Decimal::ZERO,
        }
    }

    fn account(position: Decimal) -> AccountSnapshot {
        AccountSnapshot {
            position_size: Size::new(position),
            ..AccountSnapshot::default()
        }
    }

    #[test]
    fn test_normal_below_threshold() {
        let mut monitor = EmergencyMonitor::default();
        assert!(monitor.observe(&risk(dec!(0.98), dec!(1)), &account(dec!(1))).is_none());
        assert_eq!(monitor.state(), MonitorState::Normal);
    }

    #[test]
    fn test_trips_above_threshold_long() {
        let mut monitor = EmergencyMonitor::default();
        let instruction = monitor
            .observe(&risk(dec!(0.99), dec!(2.5)), &account(dec!(2.5)))
            .unwrap();

        assert!(monitor.is_triggered());
        assert!(instruction.cancel_all);
        assert_eq!(instruction.close_side, Some(Direction::Short));
        assert_eq!(instruction.close_size, Size::new(dec!(2.5)));
        assert_eq!(instruction.risk_ratio, dec!(0.99));
    }

    #[test]
    fn test_trips_short_position_closes_long() {
        let mut monitor = EmergencyMonitor::default();
        let instruction = monitor
            .observe(&risk(dec!(1.2), dec!(-4)), &account(dec!(-4)))
            .unwrap();
        assert_eq!(instruction.close_side, Some(Direction::Long));
        assert_eq!(instruction.close_size, Size::new(dec!(4)));
    }

    #[test]
    fn test_trip_is_sticky_within_cycle() {
        let mut monitor = EmergencyMonitor::default();
        let first = monitor
            .observe(&risk(dec!(0.99), dec!(1)), &account(dec!(1)))
            .unwrap();
        // A calmer reading in the same cycle does not clear the trip.
        let second = monitor
            .observe(&risk(dec!(0.1), dec!(1)), &account(dec!(1)))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reset_on_new_cycle() {
        let mut monitor = EmergencyMonitor::default();
        monitor.observe(&risk(dec!(0.99), dec!(1)), &account(dec!(1)));
        assert!(monitor.is_triggered());

        monitor.begin_cycle();
        assert_eq!(monitor.state(), MonitorState::Normal);
        assert!(monitor.observe(&risk(dec!(0.5), dec!(1)), &account(dec!(1))).is_none());
    }

    #[test]
    fn test_flat_account_still_cancels() {
        let mut monitor = EmergencyMonitor::new(dec!(0.5));
        let instruction = monitor
            .observe(&risk(dec!(0.6), dec!(0)), &account(dec!(0)))
            .unwrap();
        assert!(instruction.cancel_all);
        assert_eq!(instruction.close_side, None);
        assert!(instruction.close_size.is_zero());
    }
}
