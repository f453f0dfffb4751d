//! Quoting engine configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use pmm_core::Price;
use pmm_risk::RiskLimits;

use crate::error::{MmError, MmResult};

/// Upper bound on levels per side for any ladder the engine can build.
pub const MAX_LADDER_LEVELS: u32 = 64;

/// Risk and sizing parameters for the ladder engine.
///
/// Immutable for the lifetime of a run; passed into every evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Leverage that maps to a risk ratio of 1.
    #[serde(default = "default_max_leverage")]
    pub max_leverage: Decimal,

    /// Target position notional in quote units.
    #[serde(default = "default_max_target_notional")]
    pub max_target_notional: Decimal,

    /// Base price offset as a fraction of the oracle price.
    #[serde(default = "default_base_aggression")]
    pub base_aggression: Decimal,

    /// Bid / ask aggression multipliers applied when funding is non-zero.
    #[serde(default = "default_aggression_band")]
    pub aggression_band: [Decimal; 2],

    /// Scales how much skew shifts size between sides.
    #[serde(default = "default_target_skew_factor")]
    pub target_skew_factor: Decimal,

    /// Risk ratio at or above which the engine de-risks.
    #[serde(default = "default_derisk_threshold")]
    pub derisk_threshold: Decimal,

    /// Risk ratio below which the engine quotes freely.
    #[serde(default = "default_uprisk_threshold")]
    pub uprisk_threshold: Decimal,

    #[serde(default = "default_max_orders_per_side")]
    pub max_orders_per_side: u32,

    /// Order-book bucketing tick.
    #[serde(default = "default_tick_size")]
    pub tick_size: Decimal,

    /// Weight on `liability / max_target_notional` in the risk ratio.
    #[serde(default = "default_notional_risk_weight")]
    pub notional_risk_weight: Decimal,

    /// `skew = funding_bias * funding_skew_weight`.
    #[serde(default = "default_funding_skew_weight")]
    pub funding_skew_weight: Decimal,

    /// Skew step applied against the position above the uprisk threshold.
    #[serde(default = "default_risk_skew_step")]
    pub risk_skew_step: Decimal,

    /// Flip the funding-bias sign convention.
    #[serde(default)]
    pub invert_funding_bias: bool,

    /// Funding influence on aggression in the low-risk regime.
    #[serde(default = "default_low_risk_damping")]
    pub low_risk_damping: Decimal,

    /// Funding influence on aggression in the mid-risk regime.
    #[serde(default = "default_mid_risk_damping")]
    pub mid_risk_damping: Decimal,

    /// High-risk loosening: `(1 + risk_ratio) * factor` on the position side.
    #[serde(default = "default_derisk_loosen_factor")]
    pub derisk_loosen_factor: Decimal,

    /// Dust floor for order sizes (base units).
    #[serde(default = "default_min_order_size")]
    pub min_order_size: Decimal,

    /// Depth of the first-entry / degraded / fallback ladder.
    #[serde(default = "default_ladder_levels")]
    pub default_ladder_levels: u32,

    /// Requested levels per side; wins when larger than the free slots.
    #[serde(default)]
    pub level_override: u32,

    /// EmergencyMonitor trip level.
    #[serde(default = "default_emergency_risk_ratio")]
    pub emergency_risk_ratio: Decimal,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            max_leverage: default_max_leverage(),
            max_target_notional: default_max_target_notional(),
            base_aggression: default_base_aggression(),
            aggression_band: default_aggression_band(),
            target_skew_factor: default_target_skew_factor(),
            derisk_threshold: default_derisk_threshold(),
            uprisk_threshold: default_uprisk_threshold(),
            max_orders_per_side: default_max_orders_per_side(),
            tick_size: default_tick_size(),
            notional_risk_weight: default_notional_risk_weight(),
            funding_skew_weight: default_funding_skew_weight(),
            risk_skew_step: default_risk_skew_step(),
            invert_funding_bias: false,
            low_risk_damping: default_low_risk_damping(),
            mid_risk_damping: default_mid_risk_damping(),
            derisk_loosen_factor: default_derisk_loosen_factor(),
            min_order_size: default_min_order_size(),
            default_ladder_levels: default_ladder_levels(),
            level_override: 0,
            emergency_risk_ratio: default_emergency_risk_ratio(),
        }
    }
}

impl RiskParameters {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> MmResult<()> {
        let positive = [
            ("max_leverage", self.max_leverage),
            ("max_target_notional", self.max_target_notional),
            ("base_aggression", self.base_aggression),
            ("tick_size", self.tick_size),
            ("emergency_risk_ratio", self.emergency_risk_ratio),
        ];
        for (name, value) in positive {
            if value <= Decimal::ZERO {
                return Err(MmError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let non_negative = [
            ("aggression_band[0]", self.aggression_band[0]),
            ("aggression_band[1]", self.aggression_band[1]),
            ("uprisk_threshold", self.uprisk_threshold),
            ("notional_risk_weight", self.notional_risk_weight),
            ("min_order_size", self.min_order_size),
            ("derisk_loosen_factor", self.derisk_loosen_factor),
        ];
        for (name, value) in non_negative {
            if value < Decimal::ZERO {
                return Err(MmError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }

        if self.max_orders_per_side == 0 {
            return Err(MmError::InvalidConfig(
                "max_orders_per_side must be at least 1".to_string(),
            ));
        }
        if self.default_ladder_levels == 0 {
            return Err(MmError::InvalidConfig(
                "default_ladder_levels must be at least 1".to_string(),
            ));
        }
        let level_limits = [
            ("max_orders_per_side", self.max_orders_per_side),
            ("default_ladder_levels", self.default_ladder_levels),
            ("level_override", self.level_override),
        ];
        for (name, value) in level_limits {
            if value > MAX_LADDER_LEVELS {
                return Err(MmError::InvalidConfig(format!(
                    "{name} must be at most {MAX_LADDER_LEVELS}, got {value}"
                )));
            }
        }
        if self.uprisk_threshold > self.derisk_threshold {
            return Err(MmError::InvalidConfig(format!(
                "uprisk_threshold ({}) exceeds derisk_threshold ({})",
                self.uprisk_threshold, self.derisk_threshold
            )));
        }
        Ok(())
    }

    /// Limits consumed by the risk-state computation.
    pub fn risk_limits(&self) -> RiskLimits {
        RiskLimits {
            max_leverage: self.max_leverage,
            max_target_notional: self.max_target_notional,
            notional_risk_weight: self.notional_risk_weight,
            invert_funding_bias: self.invert_funding_bias,
        }
    }

    #[inline]
    pub fn tick(&self) -> Price {
        Price::new(self.tick_size)
    }
}

/// Single-level floating quote around the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatingParams {
    /// Full bid/ask spread in price units.
    #[serde(default = "default_floating_spread")]
    pub spread: Decimal,

    /// Base size per side.
    #[serde(default = "default_floating_size")]
    pub size: Decimal,

    /// Shift of the quote center from the oracle.
    #[serde(default)]
    pub center_offset: Decimal,
}

impl Default for FloatingParams {
    fn default() -> Self {
        Self {
            spread: default_floating_spread(),
            size: default_floating_size(),
            center_offset: Decimal::ZERO,
        }
    }
}

impl FloatingParams {
    pub fn validate(&self) -> MmResult<()> {
        if self.spread < Decimal::ZERO {
            return Err(MmError::InvalidConfig(format!(
                "floating spread must be non-negative, got {}",
                self.spread
            )));
        }
        if self.size <= Decimal::ZERO {
            return Err(MmError::InvalidConfig(format!(
                "floating size must be positive, got {}",
                self.size
            )));
        }
        Ok(())
    }
}

fn default_max_leverage() -> Decimal {
    dec!(2)
}
fn default_max_target_notional() -> Decimal {
    dec!(100)
}
fn default_base_aggression() -> Decimal {
    dec!(0.001) // 10 bps
}
fn default_aggression_band() -> [Decimal; 2] {
    [dec!(0.8), dec!(1.01)]
}
fn default_target_skew_factor() -> Decimal {
    dec!(1)
}
fn default_derisk_threshold() -> Decimal {
    dec!(0.8)
}
fn default_uprisk_threshold() -> Decimal {
    dec!(0.3)
}
fn default_max_orders_per_side() -> u32 {
    3
}
fn default_tick_size() -> Decimal {
    dec!(0.1)
}
fn default_notional_risk_weight() -> Decimal {
    dec!(0.8)
}
fn default_funding_skew_weight() -> Decimal {
    dec!(0.1)
}
fn default_risk_skew_step() -> Decimal {
    dec!(0.5)
}
fn default_low_risk_damping() -> Decimal {
    dec!(0.75)
}
fn default_mid_risk_damping() -> Decimal {
    dec!(1)
}
fn default_derisk_loosen_factor() -> Decimal {
    dec!(2)
}
fn default_min_order_size() -> Decimal {
    dec!(0.1)
}
fn default_ladder_levels() -> u32 {
    3
}
fn default_emergency_risk_ratio() -> Decimal {
    dec!(0.98)
}
fn default_floating_spread() -> Decimal {
    dec!(0.01)
}
fn default_floating_size() -> Decimal {
    dec!(0.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters() {
        let params = RiskParameters::default();
        assert_eq!(params.max_leverage, dec!(2));
        assert_eq!(params.max_target_notional, dec!(100));
        assert_eq!(params.base_aggression, dec!(0.001));
        assert_eq!(params.aggression_band, [dec!(0.8), dec!(1.01)]);
        assert_eq!(params.derisk_threshold, dec!(0.8));
        assert_eq!(params.uprisk_threshold, dec!(0.3));
        assert_eq!(params.max_orders_per_side, 3);
        assert_eq!(params.emergency_risk_ratio, dec!(0.98));
        assert!(!params.invert_funding_bias);
        assert_eq!(params.level_override, 0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_serde_defaults() {
        let toml_str = r#"
max_target_notional = "250"
max_orders_per_side = 5
"#;
        let params: RiskParameters = toml::from_str(toml_str).unwrap();
        assert_eq!(params.max_target_notional, dec!(250));
        assert_eq!(params.max_orders_per_side, 5);
        assert_eq!(params.base_aggression, dec!(0.001));
        assert_eq!(params.tick_size, dec!(0.1));
    }

    #[test]
    fn test_validate_rejects_zero_orders() {
        let params = RiskParameters {
            max_orders_per_side: 0,
            ..RiskParameters::default()
        };
        assert!(matches!(params.validate(), Err(MmError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_caps_ladder_levels() {
        let params = RiskParameters {
            level_override: 4_000_000_000,
            ..RiskParameters::default()
        };
        assert!(matches!(params.validate(), Err(MmError::InvalidConfig(_))));

        let params = RiskParameters {
            max_orders_per_side: MAX_LADDER_LEVELS + 1,
            ..RiskParameters::default()
        };
        assert!(params.validate().is_err());

        let params = RiskParameters {
            level_override: MAX_LADDER_LEVELS,
            ..RiskParameters::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_leverage() {
        let params = RiskParameters {
            max_leverage: dec!(0),
            ..RiskParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let params = RiskParameters {
            uprisk_threshold: dec!(0.9),
            derisk_threshold: dec!(0.5),
            ..RiskParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_risk_limits_mirror_parameters() {
        let params = RiskParameters {
            invert_funding_bias: true,
            ..RiskParameters::default()
        };
        let limits = params.risk_limits();
        assert_eq!(limits.max_leverage, params.max_leverage);
        assert!(limits.invert_funding_bias);
    }

    #[test]
    fn test_floating_validate() {
        assert!(FloatingParams::default().validate().is_ok());
        let bad = FloatingParams {
            size: dec!(0),
            ..FloatingParams::default()
        };
        assert!(bad.validate().is_err());
    }
}
