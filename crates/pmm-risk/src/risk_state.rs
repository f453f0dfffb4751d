//! Per-cycle risk state.
//!
//! Collapses the account and market snapshots into one risk ratio plus a
//! directional funding bias. Both are recomputed from scratch every cycle.

use pmm_core::{AccountSnapshot, MarketSnapshot, Size};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use crate::error::{RiskError, RiskResult};

// ============================================================================
// RiskLimits
// ============================================================================

/// Limits the risk ratio is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Leverage that maps to a risk ratio of 1.
    pub max_leverage: Decimal,
    /// Liability (quote units) that maps to a notional ratio of 1.
    pub max_target_notional: Decimal,
    /// Weight applied to the notional ratio.
    pub notional_risk_weight: Decimal,
    /// Flip the funding-bias sign convention.
    pub invert_funding_bias: bool,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_leverage: dec!(2),
            max_target_notional: dec!(100),
            notional_risk_weight: dec!(0.8),
            invert_funding_bias: false,
        }
    }
}

impl RiskLimits {
    pub fn validate(&self) -> RiskResult<()> {
        if self.max_leverage <= Decimal::ZERO {
            return Err(RiskError::InvalidLimits(format!(
                "max_leverage must be positive, got {}",
                self.max_leverage
            )));
        }
        if self.max_target_notional <= Decimal::ZERO {
            return Err(RiskError::InvalidLimits(format!(
                "max_target_notional must be positive, got {}",
                self.max_target_notional
            )));
        }
        if self.notional_risk_weight < Decimal::ZERO {
            return Err(RiskError::InvalidLimits(format!(
                "notional_risk_weight must be non-negative, got {}",
                self.notional_risk_weight
            )));
        }
        Ok(())
    }
}

// ============================================================================
// FundingBias
// ============================================================================

/// Directional preference derived from funding and the oracle/mark gap.
///
/// Positive values favor going long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingBias {
    StrongShort,
    Short,
    Neutral,
    Long,
    StrongLong,
}

impl FundingBias {
    /// Classify funding rate against the oracle/mark relationship.
    ///
    /// | funding | oracle vs mark | bias |
    /// |---|---|---|
    /// | > 0 | below | -1.0 |
    /// | < 0 | above | +1.0 |
    /// | other | below | -0.5 |
    /// | other | above | +0.5 |
    /// | any | equal | 0 |
    pub fn classify(funding_rate: Decimal, market: &MarketSnapshot) -> Self {
        let oracle = market.oracle_price;
        let mark = market.mark_price;

        if oracle < mark {
            if funding_rate > Decimal::ZERO {
                Self::StrongShort
            } else {
                Self::Short
            }
        } else if oracle > mark {
            if funding_rate < Decimal::ZERO {
                Self::StrongLong
            } else {
                Self::Long
            }
        } else {
            Self::Neutral
        }
    }

    /// Numeric value in [-1, 1].
    pub fn value(&self) -> Decimal {
        match self {
            Self::StrongShort => dec!(-1.0),
            Self::Short => dec!(-0.5),
            Self::Neutral => Decimal::ZERO,
            Self::Long => dec!(0.5),
            Self::StrongLong => dec!(1.0),
        }
    }

    pub fn inverted(&self) -> Self {
        match self {
            Self::StrongShort => Self::StrongLong,
            Self::Short => Self::Long,
            Self::Neutral => Self::Neutral,
            Self::Long => Self::Short,
            Self::StrongLong => Self::StrongShort,
        }
    }
}

impl fmt::Display for FundingBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

// ============================================================================
// RiskRegime
// ============================================================================

/// Risk bucket relative to the uprisk/derisk thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskRegime {
    /// `risk_ratio < uprisk`
    Low,
    /// `uprisk <= risk_ratio < derisk`
    Mid,
    /// `risk_ratio >= derisk`
    High,
}

impl RiskRegime {
    pub fn classify(risk_ratio: Decimal, uprisk: Decimal, derisk: Decimal) -> Self {
        if risk_ratio >= derisk {
            Self::High
        } else if risk_ratio >= uprisk {
            Self::Mid
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RiskState
// ============================================================================

/// Risk summary for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskState {
    /// `max(leverage / max_leverage, liability / max_target_notional * weight)`, >= 0.
    pub risk_ratio: Decimal,
    pub funding_bias: FundingBias,
    /// Signed position copied from the account.
    pub position_size: Size,
    /// Funding rate copied from the market.
    pub funding_rate: Decimal,
}

impl RiskState {
    /// Compute the risk state from fresh snapshots.
    pub fn compute(
        account: &AccountSnapshot,
        market: &MarketSnapshot,
        limits: &RiskLimits,
    ) -> RiskResult<Self> {
        limits.validate()?;
        if account.leverage < Decimal::ZERO {
            return Err(RiskError::InvalidSnapshot(format!(
                "negative leverage {}",
                account.leverage
            )));
        }

        let leverage_ratio = account.leverage / limits.max_leverage;
        let notional_ratio =
            account.liability.abs() / limits.max_target_notional * limits.notional_risk_weight;
        let risk_ratio = leverage_ratio.max(notional_ratio).max(Decimal::ZERO);

        let mut funding_bias = FundingBias::classify(market.funding_rate, market);
        if limits.invert_funding_bias {
            funding_bias = funding_bias.inverted();
        }

        trace!(
            %risk_ratio,
            %leverage_ratio,
            %notional_ratio,
            %funding_bias,
            "Computed risk state"
        );

        Ok(Self {
            risk_ratio,
            funding_bias,
            position_size: account.position_size,
            funding_rate: market.funding_rate,
        })
    }

    pub fn regime(&self, uprisk: Decimal, derisk: Decimal) -> RiskRegime {
        RiskRegime::classify(self.risk_ratio, uprisk, derisk)
    }

    #[inline]
    pub fn is_long(&self) -> bool {
        self.position_size.is_positive()
    }
}
