//! Bid/ask aggression multipliers.
//!
//! Multipliers scale `base_aggression`, which in turn scales the oracle
//! offset of every ladder level: a smaller multiplier quotes tighter.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pmm_risk::{RiskRegime, RiskState};

use crate::config::RiskParameters;

/// Per-side multipliers on `base_aggression`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggression {
    pub bid: Decimal,
    pub ask: Decimal,
    pub regime: RiskRegime,
}

impl Aggression {
    /// Neutral multipliers.
    pub fn unit(regime: RiskRegime) -> Self {
        Self {
            bid: Decimal::ONE,
            ask: Decimal::ONE,
            regime,
        }
    }
}

/// Compute aggression for the current risk state.
///
/// - Low / mid risk: zero funding is neutral. Otherwise
///   `bid = band[0] * (1 + funding * damping)` and
///   `ask = band[1] * (1 - funding * damping)`, so positive funding tightens
///   the ask and loosens the bid.
/// - High risk: funding is ignored and the side that would add to the
///   position is pushed out to `(1 + risk_ratio) * derisk_loosen_factor`.
pub fn compute_aggression(risk: &RiskState, params: &RiskParameters) -> Aggression {
    let regime = risk.regime(params.uprisk_threshold, params.derisk_threshold);

    let damping = match regime {
        RiskRegime::Low => params.low_risk_damping,
        RiskRegime::Mid => params.mid_risk_damping,
        RiskRegime::High => {
            let loosened = (Decimal::ONE + risk.risk_ratio) * params.derisk_loosen_factor;
            return if risk.is_long() {
                Aggression {
                    bid: loosened,
                    ..Aggression::unit(regime)
                }
            } else {
                Aggression {
                    ask: loosened,
                    ..Aggression::unit(regime)
                }
            };
        }
    };

    if risk.funding_rate.is_zero() {
        return Aggression::unit(regime);
    }

    let influence = risk.funding_rate * damping;
    Aggression {
        bid: params.aggression_band[0] * (Decimal::ONE + influence),
        ask: params.aggression_band[1] * (Decimal::ONE - influence),
        regime,
    }
}
