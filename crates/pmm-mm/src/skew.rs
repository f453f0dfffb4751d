//! Directional skew.
//!
//! Skew only splits the target size between sides; it never moves prices.
//! Positive skew grows the bid side.

use rust_decimal::Decimal;

use pmm_risk::RiskState;

use crate::config::RiskParameters;

/// Compute skew from the risk state.
///
/// `funding_bias * funding_skew_weight`, then above the uprisk threshold a
/// step against the position (down when long, up otherwise). Not clamped:
/// with default parameters the result stays inside [-0.6, 0.6].
pub fn compute_skew(risk: &RiskState, params: &RiskParameters) -> Decimal {
    let mut skew = risk.funding_bias.value() * params.funding_skew_weight;

    if risk.risk_ratio > params.uprisk_threshold {
        if risk.is_long() {
            skew -= params.risk_skew_step;
        } else {
            skew += params.risk_skew_step;
        }
    }

    skew
}
