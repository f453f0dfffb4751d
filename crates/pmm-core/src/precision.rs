//! Fixed-point precision constants.
//!
//! The exchange encodes every numeric field as an integer in a documented
//! scale. Values are converted to `Decimal` once at the wire boundary and
//! back again only when an intent is encoded for submission; the engine
//! itself never mixes scaled and unscaled units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Base-asset amounts (1e9).
pub const BASE_PRECISION: i64 = 1_000_000_000;
/// Prices and price offsets (1e6).
pub const PRICE_PRECISION: i64 = 1_000_000;
/// Quote amounts: collateral, liability, pnl (1e6).
pub const QUOTE_PRECISION: i64 = 1_000_000;
/// Funding rate (price precision * 1e3 funding buffer).
pub const FUNDING_RATE_PRECISION: i64 = 1_000_000_000;
/// AMM peg multiplier (1e6).
pub const PEG_PRECISION: i64 = 1_000_000;
/// Account leverage (1e4).
pub const LEVERAGE_PRECISION: i64 = 10_000;

/// Named fixed-point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Base,
    Price,
    Quote,
    FundingRate,
    Peg,
    Leverage,
}

impl Scale {
    /// Integer units per whole value.
    pub const fn units(&self) -> i64 {
        match self {
            Self::Base => BASE_PRECISION,
            Self::Price => PRICE_PRECISION,
            Self::Quote => QUOTE_PRECISION,
            Self::FundingRate => FUNDING_RATE_PRECISION,
            Self::Peg => PEG_PRECISION,
            Self::Leverage => LEVERAGE_PRECISION,
        }
    }

    /// Convert a scaled integer into an exact decimal.
    pub fn decode(&self, raw: i64) -> Decimal {
        Decimal::from(raw) / Decimal::from(self.units())
    }

    /// Encode a decimal into scaled integer units, truncating toward zero.
    pub fn encode(&self, value: Decimal) -> Result<i64> {
        value
            .checked_mul(Decimal::from(self.units()))
            .and_then(|scaled| scaled.trunc().to_i64())
            .ok_or_else(|| CoreError::ScaleOverflow {
                value: value.to_string(),
                scale: self.to_string(),
            })
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base(1e9)"),
            Self::Price => write!(f, "price(1e6)"),
            Self::Quote => write!(f, "quote(1e6)"),
            Self::FundingRate => write!(f, "funding_rate(1e9)"),
            Self::Peg => write!(f, "peg(1e6)"),
            Self::Leverage => write!(f, "leverage(1e4)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_price() {
        assert_eq!(Scale::Price.decode(101_250_000), dec!(101.25));
        assert_eq!(Scale::Price.decode(-50_000), dec!(-0.05));
    }

    #[test]
    fn test_decode_funding_rate() {
        assert_eq!(Scale::FundingRate.decode(10_000_000), dec!(0.01));
    }

    #[test]
    fn test_encode_truncates_toward_zero() {
        assert_eq!(Scale::Base.encode(dec!(0.1234567899)).unwrap(), 123_456_789);
        assert_eq!(Scale::Price.encode(dec!(-0.0333333)).unwrap(), -33_333);
    }

    #[test]
    fn test_encode_overflow() {
        let huge = Decimal::MAX;
        assert!(matches!(
            Scale::Base.encode(huge),
            Err(CoreError::ScaleOverflow { .. })
        ));
    }
}
