//! Ladder construction.
//!
//! Each side gets `n` levels with linear-in-rank weights `w_i = i / Σi`.
//! Both size and oracle offset scale with the weight, so outer levels are
//! larger and further from the oracle; cumulative size grows quadratically
//! with rank.
//!
//! ```text
//! size_i   = side_target * w_i
//! offset_i = base_aggression * side_multiplier * w_i * oracle
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pmm_core::{AccountSnapshot, Direction, OrderIntent, Price, Size};

use crate::aggression::Aggression;
use crate::config::{RiskParameters, MAX_LADDER_LEVELS};

// ============================================================================
// Output types
// ============================================================================

/// How a ladder was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteMode {
    /// Flat account: symmetric default ladder.
    FirstEntry,
    /// One-sided or empty book: oracle-referenced default ladder.
    Degraded,
    /// Full skew + aggression pipeline.
    RiskAdjusted,
    /// Single-level quote around the oracle.
    Floating,
}

impl QuoteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstEntry => "first_entry",
            Self::Degraded => "degraded",
            Self::RiskAdjusted => "risk_adjusted",
            Self::Floating => "floating",
        }
    }
}

/// Order intents for both sides, innermost level first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ladder {
    pub bids: Vec<OrderIntent>,
    pub asks: Vec<OrderIntent>,
    pub mode: QuoteMode,
}

impl Ladder {
    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// All intents, bids then asks.
    pub fn intents(&self) -> impl Iterator<Item = &OrderIntent> {
        self.bids.iter().chain(self.asks.iter())
    }
}

/// Weight of one ladder level, kept as `rank / total` until applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LadderWeight {
    pub rank: u64,
    pub total: u64,
}

impl LadderWeight {
    pub fn value(&self) -> Decimal {
        Decimal::from(self.rank) / Decimal::from(self.total)
    }

    /// `amount * rank / total`, multiplied before dividing so whole-number
    /// targets split exactly.
    pub fn apply(&self, amount: Decimal) -> Decimal {
        amount * Decimal::from(self.rank) / Decimal::from(self.total)
    }
}

/// Linear-in-rank weights `i / Σ_{1..n} i`; they sum to 1.
pub fn ladder_weights(levels: u32) -> Vec<LadderWeight> {
    let n = u64::from(levels);
    let total = n * (n + 1) / 2;
    (1..=n).map(|rank| LadderWeight { rank, total }).collect()
}

// ============================================================================
// LadderBuilder
// ============================================================================

pub struct LadderBuilder<'a> {
    params: &'a RiskParameters,
}

impl<'a> LadderBuilder<'a> {
    pub fn new(params: &'a RiskParameters) -> Self {
        Self { params }
    }

    /// Position target in base units.
    pub fn asset_target(&self, oracle: Price) -> Decimal {
        self.params.max_target_notional / oracle.inner()
    }

    /// `(long_target, short_target)` after open orders, position and skew.
    pub fn side_targets(
        &self,
        skew: Decimal,
        account: &AccountSnapshot,
        oracle: Price,
    ) -> (Decimal, Decimal) {
        let asset_target = self.asset_target(oracle);
        let position = account.position_size.inner();
        let tilt = skew * self.params.target_skew_factor;

        let long_target = (asset_target - account.open_bid_size.inner() - position)
            * (Decimal::ONE + tilt);
        let short_target = (asset_target + account.open_ask_size.inner() + position)
            * (Decimal::ONE - tilt);

        (long_target, short_target)
    }

    /// Levels for a side: `max(level_override, max_orders - open)`, floor 0.
    pub fn level_count(&self, open_on_side: u32) -> u32 {
        let free = self.params.max_orders_per_side.saturating_sub(open_on_side);
        free.max(self.params.level_override)
    }

    /// Risk-adjusted ladder.
    pub fn build(
        &self,
        skew: Decimal,
        aggression: &Aggression,
        account: &AccountSnapshot,
        oracle: Price,
    ) -> Ladder {
        let (long_target, short_target) = self.side_targets(skew, account, oracle);

        let bids = self.build_side_or_default(
            Direction::Long,
            long_target,
            aggression.bid,
            self.level_count(account.open_bid_count),
            oracle,
        );
        let asks = self.build_side_or_default(
            Direction::Short,
            short_target,
            aggression.ask,
            self.level_count(account.open_ask_count),
            oracle,
        );

        debug!(
            %skew,
            %long_target,
            %short_target,
            bid_aggression = %aggression.bid,
            ask_aggression = %aggression.ask,
            bids = bids.len(),
            asks = asks.len(),
            "Built risk-adjusted ladder"
        );

        Ladder {
            bids,
            asks,
            mode: QuoteMode::RiskAdjusted,
        }
    }

    /// Symmetric `default_ladder_levels` ladder at base aggression.
    ///
    /// Each side targets the full asset target, ignoring position and skew.
    pub fn build_default(&self, oracle: Price, mode: QuoteMode) -> Ladder {
        let target = self.asset_target(oracle);
        let levels = self.params.default_ladder_levels;
        Ladder {
            bids: self.build_side(Direction::Long, target, Decimal::ONE, levels, oracle),
            asks: self.build_side(Direction::Short, target, Decimal::ONE, levels, oracle),
            mode,
        }
    }

    fn build_side_or_default(
        &self,
        direction: Direction,
        target: Decimal,
        multiplier: Decimal,
        levels: u32,
        oracle: Price,
    ) -> Vec<OrderIntent> {
        let side = self.build_side(direction, target, multiplier, levels, oracle);
        if !side.is_empty() {
            return side;
        }
        debug!(
            side = %direction,
            levels = self.params.default_ladder_levels,
            "No free levels, falling back to default ladder"
        );
        self.build_side(
            direction,
            target,
            Decimal::ONE,
            self.params.default_ladder_levels,
            oracle,
        )
    }

    fn build_side(
        &self,
        direction: Direction,
        target: Decimal,
        multiplier: Decimal,
        levels: u32,
        oracle: Price,
    ) -> Vec<OrderIntent> {
        let side_span = self.params.base_aggression * multiplier * oracle.inner();
        // Bids sit below the oracle.
        let sign = Decimal::from(-direction.sign());

        ladder_weights(levels.min(MAX_LADDER_LEVELS))
            .into_iter()
            .map(|weight| {
                let size = weight.apply(target).max(self.params.min_order_size);
                let offset = weight.apply(side_span) * sign;
                OrderIntent {
                    side: direction,
                    size: Size::new(size),
                    oracle_offset: Price::new(offset),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmm_risk::RiskRegime;
    use rust_decimal_macros::dec;

    fn oracle() -> Price {
        Price::new(dec!(100))
    }

    #[test]
    fn test_weights_sum_to_one() {
        for n in 1..=12 {
            let weights = ladder_weights(n);
            assert_eq!(weights.len(), n as usize);
            let sum: Decimal = weights.iter().map(LadderWeight::value).sum();
            assert!((sum - Decimal::ONE).abs() < dec!(0.0000000001), "n={n} sum={sum}");
        }
    }

    #[test]
    fn test_weights_strictly_increase() {
        let weights = ladder_weights(6);
        for pair in weights.windows(2) {
            assert!(pair[1].value() > pair[0].value());
        }
    }

    #[test]
    fn test_three_level_weights() {
        let weights = ladder_weights(3);
        let tolerance = dec!(0.0000000001);
        assert!((weights[0].value() * dec!(6) - dec!(1)).abs() < tolerance);
        assert!((weights[1].value() * dec!(6) - dec!(2)).abs() < tolerance);
        assert_eq!(weights[2].value(), dec!(0.5));
        assert_eq!(weights[0].apply(dec!(12)), dec!(2));
        assert!(ladder_weights(0).is_empty());
    }

    #[test]
    fn test_built_side_sums_to_target_and_grows_outward() {
        let params = RiskParameters::default();
        let builder = LadderBuilder::new(&params);
        let target = dec!(12);
        for n in 1..=12u32 {
            for direction in [Direction::Long, Direction::Short] {
                let side = builder.build_side(direction, target, Decimal::ONE, n, oracle());
                assert_eq!(side.len(), n as usize);

                let total: Decimal = side.iter().map(|intent| intent.size.inner()).sum();
                assert!((total - target).abs() < dec!(0.0000000001), "n={n} total={total}");

                for pair in side.windows(2) {
                    assert!(pair[1].size > pair[0].size, "n={n}");
                    assert!(
                        pair[1].oracle_offset.inner().abs() > pair[0].oracle_offset.inner().abs(),
                        "n={n}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_unvalidated_override_stays_bounded() {
        let params = RiskParameters {
            level_override: u32::MAX,
            ..RiskParameters::default()
        };
        let builder = LadderBuilder::new(&params);
        let levels = builder.level_count(0);
        let side = builder.build_side(Direction::Long, dec!(1), Decimal::ONE, levels, oracle());
        assert_eq!(side.len(), MAX_LADDER_LEVELS as usize);
    }

    #[test]
    fn test_side_targets_flat_account() {
        let params = RiskParameters::default();
        let builder = LadderBuilder::new(&params);
        let (long, short) = builder.side_targets(dec!(0.1), &AccountSnapshot::default(), oracle());
        assert_eq!(long, dec!(1.1));
        assert_eq!(short, dec!(0.9));
    }

    #[test]
    fn test_side_targets_with_position_and_orders() {
        let params = RiskParameters::default();
        let builder = LadderBuilder::new(&params);
        let account = AccountSnapshot {
            position_size: Size::new(dec!(0.2)),
            open_bid_size: Size::new(dec!(0.3)),
            open_ask_size: Size::new(dec!(0.1)),
            ..AccountSnapshot::default()
        };
        let (long, short) = builder.side_targets(Decimal::ZERO, &account, oracle());
        assert_eq!(long, dec!(0.5));
        assert_eq!(short, dec!(1.3));
    }

    #[test]
    fn test_level_count() {
        let params = RiskParameters::default();
        let builder = LadderBuilder::new(&params);
        assert_eq!(builder.level_count(0), 3);
        assert_eq!(builder.level_count(2), 1);
        assert_eq!(builder.level_count(5), 0);

        let params = RiskParameters {
            level_override: 2,
            ..RiskParameters::default()
        };
        let builder = LadderBuilder::new(&params);
        assert_eq!(builder.level_count(3), 2);
        assert_eq!(builder.level_count(0), 3);
    }

    #[test]
    fn test_build_sizes_and_offsets() {
        let params = RiskParameters {
            max_target_notional: dec!(1200),
            ..RiskParameters::default()
        };
        let builder = LadderBuilder::new(&params);
        let aggression = Aggression {
            bid: dec!(2),
            ask: dec!(1),
            regime: RiskRegime::Mid,
        };
        let ladder = builder.build(Decimal::ZERO, &aggression, &AccountSnapshot::default(), oracle());

        assert_eq!(ladder.mode, QuoteMode::RiskAdjusted);
        assert_eq!(ladder.bids.len(), 3);
        assert_eq!(ladder.asks.len(), 3);

        // asset target 12 -> sizes 2, 4, 6
        let bid_sizes: Vec<Decimal> = ladder.bids.iter().map(|i| i.size.inner()).collect();
        assert_eq!(bid_sizes, vec![dec!(2), dec!(4), dec!(6)]);

        // bid offset = 0.001 * 2 * w * 100 -> 0.2 * w, negative
        assert_eq!(ladder.bids[2].oracle_offset.inner(), dec!(-0.1));
        assert_eq!(ladder.asks[2].oracle_offset.inner(), dec!(0.05));

        for intent in &ladder.bids {
            assert_eq!(intent.side, Direction::Long);
            assert!(intent.oracle_offset.inner() < Decimal::ZERO);
        }
        for intent in &ladder.asks {
            assert_eq!(intent.side, Direction::Short);
            assert!(intent.oracle_offset.inner() > Decimal::ZERO);
        }
    }

    #[test]
    fn test_offsets_grow_outward() {
        let params = RiskParameters::default();
        let builder = LadderBuilder::new(&params);
        let ladder = builder.build_default(oracle(), QuoteMode::FirstEntry);
        for pair in ladder.asks.windows(2) {
            assert!(pair[1].oracle_offset > pair[0].oracle_offset);
        }
        for pair in ladder.bids.windows(2) {
            assert!(pair[1].oracle_offset < pair[0].oracle_offset);
        }
    }

    #[test]
    fn test_dust_sizes_raised_to_minimum() {
        let params = RiskParameters::default();
        let builder = LadderBuilder::new(&params);
        // Long position beyond target drives the long target negative.
        let account = AccountSnapshot {
            position_size: Size::new(dec!(5)),
            ..AccountSnapshot::default()
        };
        let ladder = builder.build(
            Decimal::ZERO,
            &Aggression::unit(RiskRegime::Low),
            &account,
            oracle(),
        );
        for intent in &ladder.bids {
            assert_eq!(intent.size.inner(), dec!(0.1));
        }
    }

    #[test]
    fn test_full_side_falls_back_to_default() {
        let params = RiskParameters::default();
        let builder = LadderBuilder::new(&params);
        let account = AccountSnapshot {
            position_size: Size::new(dec!(0.1)),
            open_ask_count: 3,
            ..AccountSnapshot::default()
        };
        let aggression = Aggression {
            bid: dec!(1),
            ask: dec!(5),
            regime: RiskRegime::Low,
        };
        let ladder = builder.build(Decimal::ZERO, &aggression, &account, oracle());
        assert_eq!(ladder.asks.len(), 3);
        // Fallback quotes at base aggression, not the side multiplier.
        assert_eq!(ladder.asks[2].oracle_offset.inner(), dec!(0.05));
    }

    #[test]
    fn test_default_ladder_is_symmetric() {
        let params = RiskParameters::default();
        let builder = LadderBuilder::new(&params);
        let ladder = builder.build_default(oracle(), QuoteMode::Degraded);
        assert_eq!(ladder.mode, QuoteMode::Degraded);
        assert_eq!(ladder.len(), 6);
        for (bid, ask) in ladder.bids.iter().zip(&ladder.asks) {
            assert_eq!(bid.size, ask.size);
            assert_eq!(bid.oracle_offset, -ask.oracle_offset);
        }
    }
}
