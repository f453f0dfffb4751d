//! Decision pipeline.
//!
//! # Pipeline
//!
//! ```text
//! raw orders ─→ OrderBookAggregator ─→ AggregatedBook
//! account + market ─→ RiskState ─→ EmergencyMonitor ─→ Flatten?
//!                               └─→ skew + aggression ─→ LadderBuilder ─→ Ladder
//! ```
//!
//! Every call is a pure function of its inputs; nothing survives between
//! cycles.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pmm_core::{AccountSnapshot, MarketSnapshot, RawOrder};
use pmm_feed::{AggregatedBook, OrderBookAggregator};
use pmm_risk::{EmergencyMonitor, FlattenInstruction, RiskState};

use crate::aggression::{compute_aggression, Aggression};
use crate::config::RiskParameters;
use crate::error::{MmError, MmResult};
use crate::ladder::{Ladder, LadderBuilder, QuoteMode};
use crate::skew::compute_skew;

/// Outcome of one decision cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionResult {
    /// Cancel everything and close the position. No intents this cycle.
    Flatten(FlattenInstruction),
    /// Place these intents.
    Ladder(Ladder),
}

impl DecisionResult {
    pub fn is_flatten(&self) -> bool {
        matches!(self, Self::Flatten(_))
    }

    pub fn ladder(&self) -> Option<&Ladder> {
        match self {
            Self::Ladder(ladder) => Some(ladder),
            Self::Flatten(_) => None,
        }
    }
}

/// Decision plus the intermediate values that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: DecisionResult,
    pub risk: RiskState,
    /// Zero unless the risk-adjusted path ran.
    pub skew: Decimal,
    pub aggression: Option<Aggression>,
}

impl Evaluation {
    fn without_quoting(decision: DecisionResult, risk: RiskState) -> Self {
        Self {
            decision,
            risk,
            skew: Decimal::ZERO,
            aggression: None,
        }
    }
}

/// Evaluate one cycle from raw inputs.
pub fn evaluate(
    orders: &[RawOrder],
    account: &AccountSnapshot,
    market: &MarketSnapshot,
    params: &RiskParameters,
) -> MmResult<DecisionResult> {
    assess(orders, account, market, params).map(|evaluation| evaluation.decision)
}

/// Evaluate one cycle against an already aggregated book.
pub fn evaluate_with_book(
    book: &AggregatedBook,
    account: &AccountSnapshot,
    market: &MarketSnapshot,
    params: &RiskParameters,
) -> MmResult<DecisionResult> {
    assess_with_book(book, account, market, params).map(|evaluation| evaluation.decision)
}

/// Like [`evaluate`], also returning risk state, skew and aggression.
pub fn assess(
    orders: &[RawOrder],
    account: &AccountSnapshot,
    market: &MarketSnapshot,
    params: &RiskParameters,
) -> MmResult<Evaluation> {
    check_market(market)?;
    let book = OrderBookAggregator::new(params.tick())?.aggregate(orders, market.oracle_price);
    assess_with_book(&book, account, market, params)
}

/// Like [`evaluate_with_book`], also returning risk state, skew and aggression.
pub fn assess_with_book(
    book: &AggregatedBook,
    account: &AccountSnapshot,
    market: &MarketSnapshot,
    params: &RiskParameters,
) -> MmResult<Evaluation> {
    check_market(market)?;
    let risk = RiskState::compute(account, market, &params.risk_limits())?;

    if let Some(instruction) = check_emergency(&risk, account, params) {
        return Ok(Evaluation::without_quoting(
            DecisionResult::Flatten(instruction),
            risk,
        ));
    }

    let builder = LadderBuilder::new(params);
    let oracle = market.oracle_price;

    if !account.has_position() {
        debug!(risk_ratio = %risk.risk_ratio, "No position, quoting first-entry ladder");
        return Ok(Evaluation::without_quoting(
            DecisionResult::Ladder(builder.build_default(oracle, QuoteMode::FirstEntry)),
            risk,
        ));
    }

    if !book.is_two_sided() {
        info!(
            best_bid = ?book.best_bid,
            best_ask = ?book.best_ask,
            "Book is not two-sided, quoting degraded ladder around oracle"
        );
        return Ok(Evaluation::without_quoting(
            DecisionResult::Ladder(builder.build_default(oracle, QuoteMode::Degraded)),
            risk,
        ));
    }

    let skew = compute_skew(&risk, params);
    let aggression = compute_aggression(&risk, params);
    let ladder = builder.build(skew, &aggression, account, oracle);

    debug!(
        risk_ratio = %risk.risk_ratio,
        funding_bias = %risk.funding_bias,
        regime = %aggression.regime,
        %skew,
        intents = ladder.len(),
        "Evaluated risk-adjusted ladder"
    );

    Ok(Evaluation {
        decision: DecisionResult::Ladder(ladder),
        risk,
        skew,
        aggression: Some(aggression),
    })
}

/// Run a fresh monitor for this cycle.
pub(crate) fn check_emergency(
    risk: &RiskState,
    account: &AccountSnapshot,
    params: &RiskParameters,
) -> Option<FlattenInstruction> {
    let mut monitor = EmergencyMonitor::new(params.emergency_risk_ratio);
    monitor.begin_cycle();
    monitor.observe(risk, account)
}

pub(crate) fn check_market(market: &MarketSnapshot) -> MmResult<()> {
    if !market.oracle_price.is_positive() {
        return Err(MmError::InvalidSnapshot(format!(
            "oracle price must be positive, got {}",
            market.oracle_price
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmm_core::{Direction, OrderKind, Price, Size};
    use rust_decimal_macros::dec;

    fn order(id: u64, direction: Direction, price: Decimal) -> RawOrder {
        RawOrder {
            id,
            direction,
            kind: OrderKind::Limit,
            limit_price: Price::new(price),
            base_amount: Size::new(dec!(1)),
            oracle_price_offset: Price::ZERO,
            owner: "other".to_string(),
        }
    }

    fn two_sided_orders() -> Vec<RawOrder> {
        vec![
            order(1, Direction::Long, dec!(99.9)),
            order(2, Direction::Long, dec!(99.7)),
            order(3, Direction::Short, dec!(100.3)),
            order(4, Direction::Short, dec!(100.5)),
        ]
    }

    fn market(oracle: Decimal, mark: Decimal, funding: Decimal) -> MarketSnapshot {
        MarketSnapshot {
            oracle_price: Price::new(oracle),
            mark_price: Price::new(mark),
            funding_rate: funding,
        }
    }

    fn account(position: Decimal, leverage: Decimal) -> AccountSnapshot {
        AccountSnapshot {
            position_size: Size::new(position),
            leverage,
            total_collateral: dec!(100),
            ..AccountSnapshot::default()
        }
    }

    #[test]
    fn test_rejects_non_positive_oracle() {
        let result = evaluate(
            &two_sided_orders(),
            &account(dec!(1), dec!(0.1)),
            &market(dec!(0), dec!(100), dec!(0)),
            &RiskParameters::default(),
        );
        assert!(matches!(result, Err(MmError::InvalidSnapshot(_))));
    }

    #[test]
    fn test_high_risk_flattens() {
        // leverage 1.98 / 2 = 0.99
        let decision = evaluate(
            &two_sided_orders(),
            &account(dec!(3), dec!(1.98)),
            &market(dec!(100), dec!(100.1), dec!(0.01)),
            &RiskParameters::default(),
        )
        .unwrap();

        match decision {
            DecisionResult::Flatten(instruction) => {
                assert!(instruction.cancel_all);
                assert_eq!(instruction.close_side, Some(Direction::Short));
                assert_eq!(instruction.close_size, Size::new(dec!(3)));
                assert_eq!(instruction.risk_ratio, dec!(0.99));
            }
            other => panic!("expected flatten, got {other:?}"),
        }
    }

    #[test]
    fn test_flatten_wins_even_when_flat_and_one_sided() {
        let decision = evaluate(
            &[],
            &account(dec!(0), dec!(1.98)),
            &market(dec!(100), dec!(100), dec!(0)),
            &RiskParameters::default(),
        )
        .unwrap();
        assert!(decision.is_flatten());
        assert!(decision.ladder().is_none());
    }

    #[test]
    fn test_first_entry_when_flat() {
        let decision = evaluate(
            &two_sided_orders(),
            &account(dec!(0), dec!(0)),
            &market(dec!(100), dec!(100), dec!(0)),
            &RiskParameters::default(),
        )
        .unwrap();
        let ladder = decision.ladder().unwrap();
        assert_eq!(ladder.mode, QuoteMode::FirstEntry);
        assert_eq!(ladder.bids.len(), 3);
        assert_eq!(ladder.asks.len(), 3);
    }

    #[test]
    fn test_degraded_when_one_sided() {
        let orders: Vec<_> = two_sided_orders()
            .into_iter()
            .filter(|o| o.direction == Direction::Long)
            .collect();
        let decision = evaluate(
            &orders,
            &account(dec!(0.5), dec!(0.1)),
            &market(dec!(100), dec!(100), dec!(0)),
            &RiskParameters::default(),
        )
        .unwrap();
        assert_eq!(decision.ladder().unwrap().mode, QuoteMode::Degraded);

        let empty = evaluate(
            &[],
            &account(dec!(0.5), dec!(0.1)),
            &market(dec!(100), dec!(100), dec!(0)),
            &RiskParameters::default(),
        )
        .unwrap();
        assert_eq!(empty.ladder().unwrap().mode, QuoteMode::Degraded);
    }

    #[test]
    fn test_mid_risk_scenario() {
        // risk 0.5, funding 0.01, oracle below mark
        let evaluation = assess(
            &two_sided_orders(),
            &account(dec!(0.5), dec!(1)),
            &market(dec!(100), dec!(100.1), dec!(0.01)),
            &RiskParameters::default(),
        )
        .unwrap();

        assert_eq!(evaluation.risk.risk_ratio, dec!(0.5));
        // strong short bias -0.1, long position above uprisk -0.5
        assert_eq!(evaluation.skew, dec!(-0.6));

        let aggression = evaluation.aggression.unwrap();
        assert_eq!(aggression.bid, dec!(0.808));
        assert_eq!(aggression.ask, dec!(0.9999));

        let ladder = evaluation.decision.ladder().unwrap();
        assert_eq!(ladder.mode, QuoteMode::RiskAdjusted);
        // bid offset 0.001 * 0.808 * 100 * 3/6
        assert_eq!(ladder.bids[2].oracle_offset.inner(), dec!(-0.0404));
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let orders = two_sided_orders();
        let acct = account(dec!(-0.4), dec!(0.7));
        let mkt = market(dec!(100), dec!(99.8), dec!(-0.002));
        let params = RiskParameters::default();

        let first = evaluate(&orders, &acct, &mkt, &params).unwrap();
        let second = evaluate(&orders, &acct, &mkt, &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_evaluate_with_book_matches_evaluate() {
        let orders = two_sided_orders();
        let acct = account(dec!(0.4), dec!(0.2));
        let mkt = market(dec!(100), dec!(100.1), dec!(0.001));
        let params = RiskParameters::default();

        let book = OrderBookAggregator::new(params.tick())
            .unwrap()
            .aggregate(&orders, mkt.oracle_price);
        assert_eq!(
            evaluate_with_book(&book, &acct, &mkt, &params).unwrap(),
            evaluate(&orders, &acct, &mkt, &params).unwrap()
        );
    }

    #[test]
    fn test_invalid_tick_surfaces_feed_error() {
        let params = RiskParameters {
            tick_size: dec!(0),
            ..RiskParameters::default()
        };
        let result = evaluate(
            &two_sided_orders(),
            &account(dec!(1), dec!(0.1)),
            &market(dec!(100), dec!(100), dec!(0)),
            &params,
        );
        assert!(matches!(result, Err(MmError::Feed(_))));
    }
}
