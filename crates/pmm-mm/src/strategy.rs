//! Strategy selection.
//!
//! The strategy is chosen from configuration at startup and then evaluated
//! each cycle through one fixed signature.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pmm_core::{AccountSnapshot, Direction, MarketSnapshot, OrderIntent, Price, RawOrder, Size};
use pmm_feed::{AggregatedBook, OrderBookAggregator};
use pmm_risk::RiskState;

use crate::config::{FloatingParams, RiskParameters};
use crate::engine::{assess_with_book, check_emergency, check_market, DecisionResult, Evaluation};
use crate::error::MmResult;
use crate::ladder::{Ladder, QuoteMode};

/// Configured strategy variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyKind {
    /// Risk-driven multi-level ladder.
    #[default]
    RiskLadder,
    /// One bid and one ask at a fixed spread around the oracle.
    Floating(FloatingParams),
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RiskLadder => "risk_ladder",
            Self::Floating(_) => "floating",
        }
    }
}

/// A resolved strategy: variant plus the risk parameters it runs under.
#[derive(Debug, Clone)]
pub struct Strategy {
    kind: StrategyKind,
    params: RiskParameters,
    aggregator: OrderBookAggregator,
}

impl Strategy {
    /// Validate the configuration and build the strategy.
    pub fn new(kind: StrategyKind, params: RiskParameters) -> MmResult<Self> {
        params.validate()?;
        if let StrategyKind::Floating(floating) = &kind {
            floating.validate()?;
        }
        let aggregator = OrderBookAggregator::new(params.tick())?;
        Ok(Self {
            kind,
            params,
            aggregator,
        })
    }

    pub fn kind(&self) -> &StrategyKind {
        &self.kind
    }

    pub fn params(&self) -> &RiskParameters {
        &self.params
    }

    pub fn aggregator(&self) -> &OrderBookAggregator {
        &self.aggregator
    }

    /// Aggregate and evaluate one cycle.
    pub fn evaluate(
        &self,
        orders: &[RawOrder],
        account: &AccountSnapshot,
        market: &MarketSnapshot,
    ) -> MmResult<Evaluation> {
        check_market(market)?;
        let book = self.aggregator.aggregate(orders, market.oracle_price);
        self.evaluate_with_book(&book, account, market)
    }

    /// Evaluate one cycle against an already aggregated book.
    pub fn evaluate_with_book(
        &self,
        book: &AggregatedBook,
        account: &AccountSnapshot,
        market: &MarketSnapshot,
    ) -> MmResult<Evaluation> {
        match &self.kind {
            StrategyKind::RiskLadder => assess_with_book(book, account, market, &self.params),
            StrategyKind::Floating(floating) => {
                evaluate_floating(floating, account, market, &self.params)
            }
        }
    }
}

/// Single-level quote, still guarded by the emergency monitor.
fn evaluate_floating(
    floating: &FloatingParams,
    account: &AccountSnapshot,
    market: &MarketSnapshot,
    params: &RiskParameters,
) -> MmResult<Evaluation> {
    check_market(market)?;
    let risk = RiskState::compute(account, market, &params.risk_limits())?;

    let decision = match check_emergency(&risk, account, params) {
        Some(instruction) => DecisionResult::Flatten(instruction),
        None => {
            let half_spread = floating.spread / Decimal::TWO;
            let size = Size::new(floating.size);
            let ladder = Ladder {
                bids: vec![OrderIntent {
                    side: Direction::Long,
                    size,
                    oracle_offset: Price::new(floating.center_offset - half_spread),
                }],
                asks: vec![OrderIntent {
                    side: Direction::Short,
                    size,
                    oracle_offset: Price::new(floating.center_offset + half_spread),
                }],
                mode: QuoteMode::Floating,
            };
            debug!(spread = %floating.spread, size = %floating.size, "Floating quote");
            DecisionResult::Ladder(ladder)
        }
    };

    Ok(Evaluation {
        decision,
        risk,
        skew: Decimal::ZERO,
        aggression: None,
    })
}
