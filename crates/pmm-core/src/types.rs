//! Per-cycle snapshot and output types.
//!
//! Contains the account and market snapshots consumed by the engine and the
//! order intents it emits. Nothing here outlives a single decision cycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Price, Size};
use crate::error::Result;
use crate::order::Direction;
use crate::precision::Scale;

/// Maker's own resting orders, per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrders {
    pub bid_count: u32,
    pub ask_count: u32,
    pub bid_size: Size,
    pub ask_size: Size,
}

/// Account risk state, supplied fresh each cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Signed position in base units (positive = long).
    pub position_size: Size,
    /// Notional position value over collateral.
    pub leverage: Decimal,
    /// Total collateral in quote units.
    pub total_collateral: Decimal,
    /// Total liability (position notional) in quote units.
    pub liability: Decimal,
    /// Unrealized PnL in quote units.
    pub unrealized_pnl: Decimal,
    pub open_bid_count: u32,
    pub open_ask_count: u32,
    pub open_bid_size: Size,
    pub open_ask_size: Size,
}

impl AccountSnapshot {
    /// Whether the account holds a non-zero position.
    #[inline]
    pub fn has_position(&self) -> bool {
        !self.position_size.is_zero()
    }

    /// Direction of the current position, if any.
    pub fn position_direction(&self) -> Option<Direction> {
        if self.position_size.is_positive() {
            Some(Direction::Long)
        } else if self.position_size.inner().is_sign_negative() && !self.position_size.is_zero() {
            Some(Direction::Short)
        } else {
            None
        }
    }

    /// Replace the open-order fields with a summary derived elsewhere
    /// (typically from the order book filtered by owner).
    #[must_use]
    pub fn with_open_orders(mut self, open: OpenOrders) -> Self {
        self.open_bid_count = open.bid_count;
        self.open_ask_count = open.ask_count;
        self.open_bid_size = open.bid_size;
        self.open_ask_size = open.ask_size;
        self
    }

    /// Open-order fields as a summary.
    pub fn open_orders(&self) -> OpenOrders {
        OpenOrders {
            bid_count: self.open_bid_count,
            ask_count: self.open_ask_count,
            bid_size: self.open_bid_size,
            ask_size: self.open_ask_size,
        }
    }
}

/// Market state for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// External reference price.
    pub oracle_price: Price,
    /// Local fair price (book mid, or oracle when the book is one-sided).
    pub mark_price: Price,
    /// Funding rate as a fraction per period.
    pub funding_rate: Decimal,
}

impl MarketSnapshot {
    /// Build a snapshot whose mark price is the mid of the book top.
    ///
    /// Falls back to the oracle price when either side is missing.
    pub fn from_book_top(
        oracle_price: Price,
        funding_rate: Decimal,
        best_bid: Option<Price>,
        best_ask: Option<Price>,
    ) -> Self {
        let mark_price = match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => Price::midpoint(bid, ask),
            _ => oracle_price,
        };
        Self {
            oracle_price,
            mark_price,
            funding_rate,
        }
    }
}

/// One order the submission layer should place.
///
/// The offset is relative to the oracle: negative for bids, positive for asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub side: Direction,
    pub size: Size,
    pub oracle_offset: Price,
}

impl OrderIntent {
    /// Size encoded in base precision.
    pub fn scaled_size(&self) -> Result<i64> {
        Scale::Base.encode(self.size.inner())
    }

    /// Oracle offset encoded in price precision.
    pub fn scaled_offset(&self) -> Result<i64> {
        Scale::Price.encode(self.oracle_offset.inner())
    }
}
