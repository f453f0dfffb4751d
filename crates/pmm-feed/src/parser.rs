//! Wire-format decoding.
//!
//! The exchange reports every number as a fixed-point integer. These records
//! mirror the JSON layout and convert into engine types exactly once.

use pmm_core::{AccountSnapshot, Direction, OrderKind, Price, RawOrder, Scale, Size};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{FeedError, FeedResult};

// ============================================================================
// Orders
// ============================================================================

/// One order entry from the order-book dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrder {
    pub order_id: u64,
    /// Owner account address.
    pub user: String,
    pub order_type: String,
    pub direction: String,
    /// Limit price (1e6). Zero for oracle-pegged orders.
    pub price: i64,
    /// Base amount (1e9).
    pub base_asset_amount: i64,
    /// Offset from the oracle (1e6).
    #[serde(default)]
    pub oracle_price_offset: i64,
}

impl WireOrder {
    /// Decode into a [`RawOrder`].
    pub fn into_order(self) -> FeedResult<RawOrder> {
        let direction: Direction = self.direction.parse()?;
        let kind: OrderKind = self.order_type.parse()?;
        if self.base_asset_amount < 0 {
            return Err(FeedError::InvalidData(format!(
                "order {} has negative base amount {}",
                self.order_id, self.base_asset_amount
            )));
        }

        Ok(RawOrder {
            id: self.order_id,
            direction,
            kind,
            limit_price: Price::new(Scale::Price.decode(self.price)),
            base_amount: Size::new(Scale::Base.decode(self.base_asset_amount)),
            oracle_price_offset: Price::new(Scale::Price.decode(self.oracle_price_offset)),
            owner: self.user,
        })
    }
}

/// Parse a JSON array of wire orders.
pub fn parse_orders(json: &str) -> FeedResult<Vec<RawOrder>> {
    let wire: Vec<WireOrder> = serde_json::from_str(json)?;
    let orders = wire
        .into_iter()
        .map(WireOrder::into_order)
        .collect::<FeedResult<Vec<_>>>()?;
    trace!(count = orders.len(), "Decoded orders");
    Ok(orders)
}

// ============================================================================
// Account
// ============================================================================

/// User account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAccount {
    /// Signed position (1e9).
    pub base_asset_amount: i64,
    /// Leverage (1e4).
    pub leverage: i64,
    /// Collateral (1e6).
    pub total_collateral: i64,
    /// Liability (1e6).
    #[serde(default)]
    pub liability: i64,
    /// Unrealized PnL (1e6).
    #[serde(default)]
    pub unrealized_pnl: i64,
}

impl WireAccount {
    /// Decode into an [`AccountSnapshot`] with no open orders.
    ///
    /// Open-order fields are filled in later from the book.
    pub fn into_snapshot(self) -> FeedResult<AccountSnapshot> {
        if self.leverage < 0 {
            return Err(FeedError::InvalidData(format!(
                "negative leverage {}",
                self.leverage
            )));
        }

        Ok(AccountSnapshot {
            position_size: Size::new(Scale::Base.decode(self.base_asset_amount)),
            leverage: Scale::Leverage.decode(self.leverage),
            total_collateral: Scale::Quote.decode(self.total_collateral),
            liability: Scale::Quote.decode(self.liability),
            unrealized_pnl: Scale::Quote.decode(self.unrealized_pnl),
            ..AccountSnapshot::default()
        })
    }
}

/// Parse a JSON account record.
pub fn parse_account(json: &str) -> FeedResult<AccountSnapshot> {
    serde_json::from_str::<WireAccount>(json)?.into_snapshot()
}

// ============================================================================
// Market
// ============================================================================

/// Perp market record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMarket {
    /// Oracle price (1e6).
    pub oracle_price: i64,
    /// Last funding rate (1e9).
    pub last_funding_rate: i64,
}

impl WireMarket {
    pub fn oracle_price(&self) -> Price {
        Price::new(Scale::Price.decode(self.oracle_price))
    }

    pub fn funding_rate(&self) -> rust_decimal::Decimal {
        Scale::FundingRate.decode(self.last_funding_rate)
    }
}

/// Parse a JSON market record.
pub fn parse_market(json: &str) -> FeedResult<WireMarket> {
    Ok(serde_json::from_str(json)?)
}
