//! Order-related types.
//!
//! Provides order direction, order kind, and the raw resting-order record
//! read from the decentralized limit order book each cycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::decimal::{Price, Size};
use crate::error::CoreError;

/// Order direction: long (bid) or short (ask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Returns the opposite direction.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }

    /// Returns 1 for long, -1 for short (for position calculations).
    pub fn sign(&self) -> i8 {
        match self {
            Self::Long => 1,
            Self::Short => -1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long" => Ok(Self::Long),
            "short" => Ok(Self::Short),
            other => Err(CoreError::UnknownDirection(other.to_string())),
        }
    }
}

/// Order type as reported by the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderKind {
    /// Resting limit order (fixed or oracle-pegged price).
    Limit,
    /// Market order (taker, never rests).
    Market,
    /// Stop order executing at market.
    TriggerMarket,
    /// Stop order executing as a limit.
    TriggerLimit,
    /// Oracle auction order.
    Oracle,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "limit"),
            Self::Market => write!(f, "market"),
            Self::TriggerMarket => write!(f, "triggerMarket"),
            Self::TriggerLimit => write!(f, "triggerLimit"),
            Self::Oracle => write!(f, "oracle"),
        }
    }
}

impl FromStr for OrderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "limit" => Ok(Self::Limit),
            "market" => Ok(Self::Market),
            "triggerMarket" => Ok(Self::TriggerMarket),
            "triggerLimit" => Ok(Self::TriggerLimit),
            "oracle" => Ok(Self::Oracle),
            other => Err(CoreError::UnknownOrderKind(other.to_string())),
        }
    }
}

/// A resting order as read from the order book.
///
/// A zero `limit_price` means the order is pegged to the oracle and its
/// effective price is `oracle_price + oracle_price_offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOrder {
    pub id: u64,
    pub direction: Direction,
    pub kind: OrderKind,
    pub limit_price: Price,
    pub base_amount: Size,
    pub oracle_price_offset: Price,
    pub owner: String,
}

impl RawOrder {
    /// Whether the order is pegged to the oracle.
    #[inline]
    pub fn is_oracle_pegged(&self) -> bool {
        self.limit_price.is_zero()
    }

    /// Resolve the price this order actually rests at.
    pub fn effective_price(&self, oracle_price: Price) -> Price {
        if self.is_oracle_pegged() {
            oracle_price + self.oracle_price_offset
        } else {
            self.limit_price
        }
    }

    /// Whether this order rests on the book (limit orders only).
    #[inline]
    pub fn is_resting_limit(&self) -> bool {
        self.kind == OrderKind::Limit
    }
}
