//! Order-book aggregation.
//!
//! Resolves effective prices, keeps resting limit orders only, buckets each
//! side into tick-aligned price levels and accumulates depth outward from the
//! best price.
//!
//! Bucketing is side-aware: asks round **up** to the tick boundary (an ask
//! above a boundary belongs to the next tick), bids round **down**.

use std::collections::BTreeMap;

use pmm_core::{Direction, OpenOrders, Price, RawOrder, Size};
use tracing::debug;

use crate::error::{FeedError, FeedResult};

// ============================================================================
// Book types
// ============================================================================

/// One tick-aligned price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLevel {
    /// Tick-aligned bucket price.
    pub price: Price,
    /// Total base amount resting in this bucket.
    pub quantity: Size,
    /// Running total from the best level up to and including this one.
    pub cumulative_quantity: Size,
}

/// Ordered levels for one side of the book.
///
/// Bids are sorted price-descending, asks price-ascending, so index 0 is
/// always the best level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSide {
    direction: Direction,
    levels: Vec<PriceLevel>,
}

impl BookSide {
    fn empty(direction: Direction) -> Self {
        Self {
            direction,
            levels: Vec::new(),
        }
    }

    /// Side of the book.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Levels ordered from best outward.
    pub fn levels(&self) -> &[PriceLevel] {
        &self.levels
    }

    /// Best (innermost) level.
    pub fn best(&self) -> Option<&PriceLevel> {
        self.levels.first()
    }

    /// Total resting quantity on this side.
    pub fn total_depth(&self) -> Size {
        self.levels
            .last()
            .map(|l| l.cumulative_quantity)
            .unwrap_or(Size::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }
}

/// A resting order together with its resolved price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestingOrder {
    pub order: RawOrder,
    /// Effective price (oracle-pegged orders resolved).
    pub price: Price,
}

/// Aggregated view of the order book for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedBook {
    /// Highest resting bid price (unbucketed).
    pub best_bid: Option<Price>,
    /// Lowest resting ask price (unbucketed).
    pub best_ask: Option<Price>,
    pub long_book: BookSide,
    pub short_book: BookSide,
    /// Long orders, price-descending.
    pub long_orders: Vec<RestingOrder>,
    /// Short orders, price-ascending.
    pub short_orders: Vec<RestingOrder>,
}

impl AggregatedBook {
    /// Whether both sides have at least one resting order.
    pub fn is_two_sided(&self) -> bool {
        self.best_bid.is_some() && self.best_ask.is_some()
    }

    /// Whether the book has no resting orders at all.
    pub fn is_empty(&self) -> bool {
        self.best_bid.is_none() && self.best_ask.is_none()
    }

    /// Mid of best bid and best ask, if both exist.
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => Some(Price::midpoint(bid, ask)),
            _ => None,
        }
    }

    /// Reference price for quoting.
    ///
    /// Mid when two-sided, otherwise the oracle fallback, otherwise the only
    /// populated side. Fails with [`FeedError::EmptyBook`] only when both
    /// sides are empty and no fallback is given.
    pub fn reference_price(&self, oracle_fallback: Option<Price>) -> FeedResult<Price> {
        if let Some(mid) = self.mid_price() {
            return Ok(mid);
        }
        oracle_fallback
            .or(self.best_bid)
            .or(self.best_ask)
            .ok_or(FeedError::EmptyBook)
    }

    /// Count and total size of resting orders owned by `owner`, per side.
    pub fn owner_exposure(&self, owner: &str) -> OpenOrders {
        let mut open = OpenOrders::default();
        for resting in self.long_orders.iter().filter(|r| r.order.owner == owner) {
            open.bid_count += 1;
            open.bid_size += resting.order.base_amount;
        }
        for resting in self.short_orders.iter().filter(|r| r.order.owner == owner) {
            open.ask_count += 1;
            open.ask_size += resting.order.base_amount;
        }
        open
    }
}

// ============================================================================
// OrderBookAggregator
// ============================================================================

/// Buckets raw orders into tick-aligned books.
#[derive(Debug, Clone, Copy)]
pub struct OrderBookAggregator {
    tick_size: Price,
}

impl OrderBookAggregator {
    /// Create an aggregator. The tick size must be positive.
    pub fn new(tick_size: Price) -> FeedResult<Self> {
        if !tick_size.is_positive() {
            return Err(FeedError::InvalidTickSize(tick_size.to_string()));
        }
        Ok(Self { tick_size })
    }

    pub fn tick_size(&self) -> Price {
        self.tick_size
    }

    /// Aggregate a flat order list.
    ///
    /// `oracle_price` resolves oracle-pegged orders (zero limit price).
    /// Non-limit orders and orders with non-positive size or price are
    /// ignored.
    pub fn aggregate(&self, orders: &[RawOrder], oracle_price: Price) -> AggregatedBook {
        let mut longs = Vec::new();
        let mut shorts = Vec::new();
        let mut skipped = 0usize;

        for order in orders.iter().filter(|o| o.is_resting_limit()) {
            let price = order.effective_price(oracle_price);
            if !price.is_positive() || !order.base_amount.is_positive() {
                skipped += 1;
                continue;
            }
            let resting = RestingOrder {
                order: order.clone(),
                price,
            };
            match order.direction {
                Direction::Long => longs.push(resting),
                Direction::Short => shorts.push(resting),
            }
        }

        // Stable sorts keep input order among equal prices.
        longs.sort_by(|a, b| b.price.cmp(&a.price));
        shorts.sort_by(|a, b| a.price.cmp(&b.price));

        let long_book = self.build_side(Direction::Long, &longs);
        let short_book = self.build_side(Direction::Short, &shorts);

        let book = AggregatedBook {
            best_bid: longs.first().map(|r| r.price),
            best_ask: shorts.first().map(|r| r.price),
            long_book,
            short_book,
            long_orders: longs,
            short_orders: shorts,
        };

        debug!(
            input = orders.len(),
            skipped,
            bids = book.long_orders.len(),
            asks = book.short_orders.len(),
            best_bid = ?book.best_bid,
            best_ask = ?book.best_ask,
            "Aggregated order book"
        );

        book
    }

    /// Tick bucket for a price on the given side.
    pub fn bucket_price(&self, direction: Direction, price: Price) -> Price {
        match direction {
            Direction::Long => price.floor_to_tick(self.tick_size),
            Direction::Short => price.ceil_to_tick(self.tick_size),
        }
    }

    fn build_side(&self, direction: Direction, sorted: &[RestingOrder]) -> BookSide {
        if sorted.is_empty() {
            return BookSide::empty(direction);
        }

        let mut buckets: BTreeMap<Price, Size> = BTreeMap::new();
        for resting in sorted {
            *buckets
                .entry(self.bucket_price(direction, resting.price))
                .or_insert(Size::ZERO) += resting.order.base_amount;
        }

        let ordered: Box<dyn Iterator<Item = (Price, Size)>> = match direction {
            Direction::Long => Box::new(buckets.into_iter().rev()),
            Direction::Short => Box::new(buckets.into_iter()),
        };

        let mut cumulative = Size::ZERO;
        let levels = ordered
            .map(|(price, quantity)| {
                cumulative += quantity;
                PriceLevel {
                    price,
                    quantity,
                    cumulative_quantity: cumulative,
                }
            })
            .collect();

        BookSide { direction, levels }
    }
}
