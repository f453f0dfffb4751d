//! Order-book aggregation and wire-format parsing.
//!
//! Turns the flat list of resting orders from the decentralized limit order
//! book into sorted, tick-bucketed bid/ask books, and decodes the fixed-point
//! account and market records into engine snapshots.

pub mod book;
pub mod error;
pub mod parser;

pub use book::{AggregatedBook, BookSide, OrderBookAggregator, PriceLevel, RestingOrder};
pub use error::{FeedError, FeedResult};
pub use parser::{parse_account, parse_market, parse_orders, WireAccount, WireMarket, WireOrder};
