//! Shared fixtures for integration tests.

pub mod mock_source;

use pmm_core::{AccountSnapshot, Direction, OrderKind, Price, RawOrder, Size};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use pmm_bot::{AppConfig, MarketData};

pub const MAKER: &str = "maker";

pub fn order(id: u64, owner: &str, direction: Direction, price: Decimal) -> RawOrder {
    RawOrder {
        id,
        direction,
        kind: OrderKind::Limit,
        limit_price: Price::new(price),
        base_amount: Size::new(dec!(1)),
        oracle_price_offset: Price::ZERO,
        owner: owner.to_string(),
    }
}

/// Two levels per side around an oracle of 100.
pub fn two_sided_orders() -> Vec<RawOrder> {
    vec![
        order(1, "other", Direction::Long, dec!(99.9)),
        order(2, "other", Direction::Long, dec!(99.7)),
        order(3, "other", Direction::Short, dec!(100.3)),
        order(4, "other", Direction::Short, dec!(100.5)),
    ]
}

pub fn account(position: Decimal, leverage: Decimal) -> AccountSnapshot {
    AccountSnapshot {
        position_size: Size::new(position),
        leverage,
        total_collateral: dec!(100),
        ..AccountSnapshot::default()
    }
}

pub fn market() -> MarketData {
    MarketData {
        oracle_price: Price::new(dec!(100)),
        funding_rate: dec!(0.001),
    }
}

/// Short deadlines so timeout tests finish quickly.
pub fn fast_config() -> AppConfig {
    AppConfig {
        cycle_period_ms: 200,
        fetch_timeout_ms: 50,
        submit_timeout_ms: 50,
        ..AppConfig::default()
    }
}
