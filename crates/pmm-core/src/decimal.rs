//! Precision-safe decimal types for quoting.
//!
//! Uses `rust_decimal` for exact decimal arithmetic so that tick bucketing
//! and ladder weights never pick up binary floating-point drift.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Price (or signed price offset) with exact decimal precision.
///
/// Wraps `Decimal` to prevent mixing prices with base-asset sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round down to the tick boundary at or below this price.
    #[inline]
    pub fn floor_to_tick(&self, tick_size: Price) -> Self {
        if tick_size.is_zero() {
            return *self;
        }
        Self((self.0 / tick_size.0).floor() * tick_size.0)
    }

    /// Round up to the tick boundary at or above this price.
    #[inline]
    pub fn ceil_to_tick(&self, tick_size: Price) -> Self {
        if tick_size.is_zero() {
            return *self;
        }
        Self((self.0 / tick_size.0).ceil() * tick_size.0)
    }

    /// Midpoint between two prices.
    #[inline]
    pub fn midpoint(a: Price, b: Price) -> Self {
        Self((a.0 + b.0) / Decimal::TWO)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Price {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Price {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

/// Base-asset quantity with exact decimal precision.
///
/// Signed: account positions are negative when short. Order and level
/// quantities are always non-negative.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    #[inline]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Calculate notional value: size * price.
    #[inline]
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Size {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Size {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Size {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Size {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}
