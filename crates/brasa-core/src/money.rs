//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Exact Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Costing math makes it worse than a till ever would:                   │
//! │    R$ 38.90 for 1 kg at 95% yield = R$ 0.04094736.../g                 │
//! │    ...which then gets multiplied by 200 g and summed over a recipe.    │
//! │                                                                         │
//! │  Integer cents cannot hold a per-gram price. Binary floats drift.      │
//! │  OUR SOLUTION: rust_decimal - exact base-10 arithmetic with enough     │
//! │  precision for intermediate unit prices, rounded only at the edge.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use brasa_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let price = Money::new(Decimal::new(1099, 2)); // R$ 10.99
//!
//! // Arithmetic operations
//! let doubled = price * Decimal::TWO;            // R$ 21.98
//! let total = price + Money::new(Decimal::new(500, 2)); // R$ 15.99
//! assert_eq!(total.to_string(), "R$ 15.99");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the tenant's currency.
///
/// ## Design Decisions
/// - **Decimal (signed)**: Allows negative values for losses and refunds
/// - **Single field tuple struct**: Zero-cost abstraction over `Decimal`
/// - **Transparent serde**: Serializes as the bare decimal string
///
/// Intermediate results (per-gram prices, overhead allocations) keep full
/// precision; [`Money::rounded`] trims to 2 decimal places for display
/// and persistence of final amounts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a Money value from a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns the amount rounded to 2 decimal places.
    ///
    /// Uses banker's rounding (round half to even), which avoids the
    /// systematic upward bias of always-round-half-up across many
    /// transactions.
    #[inline]
    pub fn rounded(&self) -> Decimal {
        self.0.round_dp(2)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns `rate`% of this amount.
    ///
    /// ## Example
    /// ```rust
    /// use brasa_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let price = Money::new(Decimal::from(30));
    /// assert_eq!(price.percent(Decimal::TEN).amount(), Decimal::from(3));
    /// ```
    pub fn percent(&self, rate: Decimal) -> Money {
        Money(self.0 * rate / Decimal::ONE_HUNDRED)
    }

    /// Returns the larger of this amount and zero.
    ///
    /// Used where a computed amount must not go negative (clamped stock
    /// valuations, deficits).
    pub fn clamp_at_zero(&self) -> Money {
        Money(self.0.max(Decimal::ZERO))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. Use frontend formatting for actual UI
/// display to handle localization properly (pt-BR uses `R$ 10,99`).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // round first so the precision specifier only pads, never re-rounds
        write!(f, "R$ {:.2}", self.rounded())
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Scaling by a quantity or a fraction.
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Decimal) -> Self {
        Money(self.0 * factor)
    }
}

/// Division by a quantity or a divisor.
///
/// Panics on a zero divisor, like `Decimal` itself; every call site in
/// this crate sits behind a sentinel guard (zero package quantity, the
/// minimum pricing divisor, zero current price).
impl Div<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn div(self, divisor: Decimal) -> Self {
        Money(self.0 / divisor)
    }
}

/// Summing an iterator of Money values.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
