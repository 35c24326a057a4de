//! # Units Module
//!
//! The closed set of units an ingredient can be purchased or measured in,
//! and the conversion rules between them.
//!
//! ## Why a Closed Enum?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE STRINGLY-TYPED UNIT PROBLEM                                        │
//! │                                                                         │
//! │  With free-form unit strings, every call site compares literals:        │
//! │    if unit == "kg" { qty / 1000 } else if unit == "g" { ... }           │
//! │                                                                         │
//! │  A typo ("Kg", "kgs") silently falls through as "no conversion" and    │
//! │  costs come out 1000x wrong.                                           │
//! │                                                                         │
//! │  OUR SOLUTION: a closed enum, exhaustively matched.                    │
//! │  Unknown tags are rejected at the parse/deserialize boundary, so a     │
//! │  unit that reaches the math is always one of the five we know.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Base Units
//! Internally every quantity is normalized to the smallest unit of its
//! dimension before math happens:
//!
//! | Dimension | Units     | Base unit        |
//! |-----------|-----------|------------------|
//! | Mass      | kg, g     | gram             |
//! | Volume    | l, ml     | milliliter       |
//! | Count     | un        | unit (one piece) |
//!
//! Cross-dimension pairs (e.g. an ingredient bought by the kilogram used
//! "by the unit" in a recipe) are dimensionally nonsensical; conversion
//! returns `None` and callers treat the pairing as a zero contribution.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Dimension
// =============================================================================

/// The physical dimension a [`Unit`] measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Dimension {
    Mass,
    Volume,
    Count,
}

// =============================================================================
// Unit
// =============================================================================

/// A purchase or recipe unit.
///
/// Wire tags match what the frontend and the database store: `kg`, `g`,
/// `l`, `ml`, `un`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Unit {
    /// Kilogram (mass, 1000 g).
    #[serde(rename = "kg")]
    Kilogram,
    /// Gram (mass, base).
    #[serde(rename = "g")]
    Gram,
    /// Liter (volume, 1000 ml).
    #[serde(rename = "l")]
    Liter,
    /// Milliliter (volume, base).
    #[serde(rename = "ml")]
    Milliliter,
    /// Countable piece - a bun, a lettuce head, a can (count, base).
    #[serde(rename = "un")]
    Each,
}

impl Unit {
    /// All units, in display order.
    pub const ALL: [Unit; 5] = [
        Unit::Kilogram,
        Unit::Gram,
        Unit::Liter,
        Unit::Milliliter,
        Unit::Each,
    ];

    /// The dimension this unit measures.
    pub const fn dimension(&self) -> Dimension {
        match self {
            Unit::Kilogram | Unit::Gram => Dimension::Mass,
            Unit::Liter | Unit::Milliliter => Dimension::Volume,
            Unit::Each => Dimension::Count,
        }
    }

    /// How many base units (g / ml / un) one of this unit holds.
    pub const fn base_factor(&self) -> Decimal {
        match self {
            Unit::Kilogram | Unit::Liter => Decimal::ONE_THOUSAND,
            Unit::Gram | Unit::Milliliter | Unit::Each => Decimal::ONE,
        }
    }

    /// Normalizes a quantity in this unit to base units.
    ///
    /// ## Example
    /// ```rust
    /// use brasa_core::units::Unit;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Unit::Kilogram.to_base(Decimal::TWO), Decimal::from(2000));
    /// assert_eq!(Unit::Gram.to_base(Decimal::TWO), Decimal::TWO);
    /// ```
    pub fn to_base(&self, quantity: Decimal) -> Decimal {
        quantity * self.base_factor()
    }

    /// Converts a quantity in this unit to `target`, if the two units
    /// share a dimension.
    ///
    /// Generalizes the g→kg (÷1000) and kg→g (×1000) corrections through
    /// base factors, so every compatible pairing works, including the
    /// identity ones.
    ///
    /// ## Returns
    /// * `Some(converted)` - same dimension
    /// * `None` - cross-dimension pairing (kg vs un); callers must treat
    ///   this as a zero contribution, never as "no conversion"
    ///
    /// ## Example
    /// ```rust
    /// use brasa_core::units::Unit;
    /// use rust_decimal::Decimal;
    ///
    /// let grams = Decimal::from(200);
    /// assert_eq!(
    ///     Unit::Gram.convert(grams, Unit::Kilogram),
    ///     Some(Decimal::new(2, 1)) // 0.2 kg
    /// );
    /// assert_eq!(Unit::Gram.convert(grams, Unit::Each), None);
    /// ```
    pub fn convert(&self, quantity: Decimal, target: Unit) -> Option<Decimal> {
        if self.dimension() != target.dimension() {
            return None;
        }
        Some(quantity * self.base_factor() / target.base_factor())
    }

    /// Whether this unit can be combined with `other` in cost/stock math.
    pub fn is_compatible(&self, other: Unit) -> bool {
        self.dimension() == other.dimension()
    }

    /// The wire tag (`kg`, `g`, `l`, `ml`, `un`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Unit::Kilogram => "kg",
            Unit::Gram => "g",
            Unit::Liter => "l",
            Unit::Milliliter => "ml",
            Unit::Each => "un",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kg" => Ok(Unit::Kilogram),
            "g" => Ok(Unit::Gram),
            "l" => Ok(Unit::Liter),
            "ml" => Ok(Unit::Milliliter),
            "un" => Ok(Unit::Each),
            other => Err(ValidationError::InvalidFormat {
                field: "unit".to_string(),
                reason: format!("unknown unit tag '{other}'"),
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
