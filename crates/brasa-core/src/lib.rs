//! # brasa-core: Pure Business Logic for Brasa
//!
//! This crate is the **heart** of Brasa, a restaurant back-office product
//! (menu costing, inventory, orders). It contains all business logic as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Brasa Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     Frontend (React SPA)                        │   │
//! │  │   Products UI ──► Inventory UI ──► Orders UI ──► Dashboard     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON (generated TS bindings)           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ brasa-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   units   │  │  costing  │  │   stock   │  │ validation│  │   │
//! │  │   │   Unit    │  │  pricing  │  │ deduction │  │   rules   │  │   │
//! │  │   │ Dimension │  │  margins  │  │  adjust   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    brasa-db (Database Layer)                    │   │
//! │  │             SQLite queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Ingredient, Product, Order, etc.)
//! - [`units`] - Closed set of purchase/recipe units with base conversion
//! - [`money`] - Money type backed by exact decimal arithmetic
//! - [`costing`] - Ingredient costing and product pricing/margins
//! - [`stock`] - Stock deduction on order fulfillment, stock adjustments
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Exact Decimals**: Money and quantities are `rust_decimal::Decimal`,
//!    never floats - a per-gram price must survive being multiplied back up
//! 4. **Sentinels over panics**: A malformed record yields a safe value
//!    (cost 0, margin -100%) so one bad row cannot crash a bulk computation
//!
//! ## Example Usage
//!
//! ```rust
//! use brasa_core::costing::ingredient_cost;
//! use brasa_core::money::Money;
//! use brasa_core::types::Ingredient;
//! use brasa_core::units::Unit;
//! use rust_decimal::Decimal;
//!
//! // 1 kg of flour bought for R$ 10, no trim loss
//! let flour = Ingredient::new(
//!     "ing-1",
//!     "Flour",
//!     Unit::Kilogram,
//!     Decimal::ONE,
//!     Money::new(Decimal::TEN),
//! );
//!
//! // A recipe line using 500 g costs R$ 5
//! let cost = ingredient_cost(&flour, Decimal::from(500), Unit::Gram);
//! assert_eq!(cost.amount(), Decimal::from(5));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod error;
pub mod money;
pub mod stock;
pub mod types;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use brasa_core::Money` instead of
// `use brasa_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;
pub use units::{Dimension, Unit};

use rust_decimal::Decimal;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Smallest pricing divisor the markup-divisor method will accept.
///
/// ## Business Reason
/// The suggested price is `ingredient cost / (1 - deductions)`. Once
/// deductions eat ~99% of revenue the formula explodes towards infinity,
/// so anything at or below this threshold reports a suggested price of 0,
/// meaning "cannot price profitably under current assumptions".
pub const MIN_PRICING_DIVISOR: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// Yield percentage assumed when an ingredient does not declare one.
///
/// A missing yield means "everything purchased is usable".
pub const DEFAULT_YIELD_PERCENT: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Maximum line items allowed on a single order.
///
/// ## Business Reason
/// Prevents runaway orders and ensures reasonable transaction sizes.
/// Can be made configurable per-tenant in future versions.
pub const MAX_ORDER_ITEMS: usize = 100;
