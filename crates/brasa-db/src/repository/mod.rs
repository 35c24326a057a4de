//! # Repository Module
//!
//! Database repository implementations for Brasa.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  API handler                                                           │
//! │       │                                                                 │
//! │       │  db.orders().complete("ord-1")                                 │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── insert(&self, order)        ← validates, may deduct at birth      │
//! │  ├── complete(&self, id)         ← status-gated deduction pass         │
//! │  └── cancel(&self, id)           ← terminal, never deducts             │
//! │       │                                                                 │
//! │       │  SQL inside one transaction                                     │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Business rules stay in brasa-core, SQL stays here                   │
//! │  • Easy to test against an in-memory database                          │
//! │  • The stock atomicity/idempotence contract lives in one place         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ingredient::IngredientRepository`] - Ingredient CRUD, stock adjustments
//! - [`product::ProductRepository`] - Product CRUD with recipe lines
//! - [`fixed_cost::FixedCostRepository`] - Fixed cost CRUD and totals
//! - [`settings::SettingsRepository`] - Tenant settings singleton
//! - [`customer::CustomerRepository`] - Customer CRUD and spend stats
//! - [`order::OrderRepository`] - Orders and the stock-deduction trigger
//!
//! ## Column Decoding
//!
//! Money, quantities and percentages live in TEXT columns holding exact
//! decimal literals; units and statuses live in TEXT columns holding
//! their closed tag sets. The helpers below turn a stored value back
//! into its domain type, surfacing a [`DbError::Decode`] when a row was
//! written around the application.

use std::str::FromStr;

use rust_decimal::Decimal;

use brasa_core::{Money, OrderStatus, PaymentMethod, Unit};

use crate::error::{DbError, DbResult};

pub mod customer;
pub mod fixed_cost;
pub mod ingredient;
pub mod order;
pub mod product;
pub mod settings;

// =============================================================================
// Decode Helpers
// =============================================================================

/// Parses a TEXT decimal column.
pub(crate) fn decode_decimal(column: &str, value: &str) -> DbResult<Decimal> {
    Decimal::from_str(value).map_err(|e| DbError::decode(column, e.to_string()))
}

/// Parses a TEXT money column.
pub(crate) fn decode_money(column: &str, value: &str) -> DbResult<Money> {
    decode_decimal(column, value).map(Money::new)
}

/// Parses a nullable TEXT decimal column.
pub(crate) fn decode_optional_decimal(
    column: &str,
    value: Option<&str>,
) -> DbResult<Option<Decimal>> {
    value.map(|v| decode_decimal(column, v)).transpose()
}

/// Parses a unit tag column.
pub(crate) fn decode_unit(column: &str, value: &str) -> DbResult<Unit> {
    Unit::from_str(value).map_err(|e| DbError::decode(column, e.to_string()))
}

/// Parses an order status tag column.
pub(crate) fn decode_status(column: &str, value: &str) -> DbResult<OrderStatus> {
    match value {
        "open" => Ok(OrderStatus::Open),
        "completed" => Ok(OrderStatus::Completed),
        "canceled" => Ok(OrderStatus::Canceled),
        other => Err(DbError::decode(column, format!("unknown status '{other}'"))),
    }
}

/// Parses a payment method tag column.
pub(crate) fn decode_payment_method(column: &str, value: &str) -> DbResult<PaymentMethod> {
    match value {
        "credit" => Ok(PaymentMethod::Credit),
        "debit" => Ok(PaymentMethod::Debit),
        "cash" => Ok(PaymentMethod::Cash),
        "pix" => Ok(PaymentMethod::Pix),
        other => Err(DbError::decode(
            column,
            format!("unknown payment method '{other}'"),
        )),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
