//! # Validation Module
//!
//! Business rule validation for records entering storage.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (called by the repositories before writes)       │
//! │  └── Business rule validation                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The costing/stock engines deliberately do NOT call these: a record
//! that slipped past validation (or predates it) is resolved to a safe
//! sentinel there, not an error. Validation exists so such records stop
//! being writable, not so they become unreadable.

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::types::{AppSettings, Ingredient, Order, Product};
use crate::MAX_ORDER_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted display name.
const MAX_NAME_LEN: usize = 200;

// =============================================================================
// Field Helpers
// =============================================================================

fn require_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

fn require_positive(field: &str, value: Decimal) -> ValidationResult<()> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn require_non_negative(field: &str, value: Decimal) -> ValidationResult<()> {
    if value < Decimal::ZERO {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn require_percent(field: &str, value: Decimal) -> ValidationResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates an ingredient before insert/update.
///
/// ## Rules
/// - Name present, at most 200 characters
/// - `purchase_quantity` strictly positive (the costing math divides by it)
/// - `purchase_price`, `current_stock`, `min_stock` non-negative
/// - `yield_percent`, when declared, in (0, 100] - a zero yield would
///   mean "nothing purchased is usable" and turns the gross-up into a
///   division by zero
pub fn validate_ingredient(ingredient: &Ingredient) -> ValidationResult<()> {
    require_name("name", &ingredient.name)?;
    require_positive("purchase_quantity", ingredient.purchase_quantity)?;
    require_non_negative("purchase_price", ingredient.purchase_price.amount())?;
    require_non_negative("current_stock", ingredient.current_stock)?;
    require_non_negative("min_stock", ingredient.min_stock)?;

    if let Some(yield_percent) = ingredient.yield_percent {
        if yield_percent <= Decimal::ZERO || yield_percent > Decimal::ONE_HUNDRED {
            return Err(ValidationError::OutOfRange {
                field: "yield_percent".to_string(),
                min: "0".to_string(),
                max: "100".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a product before insert/update.
///
/// ## Rules
/// - Name and category present
/// - `current_price` non-negative (zero is allowed: an unpriced product
///   shows a -100% margin rather than being rejected)
/// - Every recipe line uses a strictly positive quantity
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    require_name("name", &product.name)?;
    require_name("category", &product.category)?;
    require_non_negative("current_price", product.current_price.amount())?;

    for item in &product.recipe {
        require_positive("quantity_used", item.quantity_used)?;
    }

    Ok(())
}

/// Validates tenant settings before save.
pub fn validate_settings(settings: &AppSettings) -> ValidationResult<()> {
    require_percent("target_margin", settings.target_margin)?;
    require_percent("tax_and_loss_percent", settings.tax_and_loss_percent)?;
    require_non_negative(
        "estimated_monthly_billing",
        settings.estimated_monthly_billing.amount(),
    )?;
    Ok(())
}

/// Validates an order before insert.
///
/// ## Rules
/// - At least one item, at most [`MAX_ORDER_ITEMS`]
/// - Every item sells a strictly positive quantity
pub fn validate_order(order: &Order) -> ValidationResult<()> {
    if order.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if order.items.len() > MAX_ORDER_ITEMS {
        return Err(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_ORDER_ITEMS,
        });
    }

    for item in &order.items {
        if item.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
