//! # Stock Module
//!
//! Stock deduction on order fulfillment, and the manual stock
//! adjustments from the inventory screen.
//!
//! ## Deduction Walk
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Order Fulfillment Deduction                         │
//! │                                                                         │
//! │  OrderItem (2x Burger)                                                 │
//! │       │                                                                 │
//! │       ▼ resolve product                                                 │
//! │  Product "Burger" ── recipe ──► 100 g ground beef                      │
//! │       │                         1 un brioche bun                       │
//! │       ▼ per recipe line                                                 │
//! │  raw = quantity_used × order quantity          (200 g, 2 un)           │
//! │  convert recipe unit → purchase unit           (0.2 kg, 2 un)          │
//! │  gross up by yield                             (0.2/0.95 ≈ 0.2105 kg)  │
//! │       │                                                                 │
//! │       ▼ accumulate per ingredient (shared across products/items)       │
//! │  deduction map ──► new_stock = max(0, current − deduction)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure: the functions take catalogs in and hand a
//! list of updates back. Applying those updates atomically - and making
//! sure the pass runs exactly once per completion edge - is the storage
//! layer's contract (see brasa-db's order repository).

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::types::{Ingredient, OrderItem, Product, StockAdjustment};

// =============================================================================
// Deduction Types
// =============================================================================

/// Gross raw-material consumption of one ingredient, in that
/// ingredient's purchase unit.
#[derive(Debug, Clone, PartialEq)]
pub struct StockDeduction {
    pub ingredient_id: String,
    pub gross_quantity: Decimal,
}

/// The clamped stock level an ingredient should be persisted with.
#[derive(Debug, Clone, PartialEq)]
pub struct StockUpdate {
    pub ingredient_id: String,
    pub new_stock: Decimal,
}

// =============================================================================
// Deduction Engine
// =============================================================================

/// Computes the gross per-ingredient raw-material consumption implied by
/// a fulfilled order's line items.
///
/// ## Algorithm
/// For every order item, resolve its product; for every recipe line,
/// resolve the ingredient; then:
/// 1. `raw = quantity_used × order quantity`
/// 2. Convert from the recipe unit into the ingredient's purchase unit
///    (g→kg and ml→l divide by 1000, the inverses multiply; equal units
///    pass through; cross-dimension pairs contribute zero)
/// 3. Gross up by the yield factor - the purchased, pre-trim quantity
///    consumed is larger than the net recipe amount whenever yield < 100%
/// 4. Accumulate per ingredient across all items and products
///
/// ## Failure Semantics
/// An item referencing an unknown product, or a recipe line referencing
/// an unknown ingredient, is skipped silently; the rest of the order
/// still deducts. No partial-failure abort.
///
/// Output is sorted by ingredient id (deterministic for tests and logs).
pub fn deductions_for_items(
    items: &[OrderItem],
    products: &[Product],
    ingredients: &[Ingredient],
) -> Vec<StockDeduction> {
    let mut accumulator: BTreeMap<String, Decimal> = BTreeMap::new();

    for item in items {
        let Some(product) = products.iter().find(|p| p.id == item.product_id) else {
            continue;
        };

        for recipe_item in &product.recipe {
            let Some(ingredient) = ingredients
                .iter()
                .find(|ing| ing.id == recipe_item.ingredient_id)
            else {
                continue;
            };

            let raw_quantity = recipe_item.quantity_used * Decimal::from(item.quantity);

            // Cross-dimension lines contribute zero by policy.
            let Some(in_purchase_units) = recipe_item
                .unit_used
                .convert(raw_quantity, ingredient.purchase_unit)
            else {
                continue;
            };

            let gross_quantity = in_purchase_units / ingredient.yield_factor();

            *accumulator
                .entry(ingredient.id.clone())
                .or_insert(Decimal::ZERO) += gross_quantity;
        }
    }

    accumulator
        .into_iter()
        .map(|(ingredient_id, gross_quantity)| StockDeduction {
            ingredient_id,
            gross_quantity,
        })
        .collect()
}

/// Resolves a deduction list against the ingredient catalog into clamped
/// stock updates: `new_stock = max(0, current − deduction)`.
///
/// Stock never goes negative - selling past the counted stock means the
/// count was wrong, and a negative number on the inventory screen helps
/// nobody. Deductions for unknown ingredients are dropped.
pub fn apply_deductions(
    ingredients: &[Ingredient],
    deductions: &[StockDeduction],
) -> Vec<StockUpdate> {
    deductions
        .iter()
        .filter_map(|deduction| {
            let ingredient = ingredients
                .iter()
                .find(|ing| ing.id == deduction.ingredient_id)?;

            Some(StockUpdate {
                ingredient_id: deduction.ingredient_id.clone(),
                new_stock: (ingredient.current_stock - deduction.gross_quantity)
                    .max(Decimal::ZERO),
            })
        })
        .collect()
}

/// Applies a manual adjustment from the inventory screen to a stock
/// level. Same clamp-at-zero contract as an order deduction.
pub fn adjust_stock(current: Decimal, adjustment: StockAdjustment) -> Decimal {
    match adjustment {
        StockAdjustment::Set(value) => value.max(Decimal::ZERO),
        StockAdjustment::Receive(delta) => (current + delta).max(Decimal::ZERO),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
