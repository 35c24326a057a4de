//! # Domain Types
//!
//! Core domain types used throughout Brasa.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Ingredient    │   │    Product      │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  purchase pack  │◄──│  recipe lines   │◄──│  order items    │       │
//! │  │  yield percent  │   │  current price  │   │  status         │       │
//! │  │  current stock  │   │  category       │   │  payment method │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   FixedCost     │   │  AppSettings    │   │CalculatedProduct│       │
//! │  │  rent, payroll  │   │  target margin  │   │ derived metrics │       │
//! │  │  (money/month)  │   │  tax & billing  │   │ NEVER persisted │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All entity ids are UUID v4 strings generated at the persistence
//! boundary; the core treats them as opaque.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::units::Unit;
use crate::DEFAULT_YIELD_PERCENT;

// =============================================================================
// Ingredient
// =============================================================================

/// A purchasable raw material.
///
/// Bought in packages (`purchase_quantity` of `purchase_unit` for
/// `purchase_price`); consumed by recipes in any compatible unit.
///
/// ## Stock Representation
/// `current_stock` and `min_stock` are ALWAYS expressed in
/// `purchase_unit` - never in base units. One rule for the engine, the
/// database and the screens; deductions are converted into the purchase
/// unit before they are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Ingredient {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in catalogs and shopping lists.
    pub name: String,

    /// Unit the ingredient is bought in.
    pub purchase_unit: Unit,

    /// Size of the purchased package, in `purchase_unit`.
    #[ts(as = "String")]
    pub purchase_quantity: Decimal,

    /// Money paid for one package.
    #[ts(as = "String")]
    pub purchase_price: Money,

    /// Usable percentage after trimming/cooking loss, in (0, 100].
    /// `None` means 100 (everything purchased is usable).
    #[ts(as = "Option<String>")]
    pub yield_percent: Option<Decimal>,

    /// On-hand stock, in `purchase_unit`.
    #[ts(as = "String")]
    pub current_stock: Decimal,

    /// Alert threshold, in `purchase_unit`.
    #[ts(as = "String")]
    pub min_stock: Decimal,

    /// When the ingredient was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the ingredient was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    /// Creates an ingredient with empty stock and no declared yield loss.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        purchase_unit: Unit,
        purchase_quantity: Decimal,
        purchase_price: Money,
    ) -> Self {
        let now = Utc::now();
        Ingredient {
            id: id.into(),
            name: name.into(),
            purchase_unit,
            purchase_quantity,
            purchase_price,
            yield_percent: None,
            current_stock: Decimal::ZERO,
            min_stock: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// The usable fraction of a purchased package, as a factor in (0, 1].
    ///
    /// A missing yield means no loss (factor 1). A declared yield of 0 or
    /// less would otherwise become a divide-by-zero when costs are grossed
    /// up, so it is substituted with 1 (treat as no loss) - the record is
    /// malformed and validation rejects it at write time, but a stored one
    /// must not crash a bulk computation.
    pub fn yield_factor(&self) -> Decimal {
        let factor = self.yield_percent.unwrap_or(DEFAULT_YIELD_PERCENT) / Decimal::ONE_HUNDRED;
        if factor <= Decimal::ZERO {
            Decimal::ONE
        } else {
            factor
        }
    }

    /// Classifies the on-hand stock against the alert threshold.
    pub fn stock_status(&self) -> StockStatus {
        if self.current_stock <= Decimal::ZERO {
            StockStatus::Critical
        } else if self.current_stock <= self.min_stock {
            StockStatus::Low
        } else {
            StockStatus::Good
        }
    }

    /// Suggested purchase quantity: enough to reach 1.5x the minimum
    /// stock, in `purchase_unit`. Zero when stock is already comfortable.
    pub fn purchase_deficit(&self) -> Decimal {
        let target = self.min_stock * Decimal::new(15, 1);
        (target - self.current_stock).max(Decimal::ZERO)
    }
}

// =============================================================================
// Recipe & Product
// =============================================================================

/// One line of a product's bill-of-materials.
///
/// `unit_used` need not equal the ingredient's purchase unit, but must
/// share its dimension; a cross-dimension line (ingredient bought in kg,
/// recipe in un) contributes zero cost and zero deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeItem {
    /// Reference to an [`Ingredient`]. May dangle after a deletion; a
    /// dangling reference contributes nothing.
    pub ingredient_id: String,

    /// Net amount consumed per unit of product sold.
    #[ts(as = "String")]
    pub quantity_used: Decimal,

    /// Unit of `quantity_used`.
    pub unit_used: Unit,
}

/// A sellable menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the menu and on order items.
    pub name: String,

    /// Menu category ("Burgers", "Drinks", ...).
    pub category: String,

    /// Optional marketing copy for menus and delivery apps.
    pub description: Option<String>,

    /// Optional preparation instructions for the kitchen.
    pub preparation_method: Option<String>,

    /// Price currently charged.
    #[ts(as = "String")]
    pub current_price: Money,

    /// Bill of materials. Order is irrelevant to the cost math.
    pub recipe: Vec<RecipeItem>,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Copies every field except identity onto a fresh id.
    ///
    /// Backs the "duplicate product" action: the copy starts its own
    /// lifecycle (fresh timestamps) with the same recipe and price.
    pub fn duplicate(&self, new_id: impl Into<String>) -> Product {
        let now = Utc::now();
        Product {
            id: new_id.into(),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }
}

// =============================================================================
// Fixed Costs & Settings
// =============================================================================

/// A named recurring business expense (rent, utilities, payroll),
/// in money per month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FixedCost {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name ("Rent", "Payroll").
    pub name: String,

    /// Monthly amount.
    #[ts(as = "String")]
    pub amount: Money,
}

/// Tenant-wide business settings (singleton).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppSettings {
    /// Business display name.
    pub business_name: String,

    /// Desired net-profit percentage (0-100).
    #[ts(as = "String")]
    pub target_margin: Decimal,

    /// Card fees + taxes + incidental waste not captured by ingredient
    /// yield, as a percentage of revenue (0-100).
    #[ts(as = "String")]
    pub tax_and_loss_percent: Decimal,

    /// Estimated monthly revenue, used to spread fixed costs across
    /// products as a percentage of price.
    #[ts(as = "String")]
    pub estimated_monthly_billing: Money,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            business_name: String::new(),
            target_margin: Decimal::ZERO,
            tax_and_loss_percent: Decimal::ZERO,
            estimated_monthly_billing: Money::zero(),
        }
    }
}

// =============================================================================
// Calculated Product (derived, never persisted)
// =============================================================================

/// The three revenue-fraction components behind a suggested price,
/// re-expressed as 0-100 percentages for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostBreakdown {
    #[ts(as = "String")]
    pub fixed_cost_percent: Decimal,
    #[ts(as = "String")]
    pub variable_cost_percent: Decimal,
    #[ts(as = "String")]
    pub profit_percent: Decimal,
}

/// A [`Product`] plus everything the costing engine derives from it.
///
/// Recomputed on every read; NEVER stored. The sentinels are part of the
/// contract: `suggested_price` of 0 means "cannot price profitably under
/// current assumptions", `current_margin` of -100 means "unpriced /
/// total loss".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CalculatedProduct {
    /// The underlying product.
    pub product: Product,

    /// Cost of the resolvable recipe lines (CMV).
    #[ts(as = "String")]
    pub cost_ingredients: Money,

    /// Fixed-cost share absorbed at the current price.
    #[ts(as = "String")]
    pub cost_fixed: Money,

    /// Taxes/fees/waste share at the current price.
    #[ts(as = "String")]
    pub cost_variable: Money,

    /// `cost_ingredients + cost_fixed + cost_variable`.
    #[ts(as = "String")]
    pub total_cost: Money,

    /// Markup-divisor price, or 0 when pricing is infeasible.
    #[ts(as = "String")]
    pub suggested_price: Money,

    /// Net margin realized at the current price, in percent;
    /// exactly -100 when the product is unpriced.
    #[ts(as = "String")]
    pub current_margin: Decimal,

    /// Whether `current_margin` meets the configured target.
    pub is_profitable: bool,

    /// The percentage components used by the pricing formula.
    pub breakdown: CostBreakdown,
}

// =============================================================================
// Orders
// =============================================================================

/// Lifecycle of an order, as consumed by the stock deduction engine.
///
/// ```text
///   open ──────► completed   (terminal, deducts stock exactly once)
///     │
///     └────────► canceled    (terminal, never deducts)
/// ```
///
/// An order may also be born `completed` (walk-in counter sale), which
/// deducts immediately at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Completed,
    Canceled,
}

impl OrderStatus {
    /// Whether moving from `previous` (None for a freshly created order)
    /// to `next` is the edge that fires a stock deduction pass.
    ///
    /// Exactly one edge qualifies: into `completed` from anything that
    /// was not already `completed`. Re-saving a completed order is NOT a
    /// deduction edge - that double-deduction was a latent bug in earlier
    /// revisions of this product.
    pub fn deduction_due(previous: Option<OrderStatus>, next: OrderStatus) -> bool {
        next == OrderStatus::Completed && previous != Some(OrderStatus::Completed)
    }

    /// The wire tag (`open`, `completed`, `canceled`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// Terminal statuses accept no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Canceled)
    }
}

/// How a completed order was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Credit,
    Debit,
    Cash,
    Pix,
}

impl PaymentMethod {
    /// The wire tag (`credit`, `debit`, `cash`, `pix`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Credit => "credit",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Pix => "pix",
        }
    }
}

/// One line of an order.
///
/// ## Snapshot Pattern
/// `product_name` and `unit_price` are copied from the product at order
/// time, so history survives later edits to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    /// Reference to a [`Product`]. May dangle after a deletion; a
    /// dangling reference deducts nothing.
    pub product_id: String,

    /// Product name at order time.
    pub product_name: String,

    /// Units of the product sold.
    pub quantity: i64,

    /// Price per unit at order time.
    #[ts(as = "String")]
    pub unit_price: Money,

    /// Line total (`unit_price` x `quantity`).
    #[ts(as = "String")]
    pub total: Money,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// `None` for a walk-in counter sale.
    pub customer_id: Option<String>,

    /// Line items.
    pub items: Vec<OrderItem>,

    /// Sum of the line totals.
    #[ts(as = "String")]
    pub total_amount: Money,

    /// How the order was (or will be) paid.
    pub payment_method: PaymentMethod,

    /// Current lifecycle status.
    pub status: OrderStatus,

    /// When the order was placed.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the order reached `completed`, if it has.
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Customers
// =============================================================================

/// A known customer with running spend statistics.
///
/// `total_spent` and `last_order_date` are maintained by the order flow
/// whenever one of the customer's orders completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Digits only, for messaging links.
    pub phone: String,

    /// Optional marketing email.
    pub email: Option<String>,

    /// Optional delivery address.
    pub address: Option<String>,

    /// Free-form notes ("no onions").
    pub notes: Option<String>,

    /// Lifetime value: sum of completed order totals.
    #[ts(as = "String")]
    pub total_spent: Money,

    /// When the customer last completed an order.
    #[ts(as = "Option<String>")]
    pub last_order_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Stock
// =============================================================================

/// Traffic-light classification of an ingredient's on-hand stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    /// Depleted (stock at or below zero).
    Critical,
    /// At or below the alert threshold.
    Low,
    /// Above the alert threshold.
    Good,
}

/// A manual stock change from the inventory screen.
///
/// The degenerate cousin of an order deduction: same clamped update
/// contract, driven by a person instead of a recipe walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockAdjustment {
    /// Overwrite the stock level (physical recount).
    Set(Decimal),
    /// Add a received delivery (may be negative for a correction).
    Receive(Decimal),
}

// =============================================================================
// Unit Tests
// =============================================================================
