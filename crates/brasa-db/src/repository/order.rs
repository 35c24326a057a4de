//! # Order Repository
//!
//! Database operations for orders - and the one place in the system
//! where stock actually moves.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── insert() → Order { status: Open }                              │
//! │     └── insert() → Order { status: Completed }  (walk-in counter sale) │
//! │                     └── runs the deduction pass at birth               │
//! │                                                                         │
//! │  2. COMPLETE                                                           │
//! │     └── complete() → UPDATE … WHERE status = 'open'                    │
//! │         ├── 1 row:  the open→completed edge → ONE deduction pass       │
//! │         └── 0 rows: wrong edge → error, stock untouched                │
//! │                                                                         │
//! │  3. (OR) CANCEL                                                        │
//! │     └── cancel() → terminal, never deducts                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why the Status-Gated UPDATE Matters
//! Re-saving a completed order used to re-trigger the deduction in
//! earlier revisions of this product - every save silently ate stock.
//! Gating the flip on `status = 'open'` and checking `rows_affected`
//! makes the deduction edge a database-enforced one-shot, even with
//! concurrent callers.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use brasa_core::stock::{self, StockUpdate};
use brasa_core::validation::validate_order;
use brasa_core::{CoreError, Order, OrderItem, OrderStatus};

use crate::error::{DbError, DbResult};
use crate::repository::{
    customer, decode_money, decode_payment_method, decode_status, ingredient, product,
};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    customer_id: Option<String>,
    total_amount: String,
    payment_method: String,
    status: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: String,
    product_id: String,
    product_name: String,
    quantity: i64,
    unit_price: String,
    total: String,
}

impl OrderRow {
    fn into_domain(self, items: Vec<OrderItem>) -> DbResult<Order> {
        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            items,
            total_amount: decode_money("total_amount", &self.total_amount)?,
            payment_method: decode_payment_method("payment_method", &self.payment_method)?,
            status: decode_status("status", &self.status)?,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

impl OrderItemRow {
    fn into_domain(self) -> DbResult<OrderItem> {
        Ok(OrderItem {
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            unit_price: decode_money("unit_price", &self.unit_price)?,
            total: decode_money("total", &self.total)?,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, customer_id, total_amount, payment_method, \
     status, created_at, completed_at FROM orders";

const SELECT_ITEM_COLUMNS: &str = "SELECT order_id, product_id, product_name, quantity, \
     unit_price, total FROM order_items";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts a new order with its items.
    ///
    /// An order born `completed` (counter sale) runs its deduction pass
    /// immediately, inside the same transaction as the insert; an `open`
    /// order touches no stock until [`OrderRepository::complete`].
    ///
    /// ## Returns
    /// The stock updates applied (empty for an open order).
    pub async fn insert(&self, order: &Order) -> DbResult<Vec<StockUpdate>> {
        validate_order(order).map_err(|e| DbError::Domain(CoreError::from(e)))?;

        debug!(id = %order.id, status = order.status.as_str(), "Inserting order");

        let born_completed = OrderStatus::deduction_due(None, order.status);
        let completed_at = if order.status == OrderStatus::Completed {
            order.completed_at.or_else(|| Some(Utc::now()))
        } else {
            None
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, customer_id, total_amount, payment_method, status,
                created_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&order.id)
        .bind(&order.customer_id)
        .bind(order.total_amount.amount().to_string())
        .bind(order.payment_method.as_str())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(completed_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, position, product_id, product_name,
                    quantity, unit_price, total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&order.id)
            .bind(position as i64)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price.amount().to_string())
            .bind(item.total.amount().to_string())
            .execute(&mut *tx)
            .await?;
        }

        let updates = if born_completed {
            let updates = run_deduction_pass(&mut tx, &order.items).await?;
            if let Some(customer_id) = &order.customer_id {
                customer::record_order(
                    &mut tx,
                    customer_id,
                    order.total_amount,
                    completed_at.unwrap_or(order.created_at),
                )
                .await?;
            }
            updates
        } else {
            Vec::new()
        };

        tx.commit().await?;

        if born_completed {
            info!(id = %order.id, deductions = updates.len(), "Order completed at creation");
        }
        Ok(updates)
    }

    /// Gets an order (with items) by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as::<_, OrderRow>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        let items = fetch_items(&mut conn, id).await?;
        row.into_domain(items).map(Some)
    }

    /// Lists all orders with their items, newest first.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> =
            sqlx::query_as::<_, OrderRow>(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC"))
                .fetch_all(&self.pool)
                .await?;

        let item_rows: Vec<OrderItemRow> = sqlx::query_as::<_, OrderItemRow>(&format!(
            "{SELECT_ITEM_COLUMNS} ORDER BY order_id, position"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            let order_id = row.order_id.clone();
            items.entry(order_id).or_default().push(row.into_domain()?);
        }

        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_domain(order_items)
            })
            .collect()
    }

    /// Completes an open order and runs its stock-deduction pass, all in
    /// one transaction.
    ///
    /// ## Idempotence
    /// The status flip is gated on `status = 'open'`. Zero affected rows
    /// means this call is NOT the open→completed edge - the order is
    /// missing, already completed, or canceled - and no stock moves.
    ///
    /// ## Returns
    /// The stock updates applied on the qualifying edge.
    pub async fn complete(&self, id: &str) -> DbResult<Vec<StockUpdate>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE orders SET status = 'completed', completed_at = ?2 \
             WHERE id = ?1 AND status = 'open'",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(wrong_edge(&mut tx, id).await);
        }

        let (customer_id, total_amount): (Option<String>, String) =
            sqlx::query_as("SELECT customer_id, total_amount FROM orders WHERE id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        let items = fetch_items(&mut tx, id).await?;
        let updates = run_deduction_pass(&mut tx, &items).await?;

        if let Some(customer_id) = customer_id {
            let total = decode_money("total_amount", &total_amount)?;
            customer::record_order(&mut tx, &customer_id, total, now).await?;
        }

        tx.commit().await?;

        info!(id = %id, deductions = updates.len(), "Order completed");
        Ok(updates)
    }

    /// Cancels an open order. Terminal; never touches stock.
    pub async fn cancel(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("UPDATE orders SET status = 'canceled' WHERE id = ?1 AND status = 'open'")
                .bind(id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(wrong_edge(&mut tx, id).await);
        }

        tx.commit().await?;

        info!(id = %id, "Order canceled");
        Ok(())
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================

/// Distinguishes "order missing" from "order in a terminal status" after
/// a gated UPDATE affected zero rows.
async fn wrong_edge(conn: &mut SqliteConnection, id: &str) -> DbError {
    let status: Result<Option<String>, _> =
        sqlx::query_scalar("SELECT status FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await;

    match status {
        Ok(None) => DbError::not_found("Order", id),
        Ok(Some(current_status)) => DbError::Domain(CoreError::InvalidOrderStatus {
            order_id: id.to_string(),
            current_status,
        }),
        Err(e) => e.into(),
    }
}

/// Loads one order's items on an existing connection.
async fn fetch_items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderItem>> {
    let rows: Vec<OrderItemRow> = sqlx::query_as::<_, OrderItemRow>(&format!(
        "{SELECT_ITEM_COLUMNS} WHERE order_id = ?1 ORDER BY position"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(OrderItemRow::into_domain).collect()
}

/// Walks the order's items through the pure deduction engine against the
/// current catalogs and persists the clamped stock levels, all on the
/// caller's transaction.
async fn run_deduction_pass(
    conn: &mut SqliteConnection,
    items: &[OrderItem],
) -> DbResult<Vec<StockUpdate>> {
    let products = product::fetch_all(&mut *conn).await?;
    let ingredients = ingredient::fetch_all(&mut *conn).await?;

    let deductions = stock::deductions_for_items(items, &products, &ingredients);
    let updates = stock::apply_deductions(&ingredients, &deductions);

    ingredient::write_stock_updates(&mut *conn, &updates).await?;
    Ok(updates)
}

/// Generates a new order ID.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::generate_customer_id;
    use crate::repository::ingredient::generate_ingredient_id;
    use crate::repository::product::generate_product_id;
    use brasa_core::{Customer, Ingredient, Money, PaymentMethod, Product, RecipeItem, Unit};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    async fn database() -> Database {
        // log output for `cargo test -- --nocapture`, RUST_LOG-filterable
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Seeds beef (1 kg package, 95% yield, 4.5 kg on hand) and a burger
    /// using 100 g of it; returns (ingredient_id, product_id).
    async fn seed_catalog(db: &Database) -> (String, String) {
        let mut beef = Ingredient::new(
            generate_ingredient_id(),
            "Ground beef",
            Unit::Kilogram,
            dec!(1),
            Money::new(dec!(38.90)),
        );
        beef.yield_percent = Some(dec!(95));
        beef.current_stock = dec!(4.5);
        db.ingredients().insert(&beef).await.unwrap();

        let now = Utc::now();
        let burger = Product {
            id: generate_product_id(),
            name: "Burger".to_string(),
            category: "Food".to_string(),
            description: None,
            preparation_method: None,
            current_price: Money::new(dec!(30)),
            recipe: vec![RecipeItem {
                ingredient_id: beef.id.clone(),
                quantity_used: dec!(100),
                unit_used: Unit::Gram,
            }],
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&burger).await.unwrap();

        (beef.id, burger.id)
    }

    fn order_for(product_id: &str, quantity: i64, status: OrderStatus) -> Order {
        let unit_price = Money::new(dec!(30));
        let total = unit_price * Decimal::from(quantity);
        Order {
            id: generate_order_id(),
            customer_id: None,
            items: vec![OrderItem {
                product_id: product_id.to_string(),
                product_name: "Burger".to_string(),
                quantity,
                unit_price,
                total,
            }],
            total_amount: total,
            payment_method: PaymentMethod::Cash,
            status,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn assert_close(actual: Decimal, expected: Decimal) {
        assert!(
            (actual - expected).abs() < dec!(0.0001),
            "expected {expected}, got {actual}"
        );
    }

    #[tokio::test]
    async fn test_open_order_does_not_touch_stock() {
        let db = database().await;
        let (beef_id, burger_id) = seed_catalog(&db).await;

        let order = order_for(&burger_id, 2, OrderStatus::Open);
        let updates = db.orders().insert(&order).await.unwrap();
        assert!(updates.is_empty());

        let beef = db.ingredients().get_by_id(&beef_id).await.unwrap().unwrap();
        assert_eq!(beef.current_stock, dec!(4.5));

        let loaded = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Open);
        assert_eq!(loaded.completed_at, None);
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.total_amount, Money::new(dec!(60)));
    }

    #[tokio::test]
    async fn test_complete_deducts_with_conversion_and_yield() {
        let db = database().await;
        let (beef_id, burger_id) = seed_catalog(&db).await;

        let order = order_for(&burger_id, 2, OrderStatus::Open);
        db.orders().insert(&order).await.unwrap();

        let updates = db.orders().complete(&order.id).await.unwrap();
        assert_eq!(updates.len(), 1);

        // (100 g × 2) → 0.2 kg, grossed up by 95% yield ≈ 0.2105 kg
        let expected_stock = dec!(4.5) - dec!(0.2) / dec!(0.95);
        assert_close(updates[0].new_stock, expected_stock);

        let beef = db.ingredients().get_by_id(&beef_id).await.unwrap().unwrap();
        assert_close(beef.current_stock, expected_stock);

        let loaded = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Completed);
        assert!(loaded.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_completing_twice_deducts_once() {
        let db = database().await;
        let (beef_id, burger_id) = seed_catalog(&db).await;

        let order = order_for(&burger_id, 2, OrderStatus::Open);
        db.orders().insert(&order).await.unwrap();
        db.orders().complete(&order.id).await.unwrap();

        let stock_after_first = db
            .ingredients()
            .get_by_id(&beef_id)
            .await
            .unwrap()
            .unwrap()
            .current_stock;

        // the second completion is the wrong edge: error, stock untouched
        let err = db.orders().complete(&order.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidOrderStatus { .. })
        ));

        let stock_after_second = db
            .ingredients()
            .get_by_id(&beef_id)
            .await
            .unwrap()
            .unwrap()
            .current_stock;
        assert_eq!(stock_after_first, stock_after_second);
    }

    #[tokio::test]
    async fn test_born_completed_order_deducts_at_insert() {
        let db = database().await;
        let (beef_id, burger_id) = seed_catalog(&db).await;

        let order = order_for(&burger_id, 2, OrderStatus::Completed);
        let updates = db.orders().insert(&order).await.unwrap();
        assert_eq!(updates.len(), 1);

        let beef = db.ingredients().get_by_id(&beef_id).await.unwrap().unwrap();
        assert_close(beef.current_stock, dec!(4.5) - dec!(0.2) / dec!(0.95));

        let loaded = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Completed);
        assert!(loaded.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_cancel_never_deducts_and_is_terminal() {
        let db = database().await;
        let (beef_id, burger_id) = seed_catalog(&db).await;

        let order = order_for(&burger_id, 2, OrderStatus::Open);
        db.orders().insert(&order).await.unwrap();
        db.orders().cancel(&order.id).await.unwrap();

        let beef = db.ingredients().get_by_id(&beef_id).await.unwrap().unwrap();
        assert_eq!(beef.current_stock, dec!(4.5));

        // canceled is terminal: completing it is the wrong edge
        assert!(matches!(
            db.orders().complete(&order.id).await,
            Err(DbError::Domain(CoreError::InvalidOrderStatus { .. }))
        ));
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let db = database().await;
        assert!(matches!(
            db.orders().complete("ghost").await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.orders().cancel("ghost").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_dangling_product_reference_still_completes() {
        let db = database().await;
        let (beef_id, _) = seed_catalog(&db).await;

        // order references a product that no longer exists
        let order = order_for("deleted-product", 3, OrderStatus::Open);
        db.orders().insert(&order).await.unwrap();
        let updates = db.orders().complete(&order.id).await.unwrap();

        assert!(updates.is_empty());
        let beef = db.ingredients().get_by_id(&beef_id).await.unwrap().unwrap();
        assert_eq!(beef.current_stock, dec!(4.5));
    }

    #[tokio::test]
    async fn test_completion_records_customer_spend() {
        let db = database().await;
        let (_, burger_id) = seed_catalog(&db).await;

        let customer = Customer {
            id: generate_customer_id(),
            name: "Ana".to_string(),
            phone: "5511999990000".to_string(),
            email: None,
            address: None,
            notes: None,
            total_spent: Money::zero(),
            last_order_date: None,
        };
        db.customers().insert(&customer).await.unwrap();

        let mut order = order_for(&burger_id, 2, OrderStatus::Open);
        order.customer_id = Some(customer.id.clone());
        db.orders().insert(&order).await.unwrap();
        db.orders().complete(&order.id).await.unwrap();

        let loaded = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(loaded.total_spent, Money::new(dec!(60)));
        assert!(loaded.last_order_date.is_some());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = database().await;
        let (_, burger_id) = seed_catalog(&db).await;

        let mut first = order_for(&burger_id, 1, OrderStatus::Open);
        first.created_at = Utc::now() - chrono::Duration::minutes(5);
        let second = order_for(&burger_id, 2, OrderStatus::Open);

        db.orders().insert(&first).await.unwrap();
        db.orders().insert(&second).await.unwrap();

        let all = db.orders().list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
        assert!(all.iter().all(|o| o.items.len() == 1));
    }
}
