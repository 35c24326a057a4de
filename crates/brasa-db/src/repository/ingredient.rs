//! # Ingredient Repository
//!
//! Database operations for ingredients, including the stock-mutation
//! entry points the rest of the system funnels through:
//!
//! - manual adjustments from the inventory screen ([`IngredientRepository::adjust_stock`])
//! - the order-completion deduction pass ([`IngredientRepository::apply_deductions`],
//!   also reused inside the order repository's transaction)
//!
//! Every stock write happens inside a transaction and is clamped at
//! zero by the core engine before it is persisted.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use brasa_core::stock::{self, StockDeduction, StockUpdate};
use brasa_core::validation::validate_ingredient;
use brasa_core::{CoreError, Ingredient, StockAdjustment};

use crate::error::{DbError, DbResult};
use crate::repository::{decode_decimal, decode_money, decode_optional_decimal, decode_unit};

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw ingredient row as stored; decimals and units still TEXT.
#[derive(Debug, sqlx::FromRow)]
struct IngredientRow {
    id: String,
    name: String,
    purchase_unit: String,
    purchase_quantity: String,
    purchase_price: String,
    yield_percent: Option<String>,
    current_stock: String,
    min_stock: String,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl IngredientRow {
    fn into_domain(self) -> DbResult<Ingredient> {
        Ok(Ingredient {
            id: self.id,
            name: self.name,
            purchase_unit: decode_unit("purchase_unit", &self.purchase_unit)?,
            purchase_quantity: decode_decimal("purchase_quantity", &self.purchase_quantity)?,
            purchase_price: decode_money("purchase_price", &self.purchase_price)?,
            yield_percent: decode_optional_decimal("yield_percent", self.yield_percent.as_deref())?,
            current_stock: decode_decimal("current_stock", &self.current_stock)?,
            min_stock: decode_decimal("min_stock", &self.min_stock)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, purchase_unit, purchase_quantity, \
     purchase_price, yield_percent, current_stock, min_stock, created_at, updated_at \
     FROM ingredients";

// =============================================================================
// Repository
// =============================================================================

/// Repository for ingredient database operations.
#[derive(Debug, Clone)]
pub struct IngredientRepository {
    pool: SqlitePool,
}

impl IngredientRepository {
    /// Creates a new IngredientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        IngredientRepository { pool }
    }

    /// Lists all ingredients, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Ingredient>> {
        let mut conn = self.pool.acquire().await?;
        fetch_all(&mut conn).await
    }

    /// Gets an ingredient by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Ingredient>> {
        let row: Option<IngredientRow> =
            sqlx::query_as::<_, IngredientRow>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(IngredientRow::into_domain).transpose()
    }

    /// Inserts a new ingredient.
    ///
    /// Validates business rules first: a zero-sized package or a zero
    /// yield must never reach storage, where it would cost-out as a
    /// sentinel forever.
    pub async fn insert(&self, ingredient: &Ingredient) -> DbResult<()> {
        validate_ingredient(ingredient).map_err(|e| DbError::Domain(CoreError::from(e)))?;

        debug!(id = %ingredient.id, name = %ingredient.name, "Inserting ingredient");

        sqlx::query(
            r#"
            INSERT INTO ingredients (
                id, name, purchase_unit, purchase_quantity, purchase_price,
                yield_percent, current_stock, min_stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&ingredient.id)
        .bind(&ingredient.name)
        .bind(ingredient.purchase_unit.as_str())
        .bind(ingredient.purchase_quantity.to_string())
        .bind(ingredient.purchase_price.amount().to_string())
        .bind(ingredient.yield_percent.map(|y| y.to_string()))
        .bind(ingredient.current_stock.to_string())
        .bind(ingredient.min_stock.to_string())
        .bind(ingredient.created_at)
        .bind(ingredient.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing ingredient.
    pub async fn update(&self, ingredient: &Ingredient) -> DbResult<()> {
        validate_ingredient(ingredient).map_err(|e| DbError::Domain(CoreError::from(e)))?;

        debug!(id = %ingredient.id, "Updating ingredient");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE ingredients SET
                name = ?2,
                purchase_unit = ?3,
                purchase_quantity = ?4,
                purchase_price = ?5,
                yield_percent = ?6,
                current_stock = ?7,
                min_stock = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&ingredient.id)
        .bind(&ingredient.name)
        .bind(ingredient.purchase_unit.as_str())
        .bind(ingredient.purchase_quantity.to_string())
        .bind(ingredient.purchase_price.amount().to_string())
        .bind(ingredient.yield_percent.map(|y| y.to_string()))
        .bind(ingredient.current_stock.to_string())
        .bind(ingredient.min_stock.to_string())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ingredient", &ingredient.id));
        }

        Ok(())
    }

    /// Deletes an ingredient.
    ///
    /// Recipes referencing it keep their lines; the costing engine
    /// resolves the dangling reference as a zero contribution.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting ingredient");

        let result = sqlx::query("DELETE FROM ingredients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ingredient", id));
        }

        Ok(())
    }

    /// Applies a manual stock adjustment (inventory screen entry/recount).
    ///
    /// ## Returns
    /// The new stock level, clamped at zero.
    pub async fn adjust_stock(
        &self,
        id: &str,
        adjustment: StockAdjustment,
    ) -> DbResult<rust_decimal::Decimal> {
        debug!(id = %id, ?adjustment, "Adjusting stock");

        let mut tx = self.pool.begin().await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT current_stock FROM ingredients WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let current = match current {
            Some(value) => decode_decimal("current_stock", &value)?,
            None => return Err(DbError::not_found("Ingredient", id)),
        };

        let new_stock = stock::adjust_stock(current, adjustment);

        sqlx::query("UPDATE ingredients SET current_stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(new_stock.to_string())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(new_stock)
    }

    /// Applies a deduction pass produced by the core engine, in one
    /// transaction.
    ///
    /// The order repository runs the same helper inside its own
    /// completion transaction; this entry point exists for callers that
    /// already computed deductions (e.g. a reconciliation job).
    pub async fn apply_deductions(
        &self,
        deductions: &[StockDeduction],
    ) -> DbResult<Vec<StockUpdate>> {
        let mut tx = self.pool.begin().await?;
        let updates = apply_deductions_tx(&mut tx, deductions).await?;
        tx.commit().await?;
        Ok(updates)
    }
}

// =============================================================================
// Transaction-Scoped Helpers (shared with the order repository)
// =============================================================================

/// Loads the full ingredient catalog on an existing connection.
pub(crate) async fn fetch_all(conn: &mut SqliteConnection) -> DbResult<Vec<Ingredient>> {
    let rows: Vec<IngredientRow> =
        sqlx::query_as::<_, IngredientRow>(&format!("{SELECT_COLUMNS} ORDER BY name"))
            .fetch_all(&mut *conn)
            .await?;

    rows.into_iter().map(IngredientRow::into_domain).collect()
}

/// Resolves and persists a deduction list inside the caller's
/// transaction: read current stock, clamp through the core engine,
/// write the new levels.
///
/// The transaction is what makes the read-modify-write safe - SQLite
/// allows a single writer, so no other completion pass can slip between
/// the read and the write.
pub(crate) async fn apply_deductions_tx(
    conn: &mut SqliteConnection,
    deductions: &[StockDeduction],
) -> DbResult<Vec<StockUpdate>> {
    if deductions.is_empty() {
        return Ok(Vec::new());
    }

    let ingredients = fetch_all(&mut *conn).await?;
    let updates = stock::apply_deductions(&ingredients, deductions);
    write_stock_updates(&mut *conn, &updates).await?;
    Ok(updates)
}

/// Persists already-clamped stock levels on an existing connection.
pub(crate) async fn write_stock_updates(
    conn: &mut SqliteConnection,
    updates: &[StockUpdate],
) -> DbResult<()> {
    let now = Utc::now();
    for update in updates {
        sqlx::query("UPDATE ingredients SET current_stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&update.ingredient_id)
            .bind(update.new_stock.to_string())
            .bind(now)
            .execute(&mut *conn)
            .await?;
    }

    debug!(count = updates.len(), "Applied stock deductions");
    Ok(())
}

/// Generates a new ingredient ID.
pub fn generate_ingredient_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use brasa_core::{Money, Unit};
    use rust_decimal_macros::dec;

    async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn beef() -> Ingredient {
        let mut ing = Ingredient::new(
            generate_ingredient_id(),
            "Ground beef",
            Unit::Kilogram,
            dec!(1),
            Money::new(dec!(38.90)),
        );
        ing.yield_percent = Some(dec!(95));
        ing.current_stock = dec!(4.5);
        ing.min_stock = dec!(2);
        ing
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = database().await;
        let repo = db.ingredients();

        let ing = beef();
        repo.insert(&ing).await.unwrap();

        let loaded = repo.get_by_id(&ing.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Ground beef");
        assert_eq!(loaded.purchase_unit, Unit::Kilogram);
        assert_eq!(loaded.purchase_quantity, dec!(1));
        assert_eq!(loaded.purchase_price, Money::new(dec!(38.90)));
        assert_eq!(loaded.yield_percent, Some(dec!(95)));
        assert_eq!(loaded.current_stock, dec!(4.5));
        assert_eq!(loaded.min_stock, dec!(2));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let db = database().await;
        assert!(db.ingredients().get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_records() {
        let db = database().await;
        let repo = db.ingredients();

        let mut bad = beef();
        bad.purchase_quantity = dec!(0);
        assert!(matches!(
            repo.insert(&bad).await,
            Err(DbError::Domain(_))
        ));

        let mut bad = beef();
        bad.yield_percent = Some(dec!(0));
        assert!(repo.insert(&bad).await.is_err());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = database().await;
        let repo = db.ingredients();

        let mut ing = beef();
        repo.insert(&ing).await.unwrap();

        ing.name = "Ground beef (blend)".to_string();
        ing.purchase_price = Money::new(dec!(42));
        repo.update(&ing).await.unwrap();

        let loaded = repo.get_by_id(&ing.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Ground beef (blend)");
        assert_eq!(loaded.purchase_price, Money::new(dec!(42)));

        repo.delete(&ing.id).await.unwrap();
        assert!(repo.get_by_id(&ing.id).await.unwrap().is_none());

        assert!(matches!(
            repo.delete(&ing.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let db = database().await;
        let repo = db.ingredients();

        let mut a = beef();
        a.name = "Zucchini".to_string();
        let mut b = beef();
        b.id = generate_ingredient_id();
        b.name = "Bacon".to_string();

        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Bacon".to_string(), "Zucchini".to_string()]);
    }

    #[tokio::test]
    async fn test_adjust_stock_set_receive_and_clamp() {
        let db = database().await;
        let repo = db.ingredients();

        let ing = beef();
        repo.insert(&ing).await.unwrap();

        let after = repo
            .adjust_stock(&ing.id, StockAdjustment::Receive(dec!(2)))
            .await
            .unwrap();
        assert_eq!(after, dec!(6.5));

        let after = repo
            .adjust_stock(&ing.id, StockAdjustment::Set(dec!(1)))
            .await
            .unwrap();
        assert_eq!(after, dec!(1));

        // corrections past zero clamp
        let after = repo
            .adjust_stock(&ing.id, StockAdjustment::Receive(dec!(-5)))
            .await
            .unwrap();
        assert_eq!(after, dec!(0));

        assert!(matches!(
            repo.adjust_stock("nope", StockAdjustment::Set(dec!(1))).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_apply_deductions_clamps_in_storage() {
        let db = database().await;
        let repo = db.ingredients();

        let ing = beef(); // 4.5 kg on hand
        repo.insert(&ing).await.unwrap();

        let updates = repo
            .apply_deductions(&[StockDeduction {
                ingredient_id: ing.id.clone(),
                gross_quantity: dec!(10),
            }])
            .await
            .unwrap();

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].new_stock, dec!(0));

        let loaded = repo.get_by_id(&ing.id).await.unwrap().unwrap();
        assert_eq!(loaded.current_stock, dec!(0));
    }
}
