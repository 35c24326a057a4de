//! # Product Repository
//!
//! Database operations for products and their recipe lines.
//!
//! ## Recipe Storage
//! A product's bill-of-materials lives in the `recipe_items` table, one
//! row per line, keyed by `(product_id, position)`. Updates replace the
//! whole recipe (delete-and-insert) inside one transaction - recipes are
//! small and the simplicity beats diffing.
//!
//! `ingredient_id` carries no foreign key on purpose: deleting an
//! ingredient leaves recipes intact, and the costing engine resolves the
//! dangling line as a zero contribution.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use brasa_core::validation::validate_product;
use brasa_core::{CoreError, Product, RecipeItem};

use crate::error::{DbError, DbResult};
use crate::repository::{decode_decimal, decode_money, decode_unit};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    category: String,
    description: Option<String>,
    preparation_method: Option<String>,
    current_price: String,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct RecipeItemRow {
    product_id: String,
    ingredient_id: String,
    quantity_used: String,
    unit_used: String,
}

impl ProductRow {
    fn into_domain(self, recipe: Vec<RecipeItem>) -> DbResult<Product> {
        Ok(Product {
            id: self.id,
            name: self.name,
            category: self.category,
            description: self.description,
            preparation_method: self.preparation_method,
            current_price: decode_money("current_price", &self.current_price)?,
            recipe,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl RecipeItemRow {
    fn into_domain(self) -> DbResult<RecipeItem> {
        Ok(RecipeItem {
            ingredient_id: self.ingredient_id,
            quantity_used: decode_decimal("quantity_used", &self.quantity_used)?,
            unit_used: decode_unit("unit_used", &self.unit_used)?,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, category, description, preparation_method, \
     current_price, created_at, updated_at FROM products";

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products with their recipes, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_all(&mut conn).await
    }

    /// Gets a product (with recipe) by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> =
            sqlx::query_as::<_, ProductRow>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let recipe_rows: Vec<RecipeItemRow> = sqlx::query_as::<_, RecipeItemRow>(
            "SELECT product_id, ingredient_id, quantity_used, unit_used \
             FROM recipe_items WHERE product_id = ?1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let recipe = recipe_rows
            .into_iter()
            .map(RecipeItemRow::into_domain)
            .collect::<DbResult<Vec<_>>>()?;

        row.into_domain(recipe).map(Some)
    }

    /// Inserts a new product with its recipe.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        validate_product(product).map_err(|e| DbError::Domain(CoreError::from(e)))?;

        debug!(id = %product.id, name = %product.name, "Inserting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, description, preparation_method,
                current_price, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(&product.preparation_method)
        .bind(product.current_price.amount().to_string())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_recipe(&mut tx, &product.id, &product.recipe).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Updates an existing product, replacing its recipe.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_product(product).map_err(|e| DbError::Domain(CoreError::from(e)))?;

        debug!(id = %product.id, "Updating product");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                description = ?4,
                preparation_method = ?5,
                current_price = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(&product.preparation_method)
        .bind(product.current_price.amount().to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        sqlx::query("DELETE FROM recipe_items WHERE product_id = ?1")
            .bind(&product.id)
            .execute(&mut *tx)
            .await?;
        insert_recipe(&mut tx, &product.id, &product.recipe).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a product and its recipe lines (cascade).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Duplicates a product under a fresh identity and returns the copy.
    ///
    /// Copies every field except id/timestamps; the copy's name gets a
    /// " (copy)" suffix so the two are tellable apart on the menu screen.
    pub async fn duplicate(&self, id: &str) -> DbResult<Product> {
        let original = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        let mut copy = original.duplicate(generate_product_id());
        copy.name = format!("{} (copy)", copy.name);

        self.insert(&copy).await?;
        Ok(copy)
    }
}

// =============================================================================
// Transaction-Scoped Helpers (shared with the order repository)
// =============================================================================

async fn insert_recipe(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    product_id: &str,
    recipe: &[RecipeItem],
) -> DbResult<()> {
    for (position, item) in recipe.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO recipe_items (
                product_id, position, ingredient_id, quantity_used, unit_used
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(product_id)
        .bind(position as i64)
        .bind(&item.ingredient_id)
        .bind(item.quantity_used.to_string())
        .bind(item.unit_used.as_str())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Loads the full product catalog (with recipes) on an existing
/// connection. Used by the order repository inside its completion
/// transaction.
pub(crate) async fn fetch_all(conn: &mut SqliteConnection) -> DbResult<Vec<Product>> {
    let product_rows: Vec<ProductRow> =
        sqlx::query_as::<_, ProductRow>(&format!("{SELECT_COLUMNS} ORDER BY name"))
            .fetch_all(&mut *conn)
            .await?;

    let recipe_rows: Vec<RecipeItemRow> = sqlx::query_as::<_, RecipeItemRow>(
        "SELECT product_id, ingredient_id, quantity_used, unit_used \
         FROM recipe_items ORDER BY product_id, position",
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut recipes: HashMap<String, Vec<RecipeItem>> = HashMap::new();
    for row in recipe_rows {
        let product_id = row.product_id.clone();
        recipes
            .entry(product_id)
            .or_default()
            .push(row.into_domain()?);
    }

    product_rows
        .into_iter()
        .map(|row| {
            let recipe = recipes.remove(&row.id).unwrap_or_default();
            row.into_domain(recipe)
        })
        .collect()
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
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

    fn burger() -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            name: "Burger".to_string(),
            category: "Food".to_string(),
            description: Some("Our classic".to_string()),
            preparation_method: Some("Grill 4 min per side".to_string()),
            current_price: Money::new(dec!(30)),
            recipe: vec![
                RecipeItem {
                    ingredient_id: "ing-beef".to_string(),
                    quantity_used: dec!(150),
                    unit_used: Unit::Gram,
                },
                RecipeItem {
                    ingredient_id: "ing-bun".to_string(),
                    quantity_used: dec!(1),
                    unit_used: Unit::Each,
                },
            ],
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = database().await;
        let repo = db.products();

        let product = burger();
        repo.insert(&product).await.unwrap();

        let loaded = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Burger");
        assert_eq!(loaded.current_price, Money::new(dec!(30)));
        assert_eq!(loaded.recipe, product.recipe);
    }

    #[tokio::test]
    async fn test_update_replaces_recipe() {
        let db = database().await;
        let repo = db.products();

        let mut product = burger();
        repo.insert(&product).await.unwrap();

        product.recipe = vec![RecipeItem {
            ingredient_id: "ing-beef".to_string(),
            quantity_used: dec!(200),
            unit_used: Unit::Gram,
        }];
        product.current_price = Money::new(dec!(34));
        repo.update(&product).await.unwrap();

        let loaded = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.recipe.len(), 1);
        assert_eq!(loaded.recipe[0].quantity_used, dec!(200));
        assert_eq!(loaded.current_price, Money::new(dec!(34)));
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_recipe() {
        let db = database().await;
        let repo = db.products();

        let mut product = burger();
        product.recipe[0].quantity_used = dec!(0);
        assert!(matches!(
            repo.insert(&product).await,
            Err(DbError::Domain(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_recipe() {
        let db = database().await;
        let repo = db.products();

        let product = burger();
        repo.insert(&product).await.unwrap();
        repo.delete(&product.id).await.unwrap();

        assert!(repo.get_by_id(&product.id).await.unwrap().is_none());

        let orphans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM recipe_items WHERE product_id = ?1")
                .bind(&product.id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_duplicate_copies_recipe_under_new_identity() {
        let db = database().await;
        let repo = db.products();

        let product = burger();
        repo.insert(&product).await.unwrap();

        let copy = repo.duplicate(&product.id).await.unwrap();
        assert_ne!(copy.id, product.id);
        assert_eq!(copy.name, "Burger (copy)");
        assert_eq!(copy.recipe, product.recipe);

        let loaded = repo.get_by_id(&copy.id).await.unwrap().unwrap();
        assert_eq!(loaded.recipe, product.recipe);

        assert!(matches!(
            repo.duplicate("nope").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_includes_recipes() {
        let db = database().await;
        let repo = db.products();

        repo.insert(&burger()).await.unwrap();
        let mut second = burger();
        second.id = generate_product_id();
        second.name = "Cheeseburger".to_string();
        repo.insert(&second).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|p| p.recipe.len() == 2));
    }
}
