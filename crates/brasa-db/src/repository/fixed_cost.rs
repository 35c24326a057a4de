//! # Fixed Cost Repository
//!
//! Database operations for recurring monthly expenses (rent, utilities,
//! payroll). The sum of these amounts, spread over the estimated monthly
//! billing, becomes the fixed-cost percentage in the pricing formula.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use brasa_core::{FixedCost, Money};

use crate::error::{DbError, DbResult};
use crate::repository::decode_money;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct FixedCostRow {
    id: String,
    name: String,
    amount: String,
}

impl FixedCostRow {
    fn into_domain(self) -> DbResult<FixedCost> {
        Ok(FixedCost {
            id: self.id,
            name: self.name,
            amount: decode_money("amount", &self.amount)?,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for fixed cost database operations.
#[derive(Debug, Clone)]
pub struct FixedCostRepository {
    pool: SqlitePool,
}

impl FixedCostRepository {
    /// Creates a new FixedCostRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FixedCostRepository { pool }
    }

    /// Lists all fixed costs, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<FixedCost>> {
        let mut conn = self.pool.acquire().await?;
        fetch_all(&mut conn).await
    }

    /// Inserts a new fixed cost.
    pub async fn insert(&self, cost: &FixedCost) -> DbResult<()> {
        debug!(id = %cost.id, name = %cost.name, "Inserting fixed cost");

        sqlx::query("INSERT INTO fixed_costs (id, name, amount) VALUES (?1, ?2, ?3)")
            .bind(&cost.id)
            .bind(&cost.name)
            .bind(cost.amount.amount().to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Updates an existing fixed cost.
    pub async fn update(&self, cost: &FixedCost) -> DbResult<()> {
        let result = sqlx::query("UPDATE fixed_costs SET name = ?2, amount = ?3 WHERE id = ?1")
            .bind(&cost.id)
            .bind(&cost.name)
            .bind(cost.amount.amount().to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("FixedCost", &cost.id));
        }

        Ok(())
    }

    /// Deletes a fixed cost.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM fixed_costs WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("FixedCost", id));
        }

        Ok(())
    }

    /// Sums all fixed cost amounts.
    ///
    /// Summed in Rust over the decoded decimals - SQL SUM over the TEXT
    /// column would coerce through floating point.
    pub async fn total(&self) -> DbResult<Money> {
        let costs = self.list().await?;
        Ok(costs.iter().map(|c| c.amount).sum())
    }
}

/// Loads all fixed costs on an existing connection.
pub(crate) async fn fetch_all(conn: &mut SqliteConnection) -> DbResult<Vec<FixedCost>> {
    let rows: Vec<FixedCostRow> =
        sqlx::query_as::<_, FixedCostRow>("SELECT id, name, amount FROM fixed_costs ORDER BY name")
            .fetch_all(&mut *conn)
            .await?;

    rows.into_iter().map(FixedCostRow::into_domain).collect()
}

/// Generates a new fixed cost ID.
pub fn generate_fixed_cost_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use rust_decimal_macros::dec;

    async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn cost(name: &str, amount: rust_decimal::Decimal) -> FixedCost {
        FixedCost {
            id: generate_fixed_cost_id(),
            name: name.to_string(),
            amount: Money::new(amount),
        }
    }

    #[tokio::test]
    async fn test_crud_and_total() {
        let db = database().await;
        let repo = db.fixed_costs();

        let rent = cost("Rent", dec!(1500.50));
        let payroll = cost("Payroll", dec!(499.50));
        repo.insert(&rent).await.unwrap();
        repo.insert(&payroll).await.unwrap();

        assert_eq!(repo.total().await.unwrap(), Money::new(dec!(2000)));

        let mut rent = rent;
        rent.amount = Money::new(dec!(1800));
        repo.update(&rent).await.unwrap();
        assert_eq!(repo.total().await.unwrap(), Money::new(dec!(2299.50)));

        repo.delete(&payroll.id).await.unwrap();
        let remaining = repo.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Rent");

        assert!(matches!(
            repo.delete(&payroll.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_total_of_empty_catalog_is_zero() {
        let db = database().await;
        assert_eq!(db.fixed_costs().total().await.unwrap(), Money::zero());
    }
}
