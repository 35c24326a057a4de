//! # Customer Repository
//!
//! Customer CRUD plus the running spend statistics the order flow
//! maintains: every completed order adds to `total_spent` and stamps
//! `last_order_date`.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use brasa_core::{Customer, Money};

use crate::error::{DbError, DbResult};
use crate::repository::decode_money;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    phone: String,
    email: Option<String>,
    address: Option<String>,
    notes: Option<String>,
    total_spent: String,
    last_order_date: Option<DateTime<Utc>>,
}

impl CustomerRow {
    fn into_domain(self) -> DbResult<Customer> {
        Ok(Customer {
            id: self.id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            address: self.address,
            notes: self.notes,
            total_spent: decode_money("total_spent", &self.total_spent)?,
            last_order_date: self.last_order_date,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, phone, email, address, notes, \
     total_spent, last_order_date FROM customers";

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists all customers, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let rows: Vec<CustomerRow> =
            sqlx::query_as::<_, CustomerRow>(&format!("{SELECT_COLUMNS} ORDER BY name"))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(CustomerRow::into_domain).collect()
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> =
            sqlx::query_as::<_, CustomerRow>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(CustomerRow::into_domain).transpose()
    }

    /// Inserts a new customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, phone, email, address, notes, total_spent, last_order_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.notes)
        .bind(customer.total_spent.amount().to_string())
        .bind(customer.last_order_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a customer's contact details.
    ///
    /// Spend statistics are owned by the order flow and deliberately not
    /// writable here.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2, phone = ?3, email = ?4, address = ?5, notes = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Deletes a customer.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }
}

// =============================================================================
// Transaction-Scoped Helpers (shared with the order repository)
// =============================================================================

/// Adds a completed order's total to the customer's lifetime spend and
/// stamps the last order date, inside the caller's transaction.
///
/// A missing customer (deleted between ordering and completion) is a
/// no-op: the order still completes, the stats just have nowhere to go.
pub(crate) async fn record_order(
    conn: &mut SqliteConnection,
    customer_id: &str,
    order_total: Money,
    when: DateTime<Utc>,
) -> DbResult<()> {
    let current: Option<String> =
        sqlx::query_scalar("SELECT total_spent FROM customers WHERE id = ?1")
            .bind(customer_id)
            .fetch_optional(&mut *conn)
            .await?;

    let Some(current) = current else {
        debug!(customer_id = %customer_id, "Customer gone, skipping spend stats");
        return Ok(());
    };

    let new_total = decode_money("total_spent", &current)? + order_total;

    sqlx::query("UPDATE customers SET total_spent = ?2, last_order_date = ?3 WHERE id = ?1")
        .bind(customer_id)
        .bind(new_total.amount().to_string())
        .bind(when)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Generates a new customer ID.
pub fn generate_customer_id() -> String {
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

    fn customer() -> Customer {
        Customer {
            id: generate_customer_id(),
            name: "Ana".to_string(),
            phone: "5511999990000".to_string(),
            email: Some("ana@example.com".to_string()),
            address: None,
            notes: Some("no onions".to_string()),
            total_spent: Money::zero(),
            last_order_date: None,
        }
    }

    #[tokio::test]
    async fn test_crud_round_trip() {
        let db = database().await;
        let repo = db.customers();

        let mut c = customer();
        repo.insert(&c).await.unwrap();

        let loaded = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Ana");
        assert_eq!(loaded.total_spent, Money::zero());
        assert_eq!(loaded.last_order_date, None);

        c.phone = "5511888880000".to_string();
        repo.update(&c).await.unwrap();
        let loaded = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(loaded.phone, "5511888880000");

        repo.delete(&c.id).await.unwrap();
        assert!(repo.get_by_id(&c.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_order_accumulates_spend() {
        let db = database().await;
        let repo = db.customers();

        let c = customer();
        repo.insert(&c).await.unwrap();

        let when = Utc::now();
        let mut conn = db.pool().acquire().await.unwrap();
        record_order(&mut conn, &c.id, Money::new(dec!(60)), when)
            .await
            .unwrap();
        record_order(&mut conn, &c.id, Money::new(dec!(25.50)), when)
            .await
            .unwrap();

        // unknown customer is a silent no-op
        record_order(&mut conn, "ghost", Money::new(dec!(10)), when)
            .await
            .unwrap();

        // release the (only, in-memory) pooled connection before the
        // repository needs it back
        drop(conn);

        let loaded = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(loaded.total_spent, Money::new(dec!(85.50)));
        assert!(loaded.last_order_date.is_some());
    }
}
