//! # Settings Repository
//!
//! The tenant-wide settings singleton. The row id is fixed at 1; reads
//! before the first save fall back to [`AppSettings::default`] so the
//! rest of the system never deals with "no settings yet".

use sqlx::SqlitePool;
use tracing::debug;

use brasa_core::validation::validate_settings;
use brasa_core::{AppSettings, CoreError};

use crate::error::{DbError, DbResult};
use crate::repository::{decode_decimal, decode_money};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    business_name: String,
    target_margin: String,
    tax_and_loss_percent: String,
    estimated_monthly_billing: String,
}

impl SettingsRow {
    fn into_domain(self) -> DbResult<AppSettings> {
        Ok(AppSettings {
            business_name: self.business_name,
            target_margin: decode_decimal("target_margin", &self.target_margin)?,
            tax_and_loss_percent: decode_decimal(
                "tax_and_loss_percent",
                &self.tax_and_loss_percent,
            )?,
            estimated_monthly_billing: decode_money(
                "estimated_monthly_billing",
                &self.estimated_monthly_billing,
            )?,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the settings singleton.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Gets the settings, or the defaults when nothing was saved yet.
    pub async fn get(&self) -> DbResult<AppSettings> {
        let row: Option<SettingsRow> = sqlx::query_as::<_, SettingsRow>(
            "SELECT business_name, target_margin, tax_and_loss_percent, \
             estimated_monthly_billing FROM settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_domain(),
            None => Ok(AppSettings::default()),
        }
    }

    /// Saves the settings (insert or update the singleton row).
    pub async fn save(&self, settings: &AppSettings) -> DbResult<()> {
        validate_settings(settings).map_err(|e| DbError::Domain(CoreError::from(e)))?;

        debug!(business = %settings.business_name, "Saving settings");

        sqlx::query(
            r#"
            INSERT INTO settings (
                id, business_name, target_margin, tax_and_loss_percent,
                estimated_monthly_billing
            ) VALUES (1, ?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                business_name = excluded.business_name,
                target_margin = excluded.target_margin,
                tax_and_loss_percent = excluded.tax_and_loss_percent,
                estimated_monthly_billing = excluded.estimated_monthly_billing
            "#,
        )
        .bind(&settings.business_name)
        .bind(settings.target_margin.to_string())
        .bind(settings.tax_and_loss_percent.to_string())
        .bind(settings.estimated_monthly_billing.amount().to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
