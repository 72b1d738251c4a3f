//! Tenant settings repository implementation.

use sqlx::PgPool;

use rentflow_core::error::{AppError, ErrorKind};
use rentflow_core::result::AppResult;
use rentflow_core::types::TenantId;
use rentflow_entity::tenant::TenantSettings;

/// Repository for per-tenant billing defaults.
#[derive(Debug, Clone)]
pub struct TenantSettingsRepository {
    pool: PgPool,
}

impl TenantSettingsRepository {
    /// Create a new tenant settings repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the settings row for a tenant.
    pub async fn find(&self, tenant_id: TenantId) -> AppResult<Option<TenantSettings>> {
        sqlx::query_as::<_, TenantSettings>("SELECT * FROM tenant_settings WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find tenant settings", e)
            })
    }

    /// Insert or replace the settings row.
    pub async fn upsert(&self, settings: &TenantSettings) -> AppResult<TenantSettings> {
        sqlx::query_as::<_, TenantSettings>(
            "INSERT INTO tenant_settings \
             (tenant_id, currency, currency_symbol, default_billing_type, default_price, \
              utc_offset_minutes, working_hours_start, working_hours_end, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (tenant_id) DO UPDATE SET \
               currency = EXCLUDED.currency, \
               currency_symbol = EXCLUDED.currency_symbol, \
               default_billing_type = EXCLUDED.default_billing_type, \
               default_price = EXCLUDED.default_price, \
               utc_offset_minutes = EXCLUDED.utc_offset_minutes, \
               working_hours_start = EXCLUDED.working_hours_start, \
               working_hours_end = EXCLUDED.working_hours_end, \
               updated_at = EXCLUDED.updated_at \
             RETURNING *",
        )
        .bind(settings.tenant_id)
        .bind(&settings.currency)
        .bind(&settings.currency_symbol)
        .bind(settings.default_billing_type)
        .bind(settings.default_price)
        .bind(settings.utc_offset_minutes)
        .bind(settings.working_hours_start)
        .bind(settings.working_hours_end)
        .bind(settings.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save tenant settings", e))
    }
}
