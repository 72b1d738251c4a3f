//! Promotion repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use rentflow_core::error::{AppError, ErrorKind};
use rentflow_core::result::AppResult;
use rentflow_core::types::{PromotionId, TenantId};
use rentflow_entity::promotion::Promotion;

use super::{is_check_violation, is_foreign_key_violation, is_unique_violation};

/// Repository for promotions.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: PgPool,
}

impl PromotionRepository {
    /// Create a new promotion repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new promotion.
    pub async fn create(&self, promotion: &Promotion) -> AppResult<Promotion> {
        sqlx::query_as::<_, Promotion>(
            "INSERT INTO promotions \
             (id, tenant_id, name, code, discount_type, discount_value, min_session_duration, \
              min_total_amount, max_usages, current_usages, valid_from, valid_until, is_active, \
              created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING *",
        )
        .bind(promotion.id)
        .bind(promotion.tenant_id)
        .bind(&promotion.name)
        .bind(&promotion.code)
        .bind(promotion.discount_type)
        .bind(promotion.discount_value)
        .bind(promotion.min_session_duration)
        .bind(promotion.min_total_amount)
        .bind(promotion.max_usages)
        .bind(promotion.current_usages)
        .bind(promotion.valid_from)
        .bind(promotion.valid_until)
        .bind(promotion.is_active)
        .bind(promotion.created_at)
        .bind(promotion.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_code_or(e, &promotion.code, "Failed to create promotion"))
    }

    /// Find a promotion by ID within a tenant.
    pub async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: PromotionId,
    ) -> AppResult<Option<Promotion>> {
        sqlx::query_as::<_, Promotion>("SELECT * FROM promotions WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find promotion", e))
    }

    /// Find a promotion by code (case-insensitive).
    pub async fn find_by_code(&self, tenant_id: TenantId, code: &str) -> AppResult<Option<Promotion>> {
        sqlx::query_as::<_, Promotion>(
            "SELECT * FROM promotions WHERE tenant_id = $1 AND UPPER(code) = UPPER($2)",
        )
        .bind(tenant_id)
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find promotion by code", e)
        })
    }

    /// List a tenant's promotions, newest first.
    pub async fn find_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Promotion>> {
        sqlx::query_as::<_, Promotion>(
            "SELECT * FROM promotions WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list promotions", e))
    }

    /// Write every operator-editable column. `current_usages` is left alone.
    pub async fn update(&self, promotion: &Promotion) -> AppResult<Promotion> {
        sqlx::query_as::<_, Promotion>(
            "UPDATE promotions SET name = $3, code = $4, discount_type = $5, discount_value = $6, \
             min_session_duration = $7, min_total_amount = $8, max_usages = $9, \
             valid_from = $10, valid_until = $11, is_active = $12, updated_at = $13 \
             WHERE id = $1 AND tenant_id = $2 RETURNING *",
        )
        .bind(promotion.id)
        .bind(promotion.tenant_id)
        .bind(&promotion.name)
        .bind(&promotion.code)
        .bind(promotion.discount_type)
        .bind(promotion.discount_value)
        .bind(promotion.min_session_duration)
        .bind(promotion.min_total_amount)
        .bind(promotion.max_usages)
        .bind(promotion.valid_from)
        .bind(promotion.valid_until)
        .bind(promotion.is_active)
        .bind(promotion.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| duplicate_code_or(e, &promotion.code, "Failed to update promotion"))?
        .ok_or_else(|| AppError::not_found(format!("Promotion {} not found", promotion.id)))
    }

    /// Delete a promotion. Redeemed promotions are referenced by sessions and stay.
    pub async fn delete(&self, tenant_id: TenantId, id: PromotionId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM promotions WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::conflict(format!(
                        "Promotion {id} has been redeemed and cannot be deleted; deactivate it instead"
                    ))
                } else {
                    AppError::with_source(ErrorKind::Database, "Failed to delete promotion", e)
                }
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Claim one redemption if the cap allows it. Runs inside the caller's transaction.
    pub async fn claim_usage(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        id: PromotionId,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE promotions SET current_usages = current_usages + 1, updated_at = $3 \
             WHERE id = $1 AND tenant_id = $2 AND is_active \
               AND (max_usages IS NULL OR current_usages < max_usages)",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(now)
        .execute(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim promotion", e))?;
        Ok(result.rows_affected() == 1)
    }
}

fn duplicate_code_or(err: sqlx::Error, code: &str, context: &'static str) -> AppError {
    if is_unique_violation(&err) {
        AppError::conflict(format!("Promotion code '{code}' already exists"))
    } else if is_check_violation(&err) {
        AppError::validation("max_usages cannot be lowered below the redemptions already made")
    } else {
        AppError::with_source(ErrorKind::Database, context, err)
    }
}
