//! Pricing rule repository implementation.

use sqlx::PgPool;

use rentflow_core::error::{AppError, ErrorKind};
use rentflow_core::result::AppResult;
use rentflow_core::types::{PricingRuleId, TenantId};
use rentflow_entity::asset::Asset;
use rentflow_entity::pricing::PricingRule;

use super::is_foreign_key_violation;

/// Repository for pricing rules.
#[derive(Debug, Clone)]
pub struct PricingRuleRepository {
    pool: PgPool,
}

impl PricingRuleRepository {
    /// Create a new pricing rule repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new rule.
    pub async fn create(&self, rule: &PricingRule) -> AppResult<PricingRule> {
        sqlx::query_as::<_, PricingRule>(
            "INSERT INTO pricing_rules \
             (id, tenant_id, name, asset_id, category_id, billing_type, price, min_duration, \
              day_of_week_start, day_of_week_end, time_start, time_end, priority, is_active, \
              created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING *",
        )
        .bind(rule.id)
        .bind(rule.tenant_id)
        .bind(&rule.name)
        .bind(rule.asset_id)
        .bind(rule.category_id)
        .bind(rule.billing_type)
        .bind(rule.price)
        .bind(rule.min_duration)
        .bind(rule.day_of_week_start)
        .bind(rule.day_of_week_end)
        .bind(rule.time_start)
        .bind(rule.time_end)
        .bind(rule.priority)
        .bind(rule.is_active)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::validation("Rule scope references an unknown asset or category")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create pricing rule", e)
            }
        })
    }

    /// Find a rule by ID within a tenant.
    pub async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: PricingRuleId,
    ) -> AppResult<Option<PricingRule>> {
        sqlx::query_as::<_, PricingRule>(
            "SELECT * FROM pricing_rules WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find pricing rule", e))
    }

    /// List a tenant's rules, highest priority first.
    pub async fn find_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<PricingRule>> {
        sqlx::query_as::<_, PricingRule>(
            "SELECT * FROM pricing_rules WHERE tenant_id = $1 \
             ORDER BY priority DESC, created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list pricing rules", e))
    }

    /// Active rules scoped to the asset, its category, or the whole tenant.
    pub async fn find_for_asset(&self, asset: &Asset) -> AppResult<Vec<PricingRule>> {
        sqlx::query_as::<_, PricingRule>(
            "SELECT * FROM pricing_rules \
             WHERE tenant_id = $1 AND is_active \
               AND (asset_id = $2 \
                    OR category_id = $3 \
                    OR (asset_id IS NULL AND category_id IS NULL))",
        )
        .bind(asset.tenant_id)
        .bind(asset.id)
        .bind(asset.category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load rules for asset", e)
        })
    }

    /// Write every mutable column of a rule.
    pub async fn update(&self, rule: &PricingRule) -> AppResult<PricingRule> {
        sqlx::query_as::<_, PricingRule>(
            "UPDATE pricing_rules SET name = $3, asset_id = $4, category_id = $5, \
             billing_type = $6, price = $7, min_duration = $8, day_of_week_start = $9, \
             day_of_week_end = $10, time_start = $11, time_end = $12, priority = $13, \
             is_active = $14, updated_at = $15 \
             WHERE id = $1 AND tenant_id = $2 RETURNING *",
        )
        .bind(rule.id)
        .bind(rule.tenant_id)
        .bind(&rule.name)
        .bind(rule.asset_id)
        .bind(rule.category_id)
        .bind(rule.billing_type)
        .bind(rule.price)
        .bind(rule.min_duration)
        .bind(rule.day_of_week_start)
        .bind(rule.day_of_week_end)
        .bind(rule.time_start)
        .bind(rule.time_end)
        .bind(rule.priority)
        .bind(rule.is_active)
        .bind(rule.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::validation("Rule scope references an unknown asset or category")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to update pricing rule", e)
            }
        })?
        .ok_or_else(|| AppError::not_found(format!("Pricing rule {} not found", rule.id)))
    }

    /// Delete a rule.
    pub async fn delete(&self, tenant_id: TenantId, id: PricingRuleId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pricing_rules WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete pricing rule", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
