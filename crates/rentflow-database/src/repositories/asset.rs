//! Asset repository implementation.

use sqlx::PgPool;
use sqlx::types::Json;

use rentflow_core::error::{AppError, ErrorKind};
use rentflow_core::result::AppResult;
use rentflow_core::types::{AssetId, CategoryId, PageRequest, PageResponse, TenantId};
use rentflow_entity::asset::Asset;

use super::is_foreign_key_violation;

/// Repository for rentable assets.
#[derive(Debug, Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    /// Create a new asset repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new asset.
    pub async fn create(&self, asset: &Asset) -> AppResult<Asset> {
        sqlx::query_as::<_, Asset>(
            "INSERT INTO assets \
             (id, tenant_id, category_id, name, description, sort_order, is_active, \
              custom_fields, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(asset.id)
        .bind(asset.tenant_id)
        .bind(asset.category_id)
        .bind(&asset.name)
        .bind(&asset.description)
        .bind(asset.sort_order)
        .bind(asset.is_active)
        .bind(Json(&asset.custom_fields))
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::validation("Referenced category does not exist")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create asset", e)
            }
        })
    }

    /// Find an asset by ID within a tenant.
    pub async fn find_by_id(&self, tenant_id: TenantId, id: AssetId) -> AppResult<Option<Asset>> {
        sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find asset", e))
    }

    /// List a tenant's assets in display order.
    pub async fn find_by_tenant(
        &self,
        tenant_id: TenantId,
        category_id: Option<CategoryId>,
        page: PageRequest,
    ) -> AppResult<PageResponse<Asset>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM assets \
             WHERE tenant_id = $1 AND ($2::uuid IS NULL OR category_id = $2)",
        )
        .bind(tenant_id)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count assets", e))?;

        let assets = sqlx::query_as::<_, Asset>(
            "SELECT * FROM assets \
             WHERE tenant_id = $1 AND ($2::uuid IS NULL OR category_id = $2) \
             ORDER BY sort_order, name LIMIT $3 OFFSET $4",
        )
        .bind(tenant_id)
        .bind(category_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list assets", e))?;

        Ok(PageResponse::new(assets, page, total as u64))
    }

    /// Write every mutable column of an asset.
    pub async fn update(&self, asset: &Asset) -> AppResult<Asset> {
        sqlx::query_as::<_, Asset>(
            "UPDATE assets SET category_id = $3, name = $4, description = $5, sort_order = $6, \
             is_active = $7, custom_fields = $8, updated_at = $9 \
             WHERE id = $1 AND tenant_id = $2 RETURNING *",
        )
        .bind(asset.id)
        .bind(asset.tenant_id)
        .bind(asset.category_id)
        .bind(&asset.name)
        .bind(&asset.description)
        .bind(asset.sort_order)
        .bind(asset.is_active)
        .bind(Json(&asset.custom_fields))
        .bind(asset.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::validation("Referenced category does not exist")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to update asset", e)
            }
        })?
        .ok_or_else(|| AppError::not_found(format!("Asset {} not found", asset.id)))
    }

    /// Delete an asset. Rental history blocks deletion.
    pub async fn delete(&self, tenant_id: TenantId, id: AssetId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::conflict(format!(
                        "Asset {id} has rental history and cannot be deleted; deactivate it instead"
                    ))
                } else {
                    AppError::with_source(ErrorKind::Database, "Failed to delete asset", e)
                }
            })?;
        Ok(result.rows_affected() > 0)
    }
}
