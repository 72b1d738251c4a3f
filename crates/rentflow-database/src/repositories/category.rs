//! Category repository implementation.

use sqlx::PgPool;
use sqlx::types::Json;

use rentflow_core::error::{AppError, ErrorKind};
use rentflow_core::result::AppResult;
use rentflow_core::types::{CategoryId, TenantId};
use rentflow_entity::category::Category;

/// Repository for asset categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    /// Create a new category repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new category.
    pub async fn create(&self, category: &Category) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories \
             (id, tenant_id, name, icon, description, sort_order, is_active, \
              custom_fields_schema, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(category.id)
        .bind(category.tenant_id)
        .bind(&category.name)
        .bind(&category.icon)
        .bind(&category.description)
        .bind(category.sort_order)
        .bind(category.is_active)
        .bind(Json(&category.custom_fields_schema))
        .bind(category.created_at)
        .bind(category.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create category", e))
    }

    /// Find a category by ID within a tenant.
    pub async fn find_by_id(&self, tenant_id: TenantId, id: CategoryId) -> AppResult<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find category", e))
    }

    /// List a tenant's categories in display order.
    pub async fn find_by_tenant(&self, tenant_id: TenantId) -> AppResult<Vec<Category>> {
        sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE tenant_id = $1 ORDER BY sort_order, name",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list categories", e))
    }

    /// Write every mutable column of a category.
    pub async fn update(&self, category: &Category) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $3, icon = $4, description = $5, sort_order = $6, \
             is_active = $7, custom_fields_schema = $8, updated_at = $9 \
             WHERE id = $1 AND tenant_id = $2 RETURNING *",
        )
        .bind(category.id)
        .bind(category.tenant_id)
        .bind(&category.name)
        .bind(&category.icon)
        .bind(&category.description)
        .bind(category.sort_order)
        .bind(category.is_active)
        .bind(Json(&category.custom_fields_schema))
        .bind(category.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update category", e))?
        .ok_or_else(|| AppError::not_found(format!("Category {} not found", category.id)))
    }

    /// Delete a category.
    pub async fn delete(&self, tenant_id: TenantId, id: CategoryId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete category", e))?;
        Ok(result.rows_affected() > 0)
    }
}
