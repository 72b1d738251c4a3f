//! Category CRUD.

use std::sync::Arc;

use tracing::info;

use rentflow_core::error::AppError;
use rentflow_core::traits::Clock;
use rentflow_core::types::CategoryId;
use rentflow_database::CatalogStore;
use rentflow_entity::category::{Category, CreateCategory, UpdateCategory};

use crate::context::TenantContext;

/// Manages asset categories.
#[derive(Debug, Clone)]
pub struct CategoryService {
    catalog: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
}

impl CategoryService {
    /// Creates a new category service.
    pub fn new(catalog: Arc<dyn CatalogStore>, clock: Arc<dyn Clock>) -> Self {
        Self { catalog, clock }
    }

    /// Lists categories in display order.
    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<Category>, AppError> {
        self.catalog.list_categories(ctx.tenant_id).await
    }

    /// Gets a category by ID.
    pub async fn get(&self, ctx: &TenantContext, id: CategoryId) -> Result<Category, AppError> {
        self.catalog
            .find_category(ctx.tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))
    }

    /// Creates a category.
    pub async fn create(
        &self,
        ctx: &TenantContext,
        data: CreateCategory,
    ) -> Result<Category, AppError> {
        require_name(&data.name)?;
        let category = Category::from_create(ctx.tenant_id, data, self.clock.now());
        let created = self.catalog.insert_category(&category).await?;

        info!(
            tenant_id = %ctx.tenant_id,
            category_id = %created.id,
            name = %created.name,
            "Category created"
        );
        Ok(created)
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: CategoryId,
        update: UpdateCategory,
    ) -> Result<Category, AppError> {
        if let Some(name) = &update.name {
            require_name(name)?;
        }
        let mut category = self.get(ctx, id).await?;
        category.apply(update, self.clock.now());
        self.catalog.update_category(&category).await
    }

    /// Deletes a category. Member assets become uncategorized.
    pub async fn delete(&self, ctx: &TenantContext, id: CategoryId) -> Result<(), AppError> {
        if !self.catalog.delete_category(ctx.tenant_id, id).await? {
            return Err(AppError::not_found(format!("Category {id} not found")));
        }
        info!(tenant_id = %ctx.tenant_id, category_id = %id, "Category deleted");
        Ok(())
    }
}

pub(crate) fn require_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    Ok(())
}
