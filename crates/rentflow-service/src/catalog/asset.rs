//! Asset CRUD and the asset detail view.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use rentflow_core::error::AppError;
use rentflow_core::traits::Clock;
use rentflow_core::types::{AssetId, CategoryId, PageRequest, PageResponse};
use rentflow_database::{CatalogStore, RentalLedger};
use rentflow_entity::asset::{Asset, CreateAsset, UpdateAsset};
use rentflow_entity::rental::RentalSession;

use super::category::require_name;
use crate::context::TenantContext;

/// An asset together with its current session, if one is running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDetail {
    /// The asset.
    #[serde(flatten)]
    pub asset: Asset,
    /// The active session occupying the asset.
    pub active_session: Option<RentalSession>,
}

/// Manages rentable assets.
#[derive(Debug, Clone)]
pub struct AssetService {
    catalog: Arc<dyn CatalogStore>,
    ledger: Arc<dyn RentalLedger>,
    clock: Arc<dyn Clock>,
}

impl AssetService {
    /// Creates a new asset service.
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        ledger: Arc<dyn RentalLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            clock,
        }
    }

    /// Lists assets, optionally within one category.
    pub async fn list(
        &self,
        ctx: &TenantContext,
        category_id: Option<CategoryId>,
        page: PageRequest,
    ) -> Result<PageResponse<Asset>, AppError> {
        self.catalog
            .list_assets(ctx.tenant_id, category_id, page)
            .await
    }

    /// Gets an asset by ID.
    pub async fn get(&self, ctx: &TenantContext, id: AssetId) -> Result<Asset, AppError> {
        self.catalog
            .find_asset(ctx.tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Asset {id} not found")))
    }

    /// Gets an asset with its active session.
    pub async fn detail(&self, ctx: &TenantContext, id: AssetId) -> Result<AssetDetail, AppError> {
        let asset = self.get(ctx, id).await?;
        let active_session = self
            .ledger
            .active_session_for_asset(ctx.tenant_id, id)
            .await?;
        Ok(AssetDetail {
            asset,
            active_session,
        })
    }

    /// Creates an asset.
    pub async fn create(&self, ctx: &TenantContext, data: CreateAsset) -> Result<Asset, AppError> {
        require_name(&data.name)?;
        let asset = Asset::from_create(ctx.tenant_id, data, self.clock.now());
        let created = self.catalog.insert_asset(&asset).await?;

        info!(
            tenant_id = %ctx.tenant_id,
            asset_id = %created.id,
            name = %created.name,
            "Asset created"
        );
        Ok(created)
    }

    /// Applies a partial update. Custom fields are merged, `null` removes a key.
    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: AssetId,
        update: UpdateAsset,
    ) -> Result<Asset, AppError> {
        if let Some(name) = &update.name {
            require_name(name)?;
        }
        let mut asset = self.get(ctx, id).await?;
        asset.apply(update, self.clock.now());
        self.catalog.update_asset(&asset).await
    }

    /// Deletes an asset that has never been rented.
    pub async fn delete(&self, ctx: &TenantContext, id: AssetId) -> Result<(), AppError> {
        if let Some(session) = self
            .ledger
            .active_session_for_asset(ctx.tenant_id, id)
            .await?
        {
            return Err(AppError::asset_occupied(format!(
                "Asset {id} is in use by session {}",
                session.id
            )));
        }

        if !self.catalog.delete_asset(ctx.tenant_id, id).await? {
            return Err(AppError::not_found(format!("Asset {id} not found")));
        }
        info!(tenant_id = %ctx.tenant_id, asset_id = %id, "Asset deleted");
        Ok(())
    }
}
