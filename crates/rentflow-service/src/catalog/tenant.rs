//! Tenant billing settings.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use rentflow_core::error::AppError;
use rentflow_core::traits::Clock;
use rentflow_database::CatalogStore;
use rentflow_entity::tenant::{TenantSettings, UpdateTenantSettings};

use crate::context::TenantContext;

/// Largest UTC offset accepted, in minutes (UTC+14:00).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Reads and updates per-tenant billing defaults.
#[derive(Debug, Clone)]
pub struct TenantSettingsService {
    catalog: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
}

impl TenantSettingsService {
    /// Creates a new tenant settings service.
    pub fn new(catalog: Arc<dyn CatalogStore>, clock: Arc<dyn Clock>) -> Self {
        Self { catalog, clock }
    }

    /// Stored settings, or the defaults when the tenant never saved any.
    pub async fn get(&self, ctx: &TenantContext) -> Result<TenantSettings, AppError> {
        effective_settings(self.catalog.as_ref(), ctx, self.clock.as_ref()).await
    }

    /// Apply a partial update and persist it.
    pub async fn update(
        &self,
        ctx: &TenantContext,
        update: UpdateTenantSettings,
    ) -> Result<TenantSettings, AppError> {
        let mut settings = self.get(ctx).await?;
        settings.apply(update, self.clock.now());
        validate_settings(&settings)?;

        let saved = self.catalog.save_tenant_settings(&settings).await?;
        info!(
            tenant_id = %ctx.tenant_id,
            currency = %saved.currency,
            default_billing_type = %saved.default_billing_type,
            "Tenant settings updated"
        );
        Ok(saved)
    }
}

/// Stored settings for the tenant, falling back to defaults.
pub(crate) async fn effective_settings(
    catalog: &dyn CatalogStore,
    ctx: &TenantContext,
    clock: &dyn Clock,
) -> Result<TenantSettings, AppError> {
    Ok(catalog
        .tenant_settings(ctx.tenant_id)
        .await?
        .unwrap_or_else(|| TenantSettings::defaults_for(ctx.tenant_id, clock.now())))
}

fn validate_settings(settings: &TenantSettings) -> Result<(), AppError> {
    if settings.currency.trim().len() != 3 {
        return Err(AppError::validation(
            "currency must be a three-letter ISO 4217 code",
        ));
    }
    if settings.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        return Err(AppError::validation(format!(
            "utc_offset_minutes must be within ±{MAX_UTC_OFFSET_MINUTES}"
        )));
    }
    if settings.default_price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(AppError::validation("default_price must not be negative"));
    }
    Ok(())
}
