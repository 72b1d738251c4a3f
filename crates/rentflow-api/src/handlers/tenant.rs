//! Tenant settings handlers.

use axum::Json;
use axum::extract::State;

use rentflow_core::types::ApiResponse;
use rentflow_entity::tenant::{TenantSettings, UpdateTenantSettings};

use crate::error::ApiError;
use crate::extractors::{ApiJson, Tenant};
use crate::state::AppState;

/// GET /api/v1/tenant/settings
pub async fn get_settings(
    State(state): State<AppState>,
    tenant: Tenant,
) -> Result<Json<ApiResponse<TenantSettings>>, ApiError> {
    let settings = state.tenant_settings.get(&tenant).await?;
    Ok(Json(ApiResponse::ok(settings)))
}

/// PUT /api/v1/tenant/settings
pub async fn update_settings(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(update): ApiJson<UpdateTenantSettings>,
) -> Result<Json<ApiResponse<TenantSettings>>, ApiError> {
    let settings = state.tenant_settings.update(&tenant, update).await?;
    Ok(Json(ApiResponse::ok(settings)))
}
