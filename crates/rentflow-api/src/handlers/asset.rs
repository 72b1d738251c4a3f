//! Asset catalog handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use rentflow_core::types::{ApiResponse, AssetId, PageRequest, PageResponse};
use rentflow_entity::asset::{Asset, UpdateAsset};
use rentflow_entity::rental::RentalSession;
use rentflow_service::AssetDetail;

use crate::dto::request::{AssetListQuery, CreateAssetBody};
use crate::error::ApiError;
use crate::extractors::{ApiJson, PaginationParams, Tenant, ValidatedJson};
use crate::state::AppState;

/// GET /api/v1/assets?category_id=&page=&per_page=
pub async fn list_assets(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<AssetListQuery>,
) -> Result<Json<ApiResponse<PageResponse<Asset>>>, ApiError> {
    let page = PageRequest::new(query.page, query.per_page);
    let assets = state.assets.list(&tenant, query.category_id, page).await?;
    Ok(Json(ApiResponse::ok(assets)))
}

/// GET /api/v1/assets/{id}
pub async fn get_asset(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<AssetId>,
) -> Result<Json<ApiResponse<AssetDetail>>, ApiError> {
    let detail = state.assets.detail(&tenant, id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// POST /api/v1/assets
pub async fn create_asset(
    State(state): State<AppState>,
    tenant: Tenant,
    ValidatedJson(body): ValidatedJson<CreateAssetBody>,
) -> Result<(StatusCode, Json<ApiResponse<Asset>>), ApiError> {
    let asset = state.assets.create(&tenant, body.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(asset))))
}

/// PATCH /api/v1/assets/{id}
pub async fn update_asset(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<AssetId>,
    ApiJson(update): ApiJson<UpdateAsset>,
) -> Result<Json<ApiResponse<Asset>>, ApiError> {
    let asset = state.assets.update(&tenant, id, update).await?;
    Ok(Json(ApiResponse::ok(asset)))
}

/// DELETE /api/v1/assets/{id}
pub async fn delete_asset(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<AssetId>,
) -> Result<StatusCode, ApiError> {
    state.assets.delete(&tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/assets/{id}/sessions
pub async fn asset_sessions(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<AssetId>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<RentalSession>>>, ApiError> {
    let sessions = state
        .sessions
        .asset_sessions(&tenant, id, page.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(sessions)))
}
