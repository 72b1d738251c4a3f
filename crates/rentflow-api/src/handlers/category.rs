//! Category catalog handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use rentflow_core::types::{ApiResponse, CategoryId};
use rentflow_entity::category::{Category, UpdateCategory};

use crate::dto::request::CreateCategoryBody;
use crate::error::ApiError;
use crate::extractors::{ApiJson, Tenant, ValidatedJson};
use crate::state::AppState;

/// GET /api/v1/categories
pub async fn list_categories(
    State(state): State<AppState>,
    tenant: Tenant,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = state.categories.list(&tenant).await?;
    Ok(Json(ApiResponse::ok(categories)))
}

/// GET /api/v1/categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<CategoryId>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = state.categories.get(&tenant, id).await?;
    Ok(Json(ApiResponse::ok(category)))
}

/// POST /api/v1/categories
pub async fn create_category(
    State(state): State<AppState>,
    tenant: Tenant,
    ValidatedJson(body): ValidatedJson<CreateCategoryBody>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), ApiError> {
    let category = state.categories.create(&tenant, body.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(category))))
}

/// PATCH /api/v1/categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<CategoryId>,
    ApiJson(update): ApiJson<UpdateCategory>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = state.categories.update(&tenant, id, update).await?;
    Ok(Json(ApiResponse::ok(category)))
}

/// DELETE /api/v1/categories/{id}
pub async fn delete_category(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode, ApiError> {
    state.categories.delete(&tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
