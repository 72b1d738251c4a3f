//! Promotion handlers and code validation.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use rentflow_billing::promotion::PromotionOutcome;
use rentflow_core::types::{ApiResponse, PromotionId};
use rentflow_entity::promotion::{CreatePromotion, Promotion, UpdatePromotion};

use crate::dto::request::ValidatePromotionBody;
use crate::error::ApiError;
use crate::extractors::{ApiJson, Tenant, ValidatedJson};
use crate::state::AppState;

/// GET /api/v1/promotions
pub async fn list_promotions(
    State(state): State<AppState>,
    tenant: Tenant,
) -> Result<Json<ApiResponse<Vec<Promotion>>>, ApiError> {
    let promotions = state.promotions.list(&tenant).await?;
    Ok(Json(ApiResponse::ok(promotions)))
}

/// GET /api/v1/promotions/{id}
pub async fn get_promotion(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<PromotionId>,
) -> Result<Json<ApiResponse<Promotion>>, ApiError> {
    let promotion = state.promotions.get(&tenant, id).await?;
    Ok(Json(ApiResponse::ok(promotion)))
}

/// POST /api/v1/promotions
pub async fn create_promotion(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(data): ApiJson<CreatePromotion>,
) -> Result<(StatusCode, Json<ApiResponse<Promotion>>), ApiError> {
    let promotion = state.promotions.create(&tenant, data).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(promotion))))
}

/// PATCH /api/v1/promotions/{id}
pub async fn update_promotion(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<PromotionId>,
    ApiJson(update): ApiJson<UpdatePromotion>,
) -> Result<Json<ApiResponse<Promotion>>, ApiError> {
    let promotion = state.promotions.update(&tenant, id, update).await?;
    Ok(Json(ApiResponse::ok(promotion)))
}

/// DELETE /api/v1/promotions/{id}
pub async fn delete_promotion(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<PromotionId>,
) -> Result<StatusCode, ApiError> {
    state.promotions.delete(&tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/promotions/validate
///
/// A rejected code is still a 200; the outcome carries the reason.
pub async fn validate_code(
    State(state): State<AppState>,
    tenant: Tenant,
    ValidatedJson(body): ValidatedJson<ValidatePromotionBody>,
) -> Result<Json<ApiResponse<PromotionOutcome>>, ApiError> {
    let outcome = state
        .promotions
        .validate(&tenant, &body.code, body.session_id)
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}
