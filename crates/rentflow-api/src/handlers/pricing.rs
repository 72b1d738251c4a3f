//! Pricing rule handlers and rate quotes.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use rentflow_core::types::{ApiResponse, PricingRuleId};
use rentflow_entity::pricing::{CreatePricingRule, PricingRule, UpdatePricingRule};
use rentflow_service::PriceQuote;

use crate::dto::request::QuoteQuery;
use crate::error::ApiError;
use crate::extractors::{ApiJson, Tenant};
use crate::state::AppState;

/// GET /api/v1/pricing/rules
pub async fn list_rules(
    State(state): State<AppState>,
    tenant: Tenant,
) -> Result<Json<ApiResponse<Vec<PricingRule>>>, ApiError> {
    let rules = state.pricing.list(&tenant).await?;
    Ok(Json(ApiResponse::ok(rules)))
}

/// GET /api/v1/pricing/rules/{id}
pub async fn get_rule(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<PricingRuleId>,
) -> Result<Json<ApiResponse<PricingRule>>, ApiError> {
    let rule = state.pricing.get(&tenant, id).await?;
    Ok(Json(ApiResponse::ok(rule)))
}

/// POST /api/v1/pricing/rules
pub async fn create_rule(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(data): ApiJson<CreatePricingRule>,
) -> Result<(StatusCode, Json<ApiResponse<PricingRule>>), ApiError> {
    let rule = state.pricing.create(&tenant, data).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(rule))))
}

/// PATCH /api/v1/pricing/rules/{id}
pub async fn update_rule(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<PricingRuleId>,
    ApiJson(update): ApiJson<UpdatePricingRule>,
) -> Result<Json<ApiResponse<PricingRule>>, ApiError> {
    let rule = state.pricing.update(&tenant, id, update).await?;
    Ok(Json(ApiResponse::ok(rule)))
}

/// DELETE /api/v1/pricing/rules/{id}
pub async fn delete_rule(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<PricingRuleId>,
) -> Result<StatusCode, ApiError> {
    state.pricing.delete(&tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/pricing/quote?asset_id=&at=
pub async fn quote(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<ApiResponse<PriceQuote>>, ApiError> {
    let quote = state.pricing.quote(&tenant, query.asset_id, query.at).await?;
    Ok(Json(ApiResponse::ok(quote)))
}
