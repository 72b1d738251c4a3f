//! Rental session lifecycle handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use rentflow_core::types::{ApiResponse, PageResponse, RentalSessionId};
use rentflow_entity::rental::RentalSession;
use rentflow_service::{CostPreview, StoppedSession};

use crate::dto::request::{CostQuery, SessionListQuery, StartSessionBody, StopSessionBody};
use crate::error::ApiError;
use crate::extractors::{Tenant, ValidatedJson};
use crate::state::AppState;

/// POST /api/v1/sessions/start
pub async fn start_session(
    State(state): State<AppState>,
    tenant: Tenant,
    ValidatedJson(body): ValidatedJson<StartSessionBody>,
) -> Result<(StatusCode, Json<ApiResponse<RentalSession>>), ApiError> {
    let session = state.sessions.start(&tenant, body.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(session))))
}

/// POST /api/v1/sessions/{id}/stop
pub async fn stop_session(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<RentalSessionId>,
    ValidatedJson(body): ValidatedJson<StopSessionBody>,
) -> Result<Json<ApiResponse<StoppedSession>>, ApiError> {
    let stopped = state.sessions.stop(&tenant, id, body.into()).await?;
    Ok(Json(ApiResponse::ok(stopped)))
}

/// POST /api/v1/sessions/{id}/cancel
pub async fn cancel_session(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<RentalSessionId>,
) -> Result<Json<ApiResponse<RentalSession>>, ApiError> {
    let session = state.sessions.cancel(&tenant, id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// GET /api/v1/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<RentalSessionId>,
) -> Result<Json<ApiResponse<RentalSession>>, ApiError> {
    let session = state.sessions.get(&tenant, id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// GET /api/v1/sessions?asset=&status=&from=&to=&page=&per_page=
pub async fn list_sessions(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<ApiResponse<PageResponse<RentalSession>>>, ApiError> {
    let (filter, page) = query.into_parts();
    let sessions = state
        .sessions
        .list(&tenant, &filter, page.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(sessions)))
}

/// GET /api/v1/sessions/{id}/cost?units=
pub async fn session_cost(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<RentalSessionId>,
    Query(query): Query<CostQuery>,
) -> Result<Json<ApiResponse<CostPreview>>, ApiError> {
    let preview = state.sessions.running_cost(&tenant, id, query.units).await?;
    Ok(Json(ApiResponse::ok(preview)))
}
