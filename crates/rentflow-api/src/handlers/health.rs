//! Health check handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use rentflow_core::types::ApiResponse;

use crate::dto::response::{DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/v1/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/v1/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<DetailedHealthResponse>>) {
    let reachable = match state.persistence.ledger.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            false
        }
    };
    let occupied_assets = match state.persistence.ledger.occupancy().records().await {
        Ok(records) => records.len(),
        Err(_) => 0,
    };

    let backend = if state.persistence.database.is_some() {
        "postgres"
    } else {
        "memory"
    };
    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::ok(DetailedHealthResponse {
            status: if reachable { "ok" } else { "degraded" }.to_string(),
            backend: backend.to_string(),
            database: if reachable { "connected" } else { "unreachable" }.to_string(),
            occupied_assets,
            worker_enabled: state.config.worker.enabled,
        })),
    )
}
