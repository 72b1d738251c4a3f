//! Route definitions for the RentFlow HTTP API.
//!
//! All routes are organized by domain and mounted under `/api/v1`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;

    let api_routes = Router::new()
        .merge(session_routes())
        .merge(asset_routes())
        .merge(category_routes())
        .merge(pricing_routes())
        .merge(promotion_routes())
        .merge(tenant_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds,
        )))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors::build_cors_layer(&server.cors))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Session lifecycle, reads, and running cost
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(handlers::session::list_sessions))
        .route("/sessions/start", post(handlers::session::start_session))
        .route("/sessions/{id}", get(handlers::session::get_session))
        .route("/sessions/{id}/stop", post(handlers::session::stop_session))
        .route(
            "/sessions/{id}/cancel",
            post(handlers::session::cancel_session),
        )
        .route("/sessions/{id}/cost", get(handlers::session::session_cost))
}

/// Asset CRUD and history
fn asset_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/assets",
            get(handlers::asset::list_assets).post(handlers::asset::create_asset),
        )
        .route(
            "/assets/{id}",
            get(handlers::asset::get_asset)
                .patch(handlers::asset::update_asset)
                .delete(handlers::asset::delete_asset),
        )
        .route(
            "/assets/{id}/sessions",
            get(handlers::asset::asset_sessions),
        )
}

/// Category CRUD
fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(handlers::category::list_categories).post(handlers::category::create_category),
        )
        .route(
            "/categories/{id}",
            get(handlers::category::get_category)
                .patch(handlers::category::update_category)
                .delete(handlers::category::delete_category),
        )
}

/// Pricing rule CRUD and quotes
fn pricing_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/pricing/rules",
            get(handlers::pricing::list_rules).post(handlers::pricing::create_rule),
        )
        .route(
            "/pricing/rules/{id}",
            get(handlers::pricing::get_rule)
                .patch(handlers::pricing::update_rule)
                .delete(handlers::pricing::delete_rule),
        )
        .route("/pricing/quote", get(handlers::pricing::quote))
}

/// Promotion CRUD and code validation
fn promotion_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/promotions",
            get(handlers::promotion::list_promotions).post(handlers::promotion::create_promotion),
        )
        .route(
            "/promotions/validate",
            post(handlers::promotion::validate_code),
        )
        .route(
            "/promotions/{id}",
            get(handlers::promotion::get_promotion)
                .patch(handlers::promotion::update_promotion)
                .delete(handlers::promotion::delete_promotion),
        )
}

/// Tenant settings
fn tenant_routes() -> Router<AppState> {
    Router::new().route(
        "/tenant/settings",
        get(handlers::tenant::get_settings).put(handlers::tenant::update_settings),
    )
}

/// Liveness and readiness
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
