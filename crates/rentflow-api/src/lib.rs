//! # rentflow-api
//!
//! HTTP API layer for RentFlow built on Axum.
//!
//! Provides the `/api/v1` REST endpoints, middleware (request logging,
//! CORS, compression, timeouts), extractors (tenant header, validated JSON,
//! pagination), DTOs, error mapping, and the server runner.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;
pub mod telemetry;

pub use error::ApiError;
pub use router::build_router;
pub use server::run_server;
pub use state::AppState;
pub use telemetry::init_logging;

#[cfg(test)]
mod tests;
