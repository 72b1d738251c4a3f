//! Response DTOs.

use serde::{Deserialize, Serialize};

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since the state was built.
    pub uptime_seconds: u64,
}

/// Readiness response with backend details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// `"ok"` or `"degraded"`.
    pub status: String,
    /// `"postgres"` or `"memory"`.
    pub backend: String,
    /// `"connected"` or `"unreachable"`.
    pub database: String,
    /// Assets currently held by an active session.
    pub occupied_assets: usize,
    /// Whether the expiry and reconciliation jobs run in this process.
    pub worker_enabled: bool,
}
