//! Background reconciliation configuration.

use serde::{Deserialize, Serialize};

/// Cron-driven reconciliation jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler is started with the server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Six-field cron expression for the session expiry sweep.
    #[serde(default = "default_expiry_cron")]
    pub expiry_cron: String,
    /// Minutes past the planned duration before a session is expired.
    #[serde(default)]
    pub expiry_grace_minutes: i64,
    /// Six-field cron expression for occupancy drift detection.
    #[serde(default = "default_occupancy_cron")]
    pub occupancy_reconcile_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            expiry_cron: default_expiry_cron(),
            expiry_grace_minutes: 0,
            occupancy_reconcile_cron: default_occupancy_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_expiry_cron() -> String {
    "0 * * * * *".to_string()
}

fn default_occupancy_cron() -> String {
    "0 */15 * * * *".to_string()
}
