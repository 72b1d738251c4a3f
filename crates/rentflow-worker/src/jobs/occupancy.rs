//! Occupancy drift detection and repair.

use async_trait::async_trait;
use serde_json::Value;

use rentflow_service::OccupancyReconciler;

use crate::executor::{JobExecutionError, JobHandler, JobRun};

/// Job type name.
pub const OCCUPANCY_RECONCILIATION: &str = "occupancy_reconciliation";

/// Handles the `occupancy_reconciliation` pass
#[derive(Debug)]
pub struct OccupancyReconcileHandler {
    reconciler: OccupancyReconciler,
}

impl OccupancyReconcileHandler {
    /// Create a new reconciliation handler
    pub fn new(reconciler: OccupancyReconciler) -> Self {
        Self { reconciler }
    }
}

#[async_trait]
impl JobHandler for OccupancyReconcileHandler {
    fn job_type(&self) -> &str {
        OCCUPANCY_RECONCILIATION
    }

    async fn execute(&self, _run: &JobRun) -> Result<Value, JobExecutionError> {
        let report = self
            .reconciler
            .reconcile()
            .await
            .map_err(JobExecutionError::from_service)?;

        Ok(serde_json::json!({
            "drift_detected": report.drift_detected(),
            "report": report,
        }))
    }
}
