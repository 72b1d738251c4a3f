//! Expires planned sessions that ran past their end.

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use rentflow_core::error::AppError;
use rentflow_service::RentalSessionService;

use crate::executor::{JobExecutionError, JobHandler, JobRun};

/// Job type name.
pub const SESSION_EXPIRY: &str = "session_expiry";

/// Handles the `session_expiry` sweep
#[derive(Debug)]
pub struct SessionExpiryHandler {
    /// Lifecycle service, configured with the expiry grace
    sessions: RentalSessionService,
}

impl SessionExpiryHandler {
    /// Create a new expiry handler
    pub fn new(sessions: RentalSessionService) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl JobHandler for SessionExpiryHandler {
    fn job_type(&self) -> &str {
        SESSION_EXPIRY
    }

    async fn execute(&self, run: &JobRun) -> Result<Value, JobExecutionError> {
        let summary = self
            .sessions
            .expire_overdue()
            .await
            .map_err(JobExecutionError::from_service)?;

        if summary.failed > 0 {
            tracing::warn!(
                run_id = %run.id,
                failed = summary.failed,
                "Some overdue sessions could not be expired"
            );
        }

        serde_json::to_value(summary).map_err(|e| JobExecutionError::Internal(AppError::from(e)))
    }
}
