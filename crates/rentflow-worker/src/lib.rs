//! Scheduled background jobs for RentFlow.
//!
//! This crate provides:
//! - A job executor that dispatches runs to the correct handler
//! - A cron scheduler that triggers handlers on their configured schedule
//! - The session expiry sweep and the occupancy reconciliation pass

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler, JobRun};
pub use scheduler::{CronScheduler, run_once};

use std::sync::Arc;

use rentflow_service::{OccupancyReconciler, RentalSessionService};

/// Executor with both built-in handlers registered.
pub fn default_executor(
    sessions: RentalSessionService,
    reconciler: OccupancyReconciler,
) -> JobExecutor {
    let mut executor = JobExecutor::new();
    executor.register(Arc::new(jobs::SessionExpiryHandler::new(sessions)));
    executor.register(Arc::new(jobs::OccupancyReconcileHandler::new(reconciler)));
    executor
}

#[cfg(test)]
mod tests;
