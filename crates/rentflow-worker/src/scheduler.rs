//! Cron scheduler for the periodic rental maintenance jobs.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use rentflow_core::config::WorkerConfig;
use rentflow_core::error::AppError;

use crate::executor::{JobExecutionError, JobExecutor, JobRun};
use crate::jobs::{OCCUPANCY_RECONCILIATION, SESSION_EXPIRY};

/// Cron-based scheduler that triggers registered job handlers
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Executor that owns the job handlers
    executor: Arc<JobExecutor>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("job_types", &self.executor.registered_types())
            .finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(executor: Arc<JobExecutor>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            executor,
        })
    }

    /// Register the expiry sweep and the occupancy reconciliation
    pub async fn register_default_tasks(&self, config: &WorkerConfig) -> Result<(), AppError> {
        self.schedule(SESSION_EXPIRY, &config.expiry_cron).await?;
        self.schedule(OCCUPANCY_RECONCILIATION, &config.occupancy_reconcile_cron)
            .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Run `job_type` through the executor on every tick of `cron`.
    pub async fn schedule(&self, job_type: &str, cron: &str) -> Result<(), AppError> {
        if !self.executor.has_handler(job_type) {
            return Err(AppError::configuration(format!(
                "No handler registered for scheduled job '{}'",
                job_type
            )));
        }

        let executor = Arc::clone(&self.executor);
        let name = job_type.to_string();
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let name = name.clone();
            Box::pin(async move {
                run_once(&executor, JobRun::now(name)).await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid schedule '{}' for {}: {}",
                cron, job_type, e
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add {} schedule: {}", job_type, e))
        })?;

        tracing::info!("Registered: {} ({})", job_type, cron);
        Ok(())
    }
}

/// Execute one run and log its outcome. Failures never stop the schedule.
pub async fn run_once(executor: &JobExecutor, run: JobRun) -> Option<serde_json::Value> {
    let started = std::time::Instant::now();
    match executor.execute(&run).await {
        Ok(result) => {
            tracing::info!(
                run_id = %run.id,
                job_type = %run.job_type,
                elapsed_ms = started.elapsed().as_millis() as u64,
                result = %result,
                "Job completed"
            );
            Some(result)
        }
        Err(JobExecutionError::Transient(msg)) => {
            tracing::warn!(
                run_id = %run.id,
                job_type = %run.job_type,
                "Job failed, will retry on next tick: {}",
                msg
            );
            None
        }
        Err(e) => {
            tracing::error!(run_id = %run.id, job_type = %run.job_type, "Job failed: {}", e);
            None
        }
    }
}
