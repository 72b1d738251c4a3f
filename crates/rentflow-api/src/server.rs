//! Server runner: wires persistence, services, worker, and router, then serves.

use std::sync::Arc;
use std::time::Duration;

use rentflow_core::config::AppConfig;
use rentflow_core::error::AppError;
use rentflow_core::traits::SystemClock;
use rentflow_database::Persistence;
use rentflow_service::OccupancyReconciler;
use rentflow_worker::jobs::OCCUPANCY_RECONCILIATION;
use rentflow_worker::{CronScheduler, JobRun, default_executor, run_once};

use crate::router::build_router;
use crate::state::AppState;

/// Runs the RentFlow server until Ctrl+C or SIGTERM.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting RentFlow server...");

    // ── Step 1: Persistence ──────────────────────────────────────
    let persistence = Persistence::connect(&config.database).await?;

    // ── Step 2: Services ─────────────────────────────────────────
    let state = AppState::new(config.clone(), persistence.clone(), Arc::new(SystemClock));

    // ── Step 3: Worker ───────────────────────────────────────────
    let mut scheduler = if config.worker.enabled {
        let executor = Arc::new(default_executor(
            state.sessions.as_ref().clone(),
            OccupancyReconciler::new(Arc::clone(&persistence.ledger)),
        ));

        // Repair drift left by an unclean shutdown before accepting traffic.
        run_once(&executor, JobRun::now(OCCUPANCY_RECONCILIATION)).await;

        let scheduler = CronScheduler::new(executor).await?;
        scheduler.register_default_tasks(&config.worker).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Worker disabled; overdue sessions will not expire automatically");
        None
    };

    // ── Step 4: HTTP server ──────────────────────────────────────
    let app = build_router(state);
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("RentFlow server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 5: Drain ────────────────────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if let Some(scheduler) = scheduler.as_mut() {
        match tokio::time::timeout(grace, scheduler.shutdown()).await {
            Ok(result) => result?,
            Err(_) => tracing::warn!("Scheduler did not stop within {:?}", grace),
        }
    }
    persistence.close().await;

    tracing::info!("RentFlow server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
