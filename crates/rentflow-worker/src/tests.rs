use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

use rentflow_core::config::WorkerConfig;
use rentflow_core::error::ErrorKind;
use rentflow_core::traits::ManualClock;
use rentflow_core::types::{CustomFields, RentalSessionId, TenantId};
use rentflow_database::{CatalogStore, MemoryStore, RentalLedger};
use rentflow_entity::asset::{Asset, CreateAsset};
use rentflow_entity::rental::SessionStatus;
use rentflow_service::{
    OccupancyReconciler, RentalSessionService, StartSessionRequest, TenantContext,
};

use crate::executor::{JobExecutionError, JobRun};
use crate::jobs::{OCCUPANCY_RECONCILIATION, SESSION_EXPIRY};
use crate::scheduler::{CronScheduler, run_once};
use crate::{JobExecutor, default_executor};

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
}

struct Fixture {
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    sessions: RentalSessionService,
    executor: Arc<JobExecutor>,
    ctx: TenantContext,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(noon()));
    let sessions = RentalSessionService::new(store.clone(), store.clone(), clock.clone());
    let executor = default_executor(sessions.clone(), OccupancyReconciler::new(store.clone()));
    Fixture {
        store,
        clock,
        sessions,
        executor: Arc::new(executor),
        ctx: TenantContext::new(TenantId::new()),
    }
}

async fn planned_session(f: &Fixture, minutes: i32) -> RentalSessionId {
    let asset = Asset::from_create(
        f.ctx.tenant_id,
        CreateAsset {
            name: "Karaoke room".into(),
            category_id: None,
            description: None,
            sort_order: None,
            is_active: None,
            custom_fields: None,
        },
        noon(),
    );
    let asset = f.store.insert_asset(&asset).await.unwrap();
    let session = f
        .sessions
        .start(
            &f.ctx,
            StartSessionRequest {
                asset_id: asset.id,
                planned_duration: Some(minutes),
                fixed_price: Some(dec!(50000)),
                metadata: CustomFields::new(),
            },
        )
        .await
        .unwrap();
    session.id
}

#[test]
fn test_default_executor_registers_both_jobs() {
    let f = fixture();
    assert_eq!(
        f.executor.registered_types(),
        vec![
            OCCUPANCY_RECONCILIATION.to_string(),
            SESSION_EXPIRY.to_string()
        ]
    );
}

#[tokio::test]
async fn test_unknown_job_type_is_permanent() {
    let f = fixture();
    let err = f
        .executor
        .execute(&JobRun::now("nightly_report"))
        .await
        .unwrap_err();
    assert!(matches!(err, JobExecutionError::Permanent(_)));
}

#[tokio::test]
async fn test_expiry_job_closes_overdue_sessions() {
    let f = fixture();
    let id = planned_session(&f, 30).await;

    let result = f
        .executor
        .execute(&JobRun::now(SESSION_EXPIRY))
        .await
        .unwrap();
    assert_eq!(result["expired"], 0);

    f.clock.advance(Duration::minutes(31));
    let result = f
        .executor
        .execute(&JobRun::now(SESSION_EXPIRY))
        .await
        .unwrap();
    assert_eq!(result["scanned"], 1);
    assert_eq!(result["expired"], 1);

    let session = f.sessions.get(&f.ctx, id).await.unwrap();
    assert_eq!(session.status, SessionStatus::Expired);
    assert_eq!(session.total_cost, Some(dec!(50000)));
}

#[tokio::test]
async fn test_reconcile_job_reports_drift() {
    let f = fixture();
    let id = planned_session(&f, 60).await;
    let session = f.sessions.get(&f.ctx, id).await.unwrap();
    f.store
        .occupancy()
        .release(session.asset_id, session.id)
        .await
        .unwrap();

    let result = run_once(&f.executor, JobRun::now(OCCUPANCY_RECONCILIATION))
        .await
        .unwrap();
    assert_eq!(result["drift_detected"], true);
    assert_eq!(result["report"]["reacquired"], 1);

    let result = run_once(&f.executor, JobRun::now(OCCUPANCY_RECONCILIATION))
        .await
        .unwrap();
    assert_eq!(result["drift_detected"], false);
}

#[test]
fn test_database_errors_are_transient() {
    let err = JobExecutionError::from_service(rentflow_core::AppError::database("pool timed out"));
    assert!(matches!(err, JobExecutionError::Transient(_)));

    let err = JobExecutionError::from_service(rentflow_core::AppError::validation("bad"));
    match err {
        JobExecutionError::Internal(inner) => assert_eq!(inner.kind, ErrorKind::Validation),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_scheduler_accepts_default_config() {
    let f = fixture();
    let scheduler = CronScheduler::new(f.executor.clone()).await.unwrap();
    scheduler
        .register_default_tasks(&WorkerConfig::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_scheduler_rejects_bad_schedules() {
    let f = fixture();
    let scheduler = CronScheduler::new(f.executor.clone()).await.unwrap();

    let err = scheduler.schedule("nightly_report", "0 0 * * * *").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);

    let err = scheduler.schedule(SESSION_EXPIRY, "every minute").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);
}
