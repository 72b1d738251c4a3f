//! Occupancy reconciliation between the guard and session state.
//!
//! Detects and corrects drift left behind by crashes or manual edits:
//! occupancy held by a session that is no longer active, and active
//! sessions whose occupancy is missing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use rentflow_core::error::AppError;
use rentflow_database::RentalLedger;

/// What one reconciliation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Holds checked.
    pub holds: usize,
    /// Active sessions checked.
    pub active_sessions: usize,
    /// Stale holds released.
    pub released: usize,
    /// Missing holds restored.
    pub reacquired: usize,
    /// Active sessions whose asset is held by a different session.
    pub conflicts: usize,
}

impl ReconcileReport {
    /// Whether any drift was found.
    pub fn drift_detected(&self) -> bool {
        self.released > 0 || self.reacquired > 0 || self.conflicts > 0
    }
}

/// Reconciles the occupancy guard with the rental ledger.
#[derive(Debug, Clone)]
pub struct OccupancyReconciler {
    ledger: Arc<dyn RentalLedger>,
}

impl OccupancyReconciler {
    /// Creates a new reconciler.
    pub fn new(ledger: Arc<dyn RentalLedger>) -> Self {
        Self { ledger }
    }

    /// Performs a full reconciliation cycle:
    ///
    /// 1. Snapshot the holds, then the active sessions.
    /// 2. Release holds whose session is not active.
    /// 3. Re-acquire holds for active sessions that lack one.
    ///
    /// Holds are read first so a session started in between is seen as
    /// active and its fresh hold is never released.
    pub async fn reconcile(&self) -> Result<ReconcileReport, AppError> {
        let guard = self.ledger.occupancy();
        let holds = guard.records().await?;
        let active = self.ledger.list_active_sessions().await?;

        let mut report = ReconcileReport {
            holds: holds.len(),
            active_sessions: active.len(),
            ..ReconcileReport::default()
        };

        let active_ids: HashSet<_> = active.iter().map(|s| s.id).collect();
        let held: HashMap<_, _> = holds.iter().map(|r| (r.asset_id, r.session_id)).collect();

        for record in &holds {
            if active_ids.contains(&record.session_id) {
                continue;
            }
            // The session may have started after the snapshot; confirm first.
            let still_active = self
                .ledger
                .find_session(record.tenant_id, record.session_id)
                .await?
                .is_some_and(|s| s.is_active());
            if still_active {
                continue;
            }
            if guard.release(record.asset_id, record.session_id).await? {
                warn!(
                    asset_id = %record.asset_id,
                    session_id = %record.session_id,
                    "Released stale occupancy"
                );
                report.released += 1;
            }
        }

        for session in &active {
            match held.get(&session.asset_id) {
                Some(holder) if *holder == session.id => {}
                Some(holder) => {
                    warn!(
                        asset_id = %session.asset_id,
                        session_id = %session.id,
                        holder = %holder,
                        "Active session's asset is held by another session"
                    );
                    report.conflicts += 1;
                }
                None => {
                    if guard
                        .try_acquire(session.tenant_id, session.asset_id, session.id)
                        .await?
                    {
                        warn!(
                            asset_id = %session.asset_id,
                            session_id = %session.id,
                            "Restored missing occupancy"
                        );
                        report.reacquired += 1;
                    } else {
                        report.conflicts += 1;
                    }
                }
            }
        }

        if report.drift_detected() {
            info!(
                released = report.released,
                reacquired = report.reacquired,
                conflicts = report.conflicts,
                "Occupancy reconciliation corrected drift"
            );
        }
        Ok(report)
    }
}
