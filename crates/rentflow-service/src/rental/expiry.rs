//! System-initiated expiry of planned sessions that ran past their end.

use chrono::Duration;
use tracing::{debug, error, info};

use rentflow_billing::accrual::compute_final_cost;
use rentflow_core::error::{AppError, ErrorKind};
use rentflow_core::types::RentalSessionId;
use rentflow_entity::rental::{RentalSession, SessionClosure};

use super::request::ExpirySummary;
use super::service::RentalSessionService;
use crate::context::TenantContext;

impl RentalSessionService {
    /// Expires one overdue session.
    ///
    /// The session is billed for its planned duration and `ended_at` is the
    /// planned end, not the moment the sweep noticed it.
    pub async fn expire(
        &self,
        ctx: &TenantContext,
        id: RentalSessionId,
    ) -> Result<RentalSession, AppError> {
        let session = self.require_open(ctx, id).await?;
        let Some(planned_end) = session.planned_end() else {
            return Err(AppError::validation(format!(
                "Session {id} is open-ended and cannot expire"
            )));
        };
        let due = planned_end + Duration::minutes(self.expiry_grace_minutes);
        if self.clock.now() < due {
            return Err(AppError::validation(format!(
                "Session {id} is not due to expire before {due}"
            )));
        }

        self.close_expired(&session).await
    }

    /// Expires every overdue session across all tenants.
    pub async fn expire_overdue(&self) -> Result<ExpirySummary, AppError> {
        let now = self.clock.now();
        let overdue = self
            .ledger
            .find_overdue_sessions(now, self.expiry_grace_minutes)
            .await?;

        let mut summary = ExpirySummary {
            scanned: overdue.len(),
            ..ExpirySummary::default()
        };

        for session in &overdue {
            match self.close_expired(session).await {
                Ok(_) => summary.expired += 1,
                Err(e) if e.kind == ErrorKind::SessionNotActive => {
                    debug!(session_id = %session.id, "Session closed before expiry");
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!(session_id = %session.id, error = %e, "Failed to expire session");
                    summary.failed += 1;
                }
            }
        }

        if summary.scanned > 0 {
            info!(
                scanned = summary.scanned,
                expired = summary.expired,
                skipped = summary.skipped,
                failed = summary.failed,
                "Expiry sweep completed"
            );
        }
        Ok(summary)
    }

    async fn close_expired(&self, session: &RentalSession) -> Result<RentalSession, AppError> {
        let planned = session.planned_duration.unwrap_or(0);
        let ended_at = session.planned_end().unwrap_or(session.started_at);
        let subtotal = compute_final_cost(
            planned,
            session.price_snapshot,
            session.billing_type,
            None,
            session.min_duration,
        );

        let closure = SessionClosure::expired(session, ended_at, planned, subtotal);
        let closed = self.ledger.close_session(closure).await?;

        info!(
            tenant_id = %session.tenant_id,
            session_id = %session.id,
            asset_id = %session.asset_id,
            planned_duration = planned,
            total_cost = %subtotal,
            "Rental session expired"
        );
        Ok(closed.session)
    }
}
