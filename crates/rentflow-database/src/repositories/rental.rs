//! Rental session repository implementation.
//!
//! Opening and closing a session each run in one transaction together with
//! the `asset_occupancy` row and, on close, the promotion redemption.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use rentflow_core::error::{AppError, ErrorKind};
use rentflow_core::result::AppResult;
use rentflow_core::types::{AssetId, PageRequest, PageResponse, RentalSessionId, TenantId};
use rentflow_entity::rental::{
    ClosedSession, NewRentalSession, RentalSession, SessionClosure, SessionFilter, SessionStatus,
};

use super::occupancy::PgOccupancyGuard;
use super::promotion::PromotionRepository;
use super::{is_foreign_key_violation, is_unique_violation};

/// Repository for rental sessions.
#[derive(Debug, Clone)]
pub struct RentalSessionRepository {
    pool: PgPool,
}

impl RentalSessionRepository {
    /// Create a new rental session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Take occupancy and insert the active session in one transaction.
    pub async fn open(&self, new: NewRentalSession) -> AppResult<RentalSession> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let acquired =
            PgOccupancyGuard::acquire_in(&mut *tx, new.tenant_id, new.asset_id, new.id).await?;
        if !acquired {
            return Err(AppError::asset_occupied(format!(
                "Asset {} already has an active session",
                new.asset_id
            )));
        }

        let session = RentalSession::from_new(new);
        let inserted = sqlx::query_as::<_, RentalSession>(
            "INSERT INTO rental_sessions \
             (id, tenant_id, asset_id, started_at, planned_duration, billing_type, \
              price_snapshot, pricing_rule_id, min_duration, discount_amount, status, \
              metadata, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING *",
        )
        .bind(session.id)
        .bind(session.tenant_id)
        .bind(session.asset_id)
        .bind(session.started_at)
        .bind(session.planned_duration)
        .bind(session.billing_type)
        .bind(session.price_snapshot)
        .bind(session.pricing_rule_id)
        .bind(session.min_duration)
        .bind(session.discount_amount)
        .bind(session.status)
        .bind(Json(&session.metadata))
        .bind(session.created_at)
        .bind(session.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::asset_occupied(format!(
                    "Asset {} already has an active session",
                    session.asset_id
                ))
            } else if is_foreign_key_violation(&e) {
                AppError::not_found(format!("Asset {} not found", session.asset_id))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to insert rental session", e)
            }
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit session start", e)
        })?;

        Ok(inserted)
    }

    /// Apply a closing transition if the session is still active.
    pub async fn close(&self, closure: SessionClosure) -> AppResult<ClosedSession> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let mut closure = closure;
        let mut promotion_claimed = false;
        if let Some(promotion_id) = closure.promotion_id {
            promotion_claimed = PromotionRepository::claim_usage(
                &mut *tx,
                closure.tenant_id,
                promotion_id,
                closure.ended_at,
            )
            .await?;
            if !promotion_claimed {
                closure = closure.without_promotion();
            }
        }

        let updated = sqlx::query_as::<_, RentalSession>(
            "UPDATE rental_sessions SET status = $3, ended_at = $4, actual_duration = $5, \
             subtotal = $6, discount_amount = $7, total_cost = $8, promotion_id = $9, \
             units = $10, payment_type = $11, updated_at = $4 \
             WHERE id = $1 AND tenant_id = $2 AND status = 'active' RETURNING *",
        )
        .bind(closure.session_id)
        .bind(closure.tenant_id)
        .bind(closure.status)
        .bind(closure.ended_at)
        .bind(closure.actual_duration)
        .bind(closure.subtotal)
        .bind(closure.discount_amount)
        .bind(closure.total_cost)
        .bind(closure.promotion_id)
        .bind(closure.units)
        .bind(closure.payment_type)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to close rental session", e)
        })?;

        let Some(session) = updated else {
            // Dropping the transaction rolls back the redemption claim.
            let status: Option<SessionStatus> = sqlx::query_scalar(
                "SELECT status FROM rental_sessions WHERE id = $1 AND tenant_id = $2",
            )
            .bind(closure.session_id)
            .bind(closure.tenant_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read session status", e)
            })?;
            return Err(match status {
                None => AppError::not_found(format!("Session {} not found", closure.session_id)),
                Some(status) => AppError::session_not_active(format!(
                    "Session {} is already {status}",
                    closure.session_id
                )),
            });
        };

        PgOccupancyGuard::release_in(&mut *tx, session.asset_id, session.id).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit session close", e)
        })?;

        Ok(ClosedSession {
            session,
            promotion_claimed,
        })
    }

    /// Find a session by ID within a tenant.
    pub async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: RentalSessionId,
    ) -> AppResult<Option<RentalSession>> {
        sqlx::query_as::<_, RentalSession>(
            "SELECT * FROM rental_sessions WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    /// The active session on an asset.
    pub async fn find_active_for_asset(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
    ) -> AppResult<Option<RentalSession>> {
        sqlx::query_as::<_, RentalSession>(
            "SELECT * FROM rental_sessions \
             WHERE tenant_id = $1 AND asset_id = $2 AND status = 'active'",
        )
        .bind(tenant_id)
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find active session", e)
        })
    }

    /// Filtered, paginated listing, newest first.
    pub async fn find_by_tenant(
        &self,
        tenant_id: TenantId,
        filter: &SessionFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<RentalSession>> {
        const WHERE: &str = "WHERE tenant_id = $1 \
             AND ($2::uuid IS NULL OR asset_id = $2) \
             AND ($3::session_status IS NULL OR status = $3) \
             AND ($4::timestamptz IS NULL OR started_at >= $4) \
             AND ($5::timestamptz IS NULL OR started_at < $5)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM rental_sessions {WHERE}"))
            .bind(tenant_id)
            .bind(filter.asset_id)
            .bind(filter.status)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count sessions", e)
            })?;

        let sessions = sqlx::query_as::<_, RentalSession>(&format!(
            "SELECT * FROM rental_sessions {WHERE} \
             ORDER BY started_at DESC, id DESC LIMIT $6 OFFSET $7"
        ))
        .bind(tenant_id)
        .bind(filter.asset_id)
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list sessions", e))?;

        Ok(PageResponse::new(sessions, page, total as u64))
    }

    /// Whether any session references the asset.
    pub async fn exists_for_asset(&self, tenant_id: TenantId, asset_id: AssetId) -> AppResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM rental_sessions WHERE tenant_id = $1 AND asset_id = $2)",
        )
        .bind(tenant_id)
        .bind(asset_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to check asset sessions", e)
        })
    }

    /// Active planned sessions past their planned end plus grace.
    pub async fn find_overdue(
        &self,
        now: DateTime<Utc>,
        grace_minutes: i64,
    ) -> AppResult<Vec<RentalSession>> {
        let grace = i32::try_from(grace_minutes.max(0)).unwrap_or(i32::MAX);
        sqlx::query_as::<_, RentalSession>(
            "SELECT * FROM rental_sessions \
             WHERE status = 'active' AND planned_duration IS NOT NULL \
               AND started_at + make_interval(mins => planned_duration + $2) <= $1 \
             ORDER BY started_at",
        )
        .bind(now)
        .bind(grace)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find overdue sessions", e)
        })
    }

    /// Every active session across tenants.
    pub async fn find_all_active(&self) -> AppResult<Vec<RentalSession>> {
        sqlx::query_as::<_, RentalSession>(
            "SELECT * FROM rental_sessions WHERE status = 'active' ORDER BY started_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list active sessions", e)
        })
    }
}
