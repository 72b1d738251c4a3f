//! PostgreSQL occupancy guard over the `asset_occupancy` table.
//!
//! The primary key on `asset_id` makes `INSERT ... ON CONFLICT DO NOTHING`
//! an atomic check-and-set. The lifecycle transactions call the `*_in`
//! functions on their own connection; the trait methods run standalone and
//! serve the reconciliation job.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};

use rentflow_billing::occupancy::{OccupancyGuard, OccupancyRecord};
use rentflow_core::error::{AppError, ErrorKind};
use rentflow_core::result::AppResult;
use rentflow_core::types::{AssetId, RentalSessionId, TenantId};

use super::is_foreign_key_violation;

#[derive(Debug, FromRow)]
struct OccupancyRow {
    asset_id: AssetId,
    session_id: RentalSessionId,
    tenant_id: TenantId,
    acquired_at: DateTime<Utc>,
}

impl From<OccupancyRow> for OccupancyRecord {
    fn from(row: OccupancyRow) -> Self {
        Self {
            asset_id: row.asset_id,
            session_id: row.session_id,
            tenant_id: row.tenant_id,
            acquired_at: row.acquired_at,
        }
    }
}

/// Occupancy guard backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgOccupancyGuard {
    pool: PgPool,
}

impl PgOccupancyGuard {
    /// Create a new guard.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Take the asset on an existing connection or transaction.
    pub async fn acquire_in(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        asset_id: AssetId,
        session_id: RentalSessionId,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO asset_occupancy (asset_id, session_id, tenant_id, acquired_at) \
             VALUES ($1, $2, $3, NOW()) ON CONFLICT (asset_id) DO NOTHING",
        )
        .bind(asset_id)
        .bind(session_id)
        .bind(tenant_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found(format!("Asset {asset_id} not found"))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to acquire occupancy", e)
            }
        })?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Re-acquiring for the holder is a no-op success.
        let holder: Option<RentalSessionId> =
            sqlx::query_scalar("SELECT session_id FROM asset_occupancy WHERE asset_id = $1")
                .bind(asset_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to read occupancy", e)
                })?;
        Ok(holder == Some(session_id))
    }

    /// Release the asset on an existing connection or transaction.
    pub async fn release_in(
        conn: &mut PgConnection,
        asset_id: AssetId,
        session_id: RentalSessionId,
    ) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM asset_occupancy WHERE asset_id = $1 AND session_id = $2")
                .bind(asset_id)
                .bind(session_id)
                .execute(conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to release occupancy", e)
                })?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OccupancyGuard for PgOccupancyGuard {
    async fn try_acquire(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
        session_id: RentalSessionId,
    ) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })?;
        Self::acquire_in(&mut *conn, tenant_id, asset_id, session_id).await
    }

    async fn release(
        &self,
        asset_id: AssetId,
        session_id: RentalSessionId,
    ) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })?;
        Self::release_in(&mut *conn, asset_id, session_id).await
    }

    async fn holder(&self, asset_id: AssetId) -> Result<Option<RentalSessionId>, AppError> {
        sqlx::query_scalar("SELECT session_id FROM asset_occupancy WHERE asset_id = $1")
            .bind(asset_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read occupancy", e))
    }

    async fn records(&self) -> Result<Vec<OccupancyRecord>, AppError> {
        let rows = sqlx::query_as::<_, OccupancyRow>(
            "SELECT asset_id, session_id, tenant_id, acquired_at FROM asset_occupancy",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list occupancy", e))?;
        Ok(rows.into_iter().map(OccupancyRecord::from).collect())
    }
}
