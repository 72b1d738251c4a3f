//! Occupancy guard trait and shared types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rentflow_core::error::AppError;
use rentflow_core::types::{AssetId, RentalSessionId, TenantId};

/// Which session holds an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    /// The occupied asset.
    pub asset_id: AssetId,
    /// The holding session.
    pub session_id: RentalSessionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// When the hold was taken.
    pub acquired_at: DateTime<Utc>,
}

/// Atomic check-and-set over asset occupancy.
///
/// Implementations must be linearizable per asset: of two concurrent
/// acquisitions for the same asset exactly one succeeds.
#[async_trait]
pub trait OccupancyGuard: Send + Sync + std::fmt::Debug {
    /// Take the asset for `session_id`.
    ///
    /// Returns `true` if the hold was taken or is already held by the same
    /// session, `false` if another session holds it.
    async fn try_acquire(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
        session_id: RentalSessionId,
    ) -> Result<bool, AppError>;

    /// Release the asset if `session_id` holds it. Returns whether a hold was removed.
    async fn release(&self, asset_id: AssetId, session_id: RentalSessionId)
    -> Result<bool, AppError>;

    /// The session currently holding the asset.
    async fn holder(&self, asset_id: AssetId) -> Result<Option<RentalSessionId>, AppError>;

    /// Every current hold.
    async fn records(&self) -> Result<Vec<OccupancyRecord>, AppError>;
}
