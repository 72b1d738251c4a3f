//! In-memory occupancy guard for single-node deployments.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, warn};

use rentflow_core::error::AppError;
use rentflow_core::types::{AssetId, RentalSessionId, TenantId};

use super::guard::{OccupancyGuard, OccupancyRecord};

/// Occupancy guard backed by a sharded concurrent map.
///
/// The vacant-entry insert holds the shard lock, so check-and-set is atomic
/// per asset. Suitable for single-node deployments only.
#[derive(Debug, Clone, Default)]
pub struct MemoryOccupancyGuard {
    holds: Arc<DashMap<AssetId, OccupancyRecord>>,
}

impl MemoryOccupancyGuard {
    /// Create an empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied assets.
    pub fn len(&self) -> usize {
        self.holds.len()
    }

    /// Whether no asset is occupied.
    pub fn is_empty(&self) -> bool {
        self.holds.is_empty()
    }
}

#[async_trait]
impl OccupancyGuard for MemoryOccupancyGuard {
    async fn try_acquire(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
        session_id: RentalSessionId,
    ) -> Result<bool, AppError> {
        match self.holds.entry(asset_id) {
            Entry::Occupied(held) => {
                let same = held.get().session_id == session_id;
                if !same {
                    debug!(
                        asset_id = %asset_id,
                        holder = %held.get().session_id,
                        "Asset already occupied"
                    );
                }
                Ok(same)
            }
            Entry::Vacant(slot) => {
                slot.insert(OccupancyRecord {
                    asset_id,
                    session_id,
                    tenant_id,
                    acquired_at: Utc::now(),
                });
                Ok(true)
            }
        }
    }

    async fn release(
        &self,
        asset_id: AssetId,
        session_id: RentalSessionId,
    ) -> Result<bool, AppError> {
        let removed = self
            .holds
            .remove_if(&asset_id, |_, record| record.session_id == session_id)
            .is_some();
        if !removed {
            warn!(
                asset_id = %asset_id,
                session_id = %session_id,
                "Attempted to release occupancy not held by session"
            );
        }
        Ok(removed)
    }

    async fn holder(&self, asset_id: AssetId) -> Result<Option<RentalSessionId>, AppError> {
        Ok(self.holds.get(&asset_id).map(|r| r.session_id))
    }

    async fn records(&self) -> Result<Vec<OccupancyRecord>, AppError> {
        Ok(self.holds.iter().map(|entry| *entry.value()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_is_exclusive_and_idempotent() {
        let guard = MemoryOccupancyGuard::new();
        let tenant = TenantId::new();
        let asset = AssetId::new();
        let first = RentalSessionId::new();
        let second = RentalSessionId::new();

        assert!(guard.try_acquire(tenant, asset, first).await.unwrap());
        assert!(guard.try_acquire(tenant, asset, first).await.unwrap());
        assert!(!guard.try_acquire(tenant, asset, second).await.unwrap());
        assert_eq!(guard.holder(asset).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_release_only_by_holder() {
        let guard = MemoryOccupancyGuard::new();
        let tenant = TenantId::new();
        let asset = AssetId::new();
        let holder = RentalSessionId::new();

        guard.try_acquire(tenant, asset, holder).await.unwrap();
        assert!(!guard.release(asset, RentalSessionId::new()).await.unwrap());
        assert!(guard.release(asset, holder).await.unwrap());
        assert!(!guard.release(asset, holder).await.unwrap());
        assert!(guard.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acquire_has_single_winner() {
        let guard = MemoryOccupancyGuard::new();
        let tenant = TenantId::new();
        let asset = AssetId::new();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let guard = guard.clone();
            handles.push(tokio::spawn(async move {
                guard
                    .try_acquire(tenant, asset, RentalSessionId::new())
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(guard.records().await.unwrap().len(), 1);
    }
}
