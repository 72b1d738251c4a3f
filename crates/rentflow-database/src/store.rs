//! Store traits consumed by the service layer.
//!
//! [`RentalLedger`] owns session state and applies every lifecycle
//! transition as one atomic unit. [`CatalogStore`] covers operator-managed
//! reference data. Both are implemented over PostgreSQL and in memory.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rentflow_billing::occupancy::OccupancyGuard;
use rentflow_core::result::AppResult;
use rentflow_core::types::{
    AssetId, CategoryId, PageRequest, PageResponse, PricingRuleId, PromotionId, RentalSessionId,
    TenantId,
};
use rentflow_entity::asset::Asset;
use rentflow_entity::category::Category;
use rentflow_entity::pricing::PricingRule;
use rentflow_entity::promotion::Promotion;
use rentflow_entity::rental::{
    ClosedSession, NewRentalSession, RentalSession, SessionClosure, SessionFilter,
};
use rentflow_entity::tenant::TenantSettings;

/// Session state and atomic lifecycle transitions.
#[async_trait]
pub trait RentalLedger: Send + Sync + std::fmt::Debug {
    /// Acquire occupancy for the asset and insert the active session.
    ///
    /// Fails with `AssetOccupied` if another session holds the asset.
    async fn open_session(&self, session: NewRentalSession) -> AppResult<RentalSession>;

    /// Apply a closing transition if the session is still active.
    ///
    /// Claims the promotion redemption (increment-with-check), writes the
    /// final figures, and releases occupancy together. Fails with
    /// `SessionNotActive` if the session was closed concurrently.
    async fn close_session(&self, closure: SessionClosure) -> AppResult<ClosedSession>;

    /// Find a session by id within a tenant.
    async fn find_session(
        &self,
        tenant_id: TenantId,
        id: RentalSessionId,
    ) -> AppResult<Option<RentalSession>>;

    /// The active session on an asset, if any.
    async fn active_session_for_asset(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
    ) -> AppResult<Option<RentalSession>>;

    /// Sessions matching a filter, newest first.
    async fn list_sessions(
        &self,
        tenant_id: TenantId,
        filter: &SessionFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<RentalSession>>;

    /// Whether any session, open or closed, references the asset.
    async fn asset_has_sessions(&self, tenant_id: TenantId, asset_id: AssetId) -> AppResult<bool>;

    /// Active planned sessions across all tenants whose planned end plus
    /// `grace_minutes` is at or before `now`.
    async fn find_overdue_sessions(
        &self,
        now: DateTime<Utc>,
        grace_minutes: i64,
    ) -> AppResult<Vec<RentalSession>>;

    /// Every active session across all tenants.
    async fn list_active_sessions(&self) -> AppResult<Vec<RentalSession>>;

    /// The occupancy guard backing this ledger.
    fn occupancy(&self) -> Arc<dyn OccupancyGuard>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Operator-managed catalog: settings, categories, assets, rules, promotions.
///
/// Every read and write is scoped by tenant.
#[async_trait]
pub trait CatalogStore: Send + Sync + std::fmt::Debug {
    /// Stored settings for a tenant.
    async fn tenant_settings(&self, tenant_id: TenantId) -> AppResult<Option<TenantSettings>>;
    /// Insert or replace tenant settings.
    async fn save_tenant_settings(&self, settings: &TenantSettings) -> AppResult<TenantSettings>;

    /// Insert a category.
    async fn insert_category(&self, category: &Category) -> AppResult<Category>;
    /// Find a category.
    async fn find_category(&self, tenant_id: TenantId, id: CategoryId)
    -> AppResult<Option<Category>>;
    /// All categories in display order.
    async fn list_categories(&self, tenant_id: TenantId) -> AppResult<Vec<Category>>;
    /// Persist an updated category.
    async fn update_category(&self, category: &Category) -> AppResult<Category>;
    /// Delete a category. Member assets become uncategorized and
    /// category-scoped rules are removed.
    async fn delete_category(&self, tenant_id: TenantId, id: CategoryId) -> AppResult<bool>;

    /// Insert an asset.
    async fn insert_asset(&self, asset: &Asset) -> AppResult<Asset>;
    /// Find an asset.
    async fn find_asset(&self, tenant_id: TenantId, id: AssetId) -> AppResult<Option<Asset>>;
    /// Assets in display order, optionally restricted to a category.
    async fn list_assets(
        &self,
        tenant_id: TenantId,
        category_id: Option<CategoryId>,
        page: PageRequest,
    ) -> AppResult<PageResponse<Asset>>;
    /// Persist an updated asset.
    async fn update_asset(&self, asset: &Asset) -> AppResult<Asset>;
    /// Delete an asset with no rental history. Asset-scoped rules are removed.
    async fn delete_asset(&self, tenant_id: TenantId, id: AssetId) -> AppResult<bool>;

    /// Insert a pricing rule.
    async fn insert_rule(&self, rule: &PricingRule) -> AppResult<PricingRule>;
    /// Find a pricing rule.
    async fn find_rule(
        &self,
        tenant_id: TenantId,
        id: PricingRuleId,
    ) -> AppResult<Option<PricingRule>>;
    /// All rules, highest priority first.
    async fn list_rules(&self, tenant_id: TenantId) -> AppResult<Vec<PricingRule>>;
    /// Active rules that could apply to an asset: asset-scoped, scoped to
    /// its category, or tenant-wide.
    async fn rules_for_asset(&self, asset: &Asset) -> AppResult<Vec<PricingRule>>;
    /// Persist an updated rule.
    async fn update_rule(&self, rule: &PricingRule) -> AppResult<PricingRule>;
    /// Delete a rule. Sessions keep their price snapshot.
    async fn delete_rule(&self, tenant_id: TenantId, id: PricingRuleId) -> AppResult<bool>;

    /// Insert a promotion. Fails with `Conflict` on a duplicate code.
    async fn insert_promotion(&self, promotion: &Promotion) -> AppResult<Promotion>;
    /// Find a promotion.
    async fn find_promotion(
        &self,
        tenant_id: TenantId,
        id: PromotionId,
    ) -> AppResult<Option<Promotion>>;
    /// Find a promotion by code, case-insensitively.
    async fn find_promotion_by_code(
        &self,
        tenant_id: TenantId,
        code: &str,
    ) -> AppResult<Option<Promotion>>;
    /// All promotions, newest first.
    async fn list_promotions(&self, tenant_id: TenantId) -> AppResult<Vec<Promotion>>;
    /// Persist an updated promotion. The usage counter is not written.
    async fn update_promotion(&self, promotion: &Promotion) -> AppResult<Promotion>;
    /// Delete a promotion that was never redeemed.
    async fn delete_promotion(&self, tenant_id: TenantId, id: PromotionId) -> AppResult<bool>;
}
