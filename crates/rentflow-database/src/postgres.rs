//! [`RentalLedger`] and [`CatalogStore`] over PostgreSQL.

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

use crate::connection::DatabasePool;
use crate::repositories::{
    AssetRepository, CategoryRepository, PgOccupancyGuard, PricingRuleRepository,
    PromotionRepository, RentalSessionRepository, TenantSettingsRepository,
};
use crate::store::{CatalogStore, RentalLedger};

/// PostgreSQL-backed store bundling every repository.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabasePool,
    tenants: TenantSettingsRepository,
    categories: CategoryRepository,
    assets: AssetRepository,
    rules: PricingRuleRepository,
    promotions: PromotionRepository,
    sessions: RentalSessionRepository,
    occupancy: Arc<PgOccupancyGuard>,
}

impl PgStore {
    /// Build the store over a connected pool.
    pub fn new(db: DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            tenants: TenantSettingsRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool.clone()),
            assets: AssetRepository::new(pool.clone()),
            rules: PricingRuleRepository::new(pool.clone()),
            promotions: PromotionRepository::new(pool.clone()),
            sessions: RentalSessionRepository::new(pool.clone()),
            occupancy: Arc::new(PgOccupancyGuard::new(pool)),
            db,
        }
    }

    /// The underlying pool.
    pub fn database(&self) -> &DatabasePool {
        &self.db
    }
}

#[async_trait]
impl RentalLedger for PgStore {
    async fn open_session(&self, session: NewRentalSession) -> AppResult<RentalSession> {
        self.sessions.open(session).await
    }

    async fn close_session(&self, closure: SessionClosure) -> AppResult<ClosedSession> {
        self.sessions.close(closure).await
    }

    async fn find_session(
        &self,
        tenant_id: TenantId,
        id: RentalSessionId,
    ) -> AppResult<Option<RentalSession>> {
        self.sessions.find_by_id(tenant_id, id).await
    }

    async fn active_session_for_asset(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
    ) -> AppResult<Option<RentalSession>> {
        self.sessions.find_active_for_asset(tenant_id, asset_id).await
    }

    async fn list_sessions(
        &self,
        tenant_id: TenantId,
        filter: &SessionFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<RentalSession>> {
        self.sessions.find_by_tenant(tenant_id, filter, page).await
    }

    async fn asset_has_sessions(&self, tenant_id: TenantId, asset_id: AssetId) -> AppResult<bool> {
        self.sessions.exists_for_asset(tenant_id, asset_id).await
    }

    async fn find_overdue_sessions(
        &self,
        now: DateTime<Utc>,
        grace_minutes: i64,
    ) -> AppResult<Vec<RentalSession>> {
        self.sessions.find_overdue(now, grace_minutes).await
    }

    async fn list_active_sessions(&self) -> AppResult<Vec<RentalSession>> {
        self.sessions.find_all_active().await
    }

    fn occupancy(&self) -> Arc<dyn OccupancyGuard> {
        self.occupancy.clone()
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.db.health_check().await
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn tenant_settings(&self, tenant_id: TenantId) -> AppResult<Option<TenantSettings>> {
        self.tenants.find(tenant_id).await
    }

    async fn save_tenant_settings(&self, settings: &TenantSettings) -> AppResult<TenantSettings> {
        self.tenants.upsert(settings).await
    }

    async fn insert_category(&self, category: &Category) -> AppResult<Category> {
        self.categories.create(category).await
    }

    async fn find_category(
        &self,
        tenant_id: TenantId,
        id: CategoryId,
    ) -> AppResult<Option<Category>> {
        self.categories.find_by_id(tenant_id, id).await
    }

    async fn list_categories(&self, tenant_id: TenantId) -> AppResult<Vec<Category>> {
        self.categories.find_by_tenant(tenant_id).await
    }

    async fn update_category(&self, category: &Category) -> AppResult<Category> {
        self.categories.update(category).await
    }

    async fn delete_category(&self, tenant_id: TenantId, id: CategoryId) -> AppResult<bool> {
        self.categories.delete(tenant_id, id).await
    }

    async fn insert_asset(&self, asset: &Asset) -> AppResult<Asset> {
        self.assets.create(asset).await
    }

    async fn find_asset(&self, tenant_id: TenantId, id: AssetId) -> AppResult<Option<Asset>> {
        self.assets.find_by_id(tenant_id, id).await
    }

    async fn list_assets(
        &self,
        tenant_id: TenantId,
        category_id: Option<CategoryId>,
        page: PageRequest,
    ) -> AppResult<PageResponse<Asset>> {
        self.assets.find_by_tenant(tenant_id, category_id, page).await
    }

    async fn update_asset(&self, asset: &Asset) -> AppResult<Asset> {
        self.assets.update(asset).await
    }

    async fn delete_asset(&self, tenant_id: TenantId, id: AssetId) -> AppResult<bool> {
        self.assets.delete(tenant_id, id).await
    }

    async fn insert_rule(&self, rule: &PricingRule) -> AppResult<PricingRule> {
        self.rules.create(rule).await
    }

    async fn find_rule(
        &self,
        tenant_id: TenantId,
        id: PricingRuleId,
    ) -> AppResult<Option<PricingRule>> {
        self.rules.find_by_id(tenant_id, id).await
    }

    async fn list_rules(&self, tenant_id: TenantId) -> AppResult<Vec<PricingRule>> {
        self.rules.find_by_tenant(tenant_id).await
    }

    async fn rules_for_asset(&self, asset: &Asset) -> AppResult<Vec<PricingRule>> {
        self.rules.find_for_asset(asset).await
    }

    async fn update_rule(&self, rule: &PricingRule) -> AppResult<PricingRule> {
        self.rules.update(rule).await
    }

    async fn delete_rule(&self, tenant_id: TenantId, id: PricingRuleId) -> AppResult<bool> {
        self.rules.delete(tenant_id, id).await
    }

    async fn insert_promotion(&self, promotion: &Promotion) -> AppResult<Promotion> {
        self.promotions.create(promotion).await
    }

    async fn find_promotion(
        &self,
        tenant_id: TenantId,
        id: PromotionId,
    ) -> AppResult<Option<Promotion>> {
        self.promotions.find_by_id(tenant_id, id).await
    }

    async fn find_promotion_by_code(
        &self,
        tenant_id: TenantId,
        code: &str,
    ) -> AppResult<Option<Promotion>> {
        self.promotions.find_by_code(tenant_id, code).await
    }

    async fn list_promotions(&self, tenant_id: TenantId) -> AppResult<Vec<Promotion>> {
        self.promotions.find_by_tenant(tenant_id).await
    }

    async fn update_promotion(&self, promotion: &Promotion) -> AppResult<Promotion> {
        self.promotions.update(promotion).await
    }

    async fn delete_promotion(&self, tenant_id: TenantId, id: PromotionId) -> AppResult<bool> {
        self.promotions.delete(tenant_id, id).await
    }
}
