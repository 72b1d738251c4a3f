//! In-process store for single-node deployments, demos, and tests.
//!
//! All state lives behind one `tokio::sync::RwLock`. Lifecycle transitions
//! take the write lock for their whole duration, which gives them the same
//! all-or-nothing behaviour as the PostgreSQL transactions. Occupancy is
//! tracked by a [`MemoryOccupancyGuard`] that is only mutated under that
//! lock by the ledger itself.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use rentflow_billing::occupancy::{MemoryOccupancyGuard, OccupancyGuard};
use rentflow_core::error::AppError;
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

use crate::store::{CatalogStore, RentalLedger};

#[derive(Debug, Default)]
struct MemoryState {
    settings: HashMap<TenantId, TenantSettings>,
    categories: HashMap<CategoryId, Category>,
    assets: HashMap<AssetId, Asset>,
    rules: HashMap<PricingRuleId, PricingRule>,
    promotions: HashMap<PromotionId, Promotion>,
    sessions: HashMap<RentalSessionId, RentalSession>,
}

impl MemoryState {
    fn category_exists(&self, tenant_id: TenantId, id: CategoryId) -> bool {
        self.categories
            .get(&id)
            .is_some_and(|c| c.tenant_id == tenant_id)
    }

    fn asset_exists(&self, tenant_id: TenantId, id: AssetId) -> bool {
        self.assets.get(&id).is_some_and(|a| a.tenant_id == tenant_id)
    }

    fn code_taken(&self, promotion: &Promotion) -> bool {
        self.promotions.values().any(|p| {
            p.tenant_id == promotion.tenant_id
                && p.id != promotion.id
                && p.code.eq_ignore_ascii_case(&promotion.code)
        })
    }

    fn check_rule_scope(&self, rule: &PricingRule) -> AppResult<()> {
        let asset_ok = rule
            .asset_id
            .is_none_or(|id| self.asset_exists(rule.tenant_id, id));
        let category_ok = rule
            .category_id
            .is_none_or(|id| self.category_exists(rule.tenant_id, id));
        if asset_ok && category_ok {
            Ok(())
        } else {
            Err(AppError::validation(
                "Rule scope references an unknown asset or category",
            ))
        }
    }
}

/// Store keeping every table in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    occupancy: MemoryOccupancyGuard,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RentalLedger for MemoryStore {
    async fn open_session(&self, new: NewRentalSession) -> AppResult<RentalSession> {
        let mut state = self.state.write().await;
        if !state.asset_exists(new.tenant_id, new.asset_id) {
            return Err(AppError::not_found(format!(
                "Asset {} not found",
                new.asset_id
            )));
        }

        let acquired = self
            .occupancy
            .try_acquire(new.tenant_id, new.asset_id, new.id)
            .await?;
        if !acquired {
            return Err(AppError::asset_occupied(format!(
                "Asset {} already has an active session",
                new.asset_id
            )));
        }

        let session = RentalSession::from_new(new);
        state.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn close_session(&self, closure: SessionClosure) -> AppResult<ClosedSession> {
        let mut state = self.state.write().await;

        let current = state
            .sessions
            .get(&closure.session_id)
            .filter(|s| s.tenant_id == closure.tenant_id)
            .ok_or_else(|| AppError::not_found(format!("Session {} not found", closure.session_id)))?;
        if !current.is_active() {
            return Err(AppError::session_not_active(format!(
                "Session {} is already {}",
                closure.session_id, current.status
            )));
        }

        let mut closure = closure;
        let mut promotion_claimed = false;
        if let Some(promotion_id) = closure.promotion_id {
            let ended_at = closure.ended_at;
            match state
                .promotions
                .get_mut(&promotion_id)
                .filter(|p| {
                    p.tenant_id == closure.tenant_id && p.is_active && !p.is_exhausted()
                })
            {
                Some(promotion) => {
                    promotion.current_usages += 1;
                    promotion.updated_at = ended_at;
                    promotion_claimed = true;
                }
                None => closure = closure.without_promotion(),
            }
        }

        let Some(session) = state.sessions.get_mut(&closure.session_id) else {
            return Err(AppError::not_found(format!(
                "Session {} not found",
                closure.session_id
            )));
        };
        closure.apply_to(session);
        let session = session.clone();

        self.occupancy.release(session.asset_id, session.id).await?;

        Ok(ClosedSession {
            session,
            promotion_claimed,
        })
    }

    async fn find_session(
        &self,
        tenant_id: TenantId,
        id: RentalSessionId,
    ) -> AppResult<Option<RentalSession>> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .get(&id)
            .filter(|s| s.tenant_id == tenant_id)
            .cloned())
    }

    async fn active_session_for_asset(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
    ) -> AppResult<Option<RentalSession>> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .values()
            .find(|s| s.tenant_id == tenant_id && s.asset_id == asset_id && s.is_active())
            .cloned())
    }

    async fn list_sessions(
        &self,
        tenant_id: TenantId,
        filter: &SessionFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<RentalSession>> {
        let state = self.state.read().await;
        let mut matching: Vec<RentalSession> = state
            .sessions
            .values()
            .filter(|s| s.tenant_id == tenant_id && filter.matches(s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        let total = matching.len() as u64;
        Ok(PageResponse::new(page.slice(&matching), page, total))
    }

    async fn asset_has_sessions(&self, tenant_id: TenantId, asset_id: AssetId) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .values()
            .any(|s| s.tenant_id == tenant_id && s.asset_id == asset_id))
    }

    async fn find_overdue_sessions(
        &self,
        now: DateTime<Utc>,
        grace_minutes: i64,
    ) -> AppResult<Vec<RentalSession>> {
        let grace = Duration::minutes(grace_minutes.max(0));
        let state = self.state.read().await;
        let mut overdue: Vec<RentalSession> = state
            .sessions
            .values()
            .filter(|s| s.is_active())
            .filter(|s| s.planned_end().is_some_and(|end| end + grace <= now))
            .cloned()
            .collect();
        overdue.sort_by_key(|s| s.started_at);
        Ok(overdue)
    }

    async fn list_active_sessions(&self) -> AppResult<Vec<RentalSession>> {
        let state = self.state.read().await;
        let mut active: Vec<RentalSession> = state
            .sessions
            .values()
            .filter(|s| s.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|s| s.started_at);
        Ok(active)
    }

    fn occupancy(&self) -> Arc<dyn OccupancyGuard> {
        Arc::new(self.occupancy.clone())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn tenant_settings(&self, tenant_id: TenantId) -> AppResult<Option<TenantSettings>> {
        Ok(self.state.read().await.settings.get(&tenant_id).cloned())
    }

    async fn save_tenant_settings(&self, settings: &TenantSettings) -> AppResult<TenantSettings> {
        let mut state = self.state.write().await;
        state.settings.insert(settings.tenant_id, settings.clone());
        Ok(settings.clone())
    }

    async fn insert_category(&self, category: &Category) -> AppResult<Category> {
        let mut state = self.state.write().await;
        state.categories.insert(category.id, category.clone());
        Ok(category.clone())
    }

    async fn find_category(
        &self,
        tenant_id: TenantId,
        id: CategoryId,
    ) -> AppResult<Option<Category>> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .get(&id)
            .filter(|c| c.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_categories(&self, tenant_id: TenantId) -> AppResult<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories: Vec<Category> = state
            .categories
            .values()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn update_category(&self, category: &Category) -> AppResult<Category> {
        let mut state = self.state.write().await;
        match state
            .categories
            .get_mut(&category.id)
            .filter(|c| c.tenant_id == category.tenant_id)
        {
            Some(stored) => {
                *stored = category.clone();
                Ok(category.clone())
            }
            None => Err(AppError::not_found(format!(
                "Category {} not found",
                category.id
            ))),
        }
    }

    async fn delete_category(&self, tenant_id: TenantId, id: CategoryId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.category_exists(tenant_id, id) {
            return Ok(false);
        }
        state.categories.remove(&id);
        for asset in state.assets.values_mut() {
            if asset.category_id == Some(id) {
                asset.category_id = None;
            }
        }
        state.rules.retain(|_, rule| rule.category_id != Some(id));
        Ok(true)
    }

    async fn insert_asset(&self, asset: &Asset) -> AppResult<Asset> {
        let mut state = self.state.write().await;
        if asset
            .category_id
            .is_some_and(|id| !state.category_exists(asset.tenant_id, id))
        {
            return Err(AppError::validation("Referenced category does not exist"));
        }
        state.assets.insert(asset.id, asset.clone());
        Ok(asset.clone())
    }

    async fn find_asset(&self, tenant_id: TenantId, id: AssetId) -> AppResult<Option<Asset>> {
        let state = self.state.read().await;
        Ok(state
            .assets
            .get(&id)
            .filter(|a| a.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_assets(
        &self,
        tenant_id: TenantId,
        category_id: Option<CategoryId>,
        page: PageRequest,
    ) -> AppResult<PageResponse<Asset>> {
        let state = self.state.read().await;
        let mut assets: Vec<Asset> = state
            .assets
            .values()
            .filter(|a| a.tenant_id == tenant_id)
            .filter(|a| category_id.is_none_or(|id| a.category_id == Some(id)))
            .cloned()
            .collect();
        assets.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        let total = assets.len() as u64;
        Ok(PageResponse::new(page.slice(&assets), page, total))
    }

    async fn update_asset(&self, asset: &Asset) -> AppResult<Asset> {
        let mut state = self.state.write().await;
        if asset
            .category_id
            .is_some_and(|id| !state.category_exists(asset.tenant_id, id))
        {
            return Err(AppError::validation("Referenced category does not exist"));
        }
        match state
            .assets
            .get_mut(&asset.id)
            .filter(|a| a.tenant_id == asset.tenant_id)
        {
            Some(stored) => {
                *stored = asset.clone();
                Ok(asset.clone())
            }
            None => Err(AppError::not_found(format!("Asset {} not found", asset.id))),
        }
    }

    async fn delete_asset(&self, tenant_id: TenantId, id: AssetId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.asset_exists(tenant_id, id) {
            return Ok(false);
        }
        if state.sessions.values().any(|s| s.asset_id == id) {
            return Err(AppError::conflict(format!(
                "Asset {id} has rental history and cannot be deleted; deactivate it instead"
            )));
        }
        state.assets.remove(&id);
        state.rules.retain(|_, rule| rule.asset_id != Some(id));
        Ok(true)
    }

    async fn insert_rule(&self, rule: &PricingRule) -> AppResult<PricingRule> {
        let mut state = self.state.write().await;
        state.check_rule_scope(rule)?;
        state.rules.insert(rule.id, rule.clone());
        Ok(rule.clone())
    }

    async fn find_rule(
        &self,
        tenant_id: TenantId,
        id: PricingRuleId,
    ) -> AppResult<Option<PricingRule>> {
        let state = self.state.read().await;
        Ok(state
            .rules
            .get(&id)
            .filter(|r| r.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_rules(&self, tenant_id: TenantId) -> AppResult<Vec<PricingRule>> {
        let state = self.state.read().await;
        let mut rules: Vec<PricingRule> = state
            .rules
            .values()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect();
        rules.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(rules)
    }

    async fn rules_for_asset(&self, asset: &Asset) -> AppResult<Vec<PricingRule>> {
        let state = self.state.read().await;
        Ok(state
            .rules
            .values()
            .filter(|r| r.tenant_id == asset.tenant_id && r.is_active)
            .filter(|r| match (r.asset_id, r.category_id) {
                (Some(asset_id), _) => asset_id == asset.id,
                (None, Some(category_id)) => asset.category_id == Some(category_id),
                (None, None) => true,
            })
            .cloned()
            .collect())
    }

    async fn update_rule(&self, rule: &PricingRule) -> AppResult<PricingRule> {
        let mut state = self.state.write().await;
        state.check_rule_scope(rule)?;
        match state
            .rules
            .get_mut(&rule.id)
            .filter(|r| r.tenant_id == rule.tenant_id)
        {
            Some(stored) => {
                *stored = rule.clone();
                Ok(rule.clone())
            }
            None => Err(AppError::not_found(format!(
                "Pricing rule {} not found",
                rule.id
            ))),
        }
    }

    async fn delete_rule(&self, tenant_id: TenantId, id: PricingRuleId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.rules.get(&id).is_some_and(|r| r.tenant_id == tenant_id) {
            return Ok(false);
        }
        state.rules.remove(&id);
        for session in state.sessions.values_mut() {
            if session.pricing_rule_id == Some(id) {
                session.pricing_rule_id = None;
            }
        }
        Ok(true)
    }

    async fn insert_promotion(&self, promotion: &Promotion) -> AppResult<Promotion> {
        let mut state = self.state.write().await;
        if state.code_taken(promotion) {
            return Err(AppError::conflict(format!(
                "Promotion code '{}' already exists",
                promotion.code
            )));
        }
        state.promotions.insert(promotion.id, promotion.clone());
        Ok(promotion.clone())
    }

    async fn find_promotion(
        &self,
        tenant_id: TenantId,
        id: PromotionId,
    ) -> AppResult<Option<Promotion>> {
        let state = self.state.read().await;
        Ok(state
            .promotions
            .get(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_promotion_by_code(
        &self,
        tenant_id: TenantId,
        code: &str,
    ) -> AppResult<Option<Promotion>> {
        let code = code.trim();
        let state = self.state.read().await;
        Ok(state
            .promotions
            .values()
            .find(|p| p.tenant_id == tenant_id && p.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn list_promotions(&self, tenant_id: TenantId) -> AppResult<Vec<Promotion>> {
        let state = self.state.read().await;
        let mut promotions: Vec<Promotion> = state
            .promotions
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect();
        promotions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(promotions)
    }

    async fn update_promotion(&self, promotion: &Promotion) -> AppResult<Promotion> {
        let mut state = self.state.write().await;
        if state.code_taken(promotion) {
            return Err(AppError::conflict(format!(
                "Promotion code '{}' already exists",
                promotion.code
            )));
        }
        match state
            .promotions
            .get_mut(&promotion.id)
            .filter(|p| p.tenant_id == promotion.tenant_id)
        {
            Some(stored) => {
                let usages = stored.current_usages;
                if promotion.max_usages.is_some_and(|max| max < usages) {
                    return Err(AppError::validation(format!(
                        "max_usages cannot be lowered below the {usages} redemptions already made"
                    )));
                }
                *stored = promotion.clone();
                stored.current_usages = usages;
                Ok(stored.clone())
            }
            None => Err(AppError::not_found(format!(
                "Promotion {} not found",
                promotion.id
            ))),
        }
    }

    async fn delete_promotion(&self, tenant_id: TenantId, id: PromotionId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state
            .promotions
            .get(&id)
            .is_some_and(|p| p.tenant_id == tenant_id)
        {
            return Ok(false);
        }
        if state.sessions.values().any(|s| s.promotion_id == Some(id)) {
            return Err(AppError::conflict(format!(
                "Promotion {id} has been redeemed and cannot be deleted; deactivate it instead"
            )));
        }
        state.promotions.remove(&id);
        Ok(true)
    }
}
