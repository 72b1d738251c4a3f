//! Pricing rule CRUD and rate quotes.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rentflow_billing::pricing::{PricingResolver, ResolvedRate};
use rentflow_core::error::AppError;
use rentflow_core::traits::Clock;
use rentflow_core::types::{AssetId, PricingRuleId};
use rentflow_database::CatalogStore;
use rentflow_entity::pricing::{CreatePricingRule, PricingRule, UpdatePricingRule};

use super::category::require_name;
use super::tenant::effective_settings;
use crate::context::TenantContext;

/// The rate an asset would be billed at if started at `at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Quoted asset.
    pub asset_id: AssetId,
    /// Instant the quote was evaluated at.
    pub at: DateTime<Utc>,
    /// `at` in the tenant's local time.
    pub local_time: NaiveDateTime,
    /// Tenant currency code.
    pub currency: String,
    /// The winning rate.
    #[serde(flatten)]
    pub rate: ResolvedRate,
}

/// Manages pricing rules.
#[derive(Debug, Clone)]
pub struct PricingService {
    catalog: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
    resolver: PricingResolver,
}

impl PricingService {
    /// Creates a new pricing service.
    pub fn new(catalog: Arc<dyn CatalogStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog,
            clock,
            resolver: PricingResolver::new(),
        }
    }

    /// Lists rules, highest priority first.
    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<PricingRule>, AppError> {
        self.catalog.list_rules(ctx.tenant_id).await
    }

    /// Gets a rule by ID.
    pub async fn get(
        &self,
        ctx: &TenantContext,
        id: PricingRuleId,
    ) -> Result<PricingRule, AppError> {
        self.catalog
            .find_rule(ctx.tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Pricing rule {id} not found")))
    }

    /// Creates a rule.
    pub async fn create(
        &self,
        ctx: &TenantContext,
        data: CreatePricingRule,
    ) -> Result<PricingRule, AppError> {
        let rule = PricingRule::from_create(ctx.tenant_id, data, self.clock.now());
        self.validate_rule(ctx, &rule).await?;
        let created = self.catalog.insert_rule(&rule).await?;

        info!(
            tenant_id = %ctx.tenant_id,
            rule_id = %created.id,
            billing_type = %created.billing_type,
            price = %created.price,
            priority = created.priority,
            "Pricing rule created"
        );
        Ok(created)
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: PricingRuleId,
        update: UpdatePricingRule,
    ) -> Result<PricingRule, AppError> {
        let mut rule = self.get(ctx, id).await?;
        rule.apply(update, self.clock.now());
        self.validate_rule(ctx, &rule).await?;
        self.catalog.update_rule(&rule).await
    }

    /// Deletes a rule. Sessions already started keep their snapshot.
    pub async fn delete(&self, ctx: &TenantContext, id: PricingRuleId) -> Result<(), AppError> {
        if !self.catalog.delete_rule(ctx.tenant_id, id).await? {
            return Err(AppError::not_found(format!("Pricing rule {id} not found")));
        }
        info!(tenant_id = %ctx.tenant_id, rule_id = %id, "Pricing rule deleted");
        Ok(())
    }

    /// Resolves the rate for an asset at `at` (default: now).
    pub async fn quote(
        &self,
        ctx: &TenantContext,
        asset_id: AssetId,
        at: Option<DateTime<Utc>>,
    ) -> Result<PriceQuote, AppError> {
        let at = at.unwrap_or_else(|| self.clock.now());
        let asset = self
            .catalog
            .find_asset(ctx.tenant_id, asset_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Asset {asset_id} not found")))?;
        let settings = effective_settings(self.catalog.as_ref(), ctx, self.clock.as_ref()).await?;
        let rules = self.catalog.rules_for_asset(&asset).await?;

        let rate = self.resolver.resolve(&asset, &rules, &settings, at)?;
        debug!(
            asset_id = %asset_id,
            rule_id = ?rate.pricing_rule_id,
            source = ?rate.source,
            "Rate quoted"
        );

        Ok(PriceQuote {
            asset_id,
            at,
            local_time: at.with_timezone(&settings.offset()).naive_local(),
            currency: settings.currency,
            rate,
        })
    }

    async fn validate_rule(&self, ctx: &TenantContext, rule: &PricingRule) -> Result<(), AppError> {
        require_name(&rule.name)?;

        if rule.asset_id.is_some() && rule.category_id.is_some() {
            return Err(AppError::validation(
                "A rule is scoped to an asset or a category, not both",
            ));
        }
        if rule.price < Decimal::ZERO {
            return Err(AppError::validation("price must not be negative"));
        }
        if rule.min_duration.is_some_and(|m| m <= 0) {
            return Err(AppError::validation("min_duration must be positive"));
        }
        for day in [rule.day_of_week_start, rule.day_of_week_end]
            .into_iter()
            .flatten()
        {
            if !(0..=6).contains(&day) {
                return Err(AppError::validation(
                    "day_of_week must be between 0 (Monday) and 6 (Sunday)",
                ));
            }
        }

        if let Some(asset_id) = rule.asset_id {
            if self
                .catalog
                .find_asset(ctx.tenant_id, asset_id)
                .await?
                .is_none()
            {
                return Err(AppError::validation(format!("Asset {asset_id} does not exist")));
            }
        }
        if let Some(category_id) = rule.category_id {
            if self
                .catalog
                .find_category(ctx.tenant_id, category_id)
                .await?
                .is_none()
            {
                return Err(AppError::validation(format!(
                    "Category {category_id} does not exist"
                )));
            }
        }
        Ok(())
    }
}
