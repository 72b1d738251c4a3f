//! Pricing rule entity model.

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rentflow_core::types::{AssetId, CategoryId, PricingRuleId, TenantId};

use super::billing_type::BillingType;

/// A rate applying to an asset, a category, or a whole tenant, optionally
/// restricted to a day-of-week and time-of-day window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PricingRule {
    /// Unique rule identifier.
    pub id: PricingRuleId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name (e.g. "Weekend evening").
    pub name: String,
    /// Asset scope. Mutually exclusive with `category_id`.
    pub asset_id: Option<AssetId>,
    /// Category scope. Mutually exclusive with `asset_id`.
    pub category_id: Option<CategoryId>,
    /// How cost is derived.
    pub billing_type: BillingType,
    /// Rate in whole currency units.
    pub price: Decimal,
    /// Minimum billable minutes.
    pub min_duration: Option<i32>,
    /// First day of the window (0 = Monday).
    pub day_of_week_start: Option<i16>,
    /// Last day of the window, inclusive.
    pub day_of_week_end: Option<i16>,
    /// Window start, inclusive.
    pub time_start: Option<NaiveTime>,
    /// Window end, exclusive.
    pub time_end: Option<NaiveTime>,
    /// Higher wins.
    pub priority: i32,
    /// Inactive rules never match.
    pub is_active: bool,
    /// When the rule was created.
    pub created_at: DateTime<Utc>,
    /// When the rule was last updated.
    pub updated_at: DateTime<Utc>,
}

/// What a rule applies to, ordered by specificity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RuleScope {
    /// Every asset of the tenant.
    Tenant,
    /// Every asset in a category.
    Category(CategoryId),
    /// A single asset.
    Asset(AssetId),
}

impl RuleScope {
    /// Asset > category > tenant-wide.
    pub fn specificity(&self) -> u8 {
        match self {
            Self::Tenant => 0,
            Self::Category(_) => 1,
            Self::Asset(_) => 2,
        }
    }
}

impl PricingRule {
    /// The rule's scope. An asset reference takes precedence if both are set.
    pub fn scope(&self) -> RuleScope {
        match (self.asset_id, self.category_id) {
            (Some(asset_id), _) => RuleScope::Asset(asset_id),
            (None, Some(category_id)) => RuleScope::Category(category_id),
            (None, None) => RuleScope::Tenant,
        }
    }

    /// Build a new row from a create request.
    pub fn from_create(tenant_id: TenantId, data: CreatePricingRule, now: DateTime<Utc>) -> Self {
        Self {
            id: PricingRuleId::new(),
            tenant_id,
            name: data.name,
            asset_id: data.asset_id,
            category_id: data.category_id,
            billing_type: data.billing_type,
            price: data.price,
            min_duration: data.min_duration,
            day_of_week_start: data.day_of_week_start,
            day_of_week_end: data.day_of_week_end,
            time_start: data.time_start,
            time_end: data.time_end,
            priority: data.priority.unwrap_or(0),
            is_active: data.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update.
    pub fn apply(&mut self, update: UpdatePricingRule, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(asset_id) = update.asset_id {
            self.asset_id = asset_id;
        }
        if let Some(category_id) = update.category_id {
            self.category_id = category_id;
        }
        if let Some(billing_type) = update.billing_type {
            self.billing_type = billing_type;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(min_duration) = update.min_duration {
            self.min_duration = min_duration;
        }
        if let Some(day) = update.day_of_week_start {
            self.day_of_week_start = day;
        }
        if let Some(day) = update.day_of_week_end {
            self.day_of_week_end = day;
        }
        if let Some(time) = update.time_start {
            self.time_start = time;
        }
        if let Some(time) = update.time_end {
            self.time_end = time;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }
}

/// Data required to create a pricing rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePricingRule {
    /// Display name.
    pub name: String,
    /// Asset scope.
    pub asset_id: Option<AssetId>,
    /// Category scope.
    pub category_id: Option<CategoryId>,
    /// Billing type.
    pub billing_type: BillingType,
    /// Rate.
    pub price: Decimal,
    /// Minimum billable minutes.
    pub min_duration: Option<i32>,
    /// First day of the window (0 = Monday).
    pub day_of_week_start: Option<i16>,
    /// Last day of the window.
    pub day_of_week_end: Option<i16>,
    /// Window start.
    pub time_start: Option<NaiveTime>,
    /// Window end.
    pub time_end: Option<NaiveTime>,
    /// Priority (default 0).
    pub priority: Option<i32>,
    /// Active flag (default `true`).
    pub is_active: Option<bool>,
}

/// Partial pricing rule update. A present-but-null nullable field clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePricingRule {
    /// New name.
    pub name: Option<String>,
    /// New asset scope.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<Option<AssetId>>,
    /// New category scope.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<CategoryId>>,
    /// New billing type.
    pub billing_type: Option<BillingType>,
    /// New rate.
    pub price: Option<Decimal>,
    /// New minimum billable minutes.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<Option<i32>>,
    /// New first day.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub day_of_week_start: Option<Option<i16>>,
    /// New last day.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub day_of_week_end: Option<Option<i16>>,
    /// New window start.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub time_start: Option<Option<NaiveTime>>,
    /// New window end.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub time_end: Option<Option<NaiveTime>>,
    /// New priority.
    pub priority: Option<i32>,
    /// New active flag.
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rule(asset_id: Option<AssetId>, category_id: Option<CategoryId>) -> PricingRule {
        PricingRule::from_create(
            TenantId::new(),
            CreatePricingRule {
                name: "Standard".into(),
                asset_id,
                category_id,
                billing_type: BillingType::PerHour,
                price: dec!(10000),
                min_duration: None,
                day_of_week_start: None,
                day_of_week_end: None,
                time_start: None,
                time_end: None,
                priority: None,
                is_active: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_scope_specificity() {
        let asset = rule(Some(AssetId::new()), None);
        let category = rule(None, Some(CategoryId::new()));
        let tenant = rule(None, None);

        assert!(asset.scope().specificity() > category.scope().specificity());
        assert!(category.scope().specificity() > tenant.scope().specificity());
        assert_eq!(tenant.scope(), RuleScope::Tenant);
    }

    #[test]
    fn test_billing_type_wire_names() {
        let json = serde_json::to_string(&BillingType::PerMinute).expect("serialize");
        assert_eq!(json, "\"per_minute\"");
        assert_eq!("per_game".parse::<BillingType>(), Ok(BillingType::PerGame));
        assert!("hourly".parse::<BillingType>().is_err());
    }
}
