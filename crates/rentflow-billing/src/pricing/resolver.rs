//! Rate resolution for an asset at an instant.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rentflow_core::error::AppError;
use rentflow_core::types::PricingRuleId;
use rentflow_entity::asset::Asset;
use rentflow_entity::pricing::{BillingType, PricingRule, RuleScope};
use rentflow_entity::tenant::TenantSettings;

use super::window::window_contains;

/// Where a resolved rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// A matching pricing rule.
    Rule,
    /// The tenant's default billing type and price.
    TenantDefault,
    /// A price supplied by the operator at start.
    Manual,
}

/// The rate captured onto a session at start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRate {
    /// Billing type.
    pub billing_type: BillingType,
    /// Rate in whole currency units.
    pub price: Decimal,
    /// Minimum billable minutes.
    pub min_duration: Option<i32>,
    /// The winning rule, if any.
    pub pricing_rule_id: Option<PricingRuleId>,
    /// Where the rate came from.
    pub source: RateSource,
}

impl ResolvedRate {
    /// A manual fixed price.
    pub fn manual(price: Decimal) -> Self {
        Self {
            billing_type: BillingType::Fixed,
            price,
            min_duration: None,
            pricing_rule_id: None,
            source: RateSource::Manual,
        }
    }

    fn from_rule(rule: &PricingRule) -> Self {
        Self {
            billing_type: rule.billing_type,
            price: rule.price,
            min_duration: rule.min_duration,
            pricing_rule_id: Some(rule.id),
            source: RateSource::Rule,
        }
    }
}

/// Stateless pricing resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingResolver;

impl PricingResolver {
    /// Create a resolver.
    pub fn new() -> Self {
        Self
    }

    /// Whether `rule` is scoped to `asset` (directly, by category, or tenant-wide).
    pub fn applies_to(rule: &PricingRule, asset: &Asset) -> bool {
        if !rule.is_active || rule.tenant_id != asset.tenant_id {
            return false;
        }
        match rule.scope() {
            RuleScope::Tenant => true,
            RuleScope::Category(category_id) => asset.category_id == Some(category_id),
            RuleScope::Asset(asset_id) => asset.id == asset_id,
        }
    }

    /// Rules applicable at `at`, best first.
    pub fn candidates<'a>(
        &self,
        asset: &Asset,
        rules: &'a [PricingRule],
        settings: &TenantSettings,
        at: DateTime<Utc>,
    ) -> Vec<&'a PricingRule> {
        let local = at.with_timezone(&settings.offset()).naive_local();
        let mut matching: Vec<&PricingRule> = rules
            .iter()
            .filter(|rule| Self::applies_to(rule, asset))
            .filter(|rule| {
                window_contains(
                    rule.day_of_week_start,
                    rule.day_of_week_end,
                    rule.time_start,
                    rule.time_end,
                    &local,
                )
            })
            .collect();
        matching.sort_by(|a, b| precedence(b, a));
        matching
    }

    /// Pick the rate for `asset` at `at`.
    ///
    /// Fails with `NoApplicableRate` only when no rule matches and the
    /// tenant has no default price.
    pub fn resolve(
        &self,
        asset: &Asset,
        rules: &[PricingRule],
        settings: &TenantSettings,
        at: DateTime<Utc>,
    ) -> Result<ResolvedRate, AppError> {
        if let Some(rule) = self.candidates(asset, rules, settings, at).first() {
            return Ok(ResolvedRate::from_rule(rule));
        }

        match settings.default_price {
            Some(price) => Ok(ResolvedRate {
                billing_type: settings.default_billing_type,
                price,
                min_duration: None,
                pricing_rule_id: None,
                source: RateSource::TenantDefault,
            }),
            None => Err(AppError::no_applicable_rate(format!(
                "No pricing rule matches asset {} and no default price is configured",
                asset.id
            ))),
        }
    }
}

/// Total order over rules: priority, then specificity, then recency, then id.
fn precedence(a: &PricingRule, b: &PricingRule) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| a.scope().specificity().cmp(&b.scope().specificity()))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime, TimeZone};
    use rentflow_core::types::{AssetId, CategoryId, CustomFields, TenantId};
    use rentflow_entity::pricing::CreatePricingRule;
    use rust_decimal_macros::dec;

    struct Fixture {
        tenant: TenantId,
        asset: Asset,
        settings: TenantSettings,
        base: DateTime<Utc>,
    }

    fn fixture() -> Fixture {
        let tenant = TenantId::new();
        // Wednesday 2024-03-06 10:00 UTC.
        let base = Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap();
        let asset = Asset {
            id: AssetId::new(),
            tenant_id: tenant,
            category_id: Some(CategoryId::new()),
            name: "Table 1".into(),
            description: None,
            sort_order: 0,
            is_active: true,
            custom_fields: CustomFields::new(),
            created_at: base,
            updated_at: base,
        };
        Fixture {
            tenant,
            asset,
            settings: TenantSettings::defaults_for(tenant, base),
            base,
        }
    }

    fn rule(f: &Fixture, name: &str, price: Decimal, priority: i32) -> PricingRule {
        PricingRule::from_create(
            f.tenant,
            CreatePricingRule {
                name: name.into(),
                asset_id: None,
                category_id: None,
                billing_type: BillingType::PerHour,
                price,
                min_duration: None,
                day_of_week_start: None,
                day_of_week_end: None,
                time_start: None,
                time_end: None,
                priority: Some(priority),
                is_active: None,
            },
            f.base,
        )
    }

    #[test]
    fn test_higher_priority_wins_over_specificity() {
        let f = fixture();
        let mut specific = rule(&f, "asset", dec!(100), 0);
        specific.asset_id = Some(f.asset.id);
        let broad = rule(&f, "tenant", dec!(200), 5);

        let rate = PricingResolver::new()
            .resolve(&f.asset, &[specific, broad.clone()], &f.settings, f.base)
            .unwrap();
        assert_eq!(rate.pricing_rule_id, Some(broad.id));
        assert_eq!(rate.source, RateSource::Rule);
    }

    #[test]
    fn test_specificity_breaks_priority_tie() {
        let f = fixture();
        let tenant_rule = rule(&f, "tenant", dec!(300), 1);
        let mut category_rule = rule(&f, "category", dec!(200), 1);
        category_rule.category_id = f.asset.category_id;
        let mut asset_rule = rule(&f, "asset", dec!(100), 1);
        asset_rule.asset_id = Some(f.asset.id);

        let rules = vec![tenant_rule, asset_rule.clone(), category_rule];
        let rate = PricingResolver::new()
            .resolve(&f.asset, &rules, &f.settings, f.base)
            .unwrap();
        assert_eq!(rate.pricing_rule_id, Some(asset_rule.id));
    }

    #[test]
    fn test_newest_then_id_breaks_remaining_ties() {
        let f = fixture();
        let older = rule(&f, "older", dec!(100), 0);
        let mut newer = rule(&f, "newer", dec!(200), 0);
        newer.created_at = f.base + Duration::seconds(1);

        let rate = PricingResolver::new()
            .resolve(&f.asset, &[older.clone(), newer.clone()], &f.settings, f.base)
            .unwrap();
        assert_eq!(rate.pricing_rule_id, Some(newer.id));

        // Same timestamp: deterministic regardless of input order.
        let a = rule(&f, "a", dec!(1), 0);
        let b = rule(&f, "b", dec!(2), 0);
        let r1 = PricingResolver::new()
            .resolve(&f.asset, &[a.clone(), b.clone()], &f.settings, f.base)
            .unwrap();
        let r2 = PricingResolver::new()
            .resolve(&f.asset, &[b, a], &f.settings, f.base)
            .unwrap();
        assert_eq!(r1, r2);
    }

    #[test]
    fn test_window_uses_tenant_offset() {
        let mut f = fixture();
        // 10:00 UTC is 17:00 at UTC+7.
        f.settings.utc_offset_minutes = 7 * 60;
        let mut evening = rule(&f, "evening", dec!(500), 10);
        evening.time_start = NaiveTime::from_hms_opt(17, 0, 0);
        evening.time_end = NaiveTime::from_hms_opt(23, 0, 0);
        let base = rule(&f, "base", dec!(100), 0);

        let resolver = PricingResolver::new();
        let rate = resolver
            .resolve(&f.asset, &[evening.clone(), base.clone()], &f.settings, f.base)
            .unwrap();
        assert_eq!(rate.pricing_rule_id, Some(evening.id));

        f.settings.utc_offset_minutes = 0;
        let rate = resolver
            .resolve(&f.asset, &[evening, base.clone()], &f.settings, f.base)
            .unwrap();
        assert_eq!(rate.pricing_rule_id, Some(base.id));
    }

    #[test]
    fn test_ignores_inactive_foreign_and_other_scopes() {
        let f = fixture();
        let mut inactive = rule(&f, "inactive", dec!(1), 100);
        inactive.is_active = false;
        let mut other_asset = rule(&f, "other", dec!(2), 100);
        other_asset.asset_id = Some(AssetId::new());
        let mut other_tenant = rule(&f, "foreign", dec!(3), 100);
        other_tenant.tenant_id = TenantId::new();

        let rules = vec![inactive, other_asset, other_tenant];
        let err = PricingResolver::new()
            .resolve(&f.asset, &rules, &f.settings, f.base)
            .unwrap_err();
        assert_eq!(err.kind, rentflow_core::error::ErrorKind::NoApplicableRate);
    }

    #[test]
    fn test_falls_back_to_tenant_default() {
        let mut f = fixture();
        f.settings.default_price = Some(dec!(8000));
        f.settings.default_billing_type = BillingType::PerMinute;

        let rate = PricingResolver::new()
            .resolve(&f.asset, &[], &f.settings, f.base)
            .unwrap();
        assert_eq!(rate.price, dec!(8000));
        assert_eq!(rate.billing_type, BillingType::PerMinute);
        assert_eq!(rate.source, RateSource::TenantDefault);
        assert!(rate.pricing_rule_id.is_none());
    }

    #[test]
    fn test_manual_rate_is_fixed() {
        let rate = ResolvedRate::manual(dec!(20000));
        assert_eq!(rate.billing_type, BillingType::Fixed);
        assert_eq!(rate.source, RateSource::Manual);
    }
}
