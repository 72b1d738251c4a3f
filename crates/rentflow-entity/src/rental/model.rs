//! Rental session entity model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rentflow_core::types::{
    AssetId, CustomFields, PricingRuleId, PromotionId, RentalSessionId, TenantId,
};

use super::status::{PaymentType, SessionStatus};
use crate::pricing::BillingType;

/// One rental occupancy period for an asset.
///
/// `price_snapshot` is captured at start and never changes. `total_cost` is
/// `None` while the session is active. `ended_at` is set iff the status is
/// terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RentalSession {
    /// Unique session identifier.
    pub id: RentalSessionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// The rented asset.
    pub asset_id: AssetId,
    /// When the rental began.
    pub started_at: DateTime<Utc>,
    /// When the rental closed.
    pub ended_at: Option<DateTime<Utc>>,
    /// Planned length in minutes; `None` is open-ended.
    pub planned_duration: Option<i32>,
    /// Billed length in whole minutes, set at close.
    pub actual_duration: Option<i32>,
    /// Billing type captured at start.
    pub billing_type: BillingType,
    /// Rate captured at start.
    pub price_snapshot: Decimal,
    /// Rule that produced the rate; `None` for tenant default or manual price.
    pub pricing_rule_id: Option<PricingRuleId>,
    /// Minimum billable minutes captured at start.
    pub min_duration: Option<i32>,
    /// Cost before discount.
    pub subtotal: Option<Decimal>,
    /// Discount applied at close.
    pub discount_amount: Decimal,
    /// Amount charged.
    pub total_cost: Option<Decimal>,
    /// Promotion redeemed at close.
    pub promotion_id: Option<PromotionId>,
    /// Games played, for per-game billing.
    pub units: Option<i32>,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// Payment method, set on completion.
    pub payment_type: Option<PaymentType>,
    /// Opaque client metadata.
    #[sqlx(json)]
    pub metadata: CustomFields,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl RentalSession {
    /// Whether cost is still accruing.
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// When a planned session runs out, if it has a plan.
    pub fn planned_end(&self) -> Option<DateTime<Utc>> {
        self.planned_duration
            .map(|minutes| self.started_at + chrono::Duration::minutes(i64::from(minutes)))
    }

    /// Materialize a freshly started session.
    pub fn from_new(new: NewRentalSession) -> Self {
        Self {
            id: new.id,
            tenant_id: new.tenant_id,
            asset_id: new.asset_id,
            started_at: new.started_at,
            ended_at: None,
            planned_duration: new.planned_duration,
            actual_duration: None,
            billing_type: new.billing_type,
            price_snapshot: new.price_snapshot,
            pricing_rule_id: new.pricing_rule_id,
            min_duration: new.min_duration,
            subtotal: None,
            discount_amount: Decimal::ZERO,
            total_cost: None,
            promotion_id: None,
            units: None,
            status: SessionStatus::Active,
            payment_type: None,
            metadata: new.metadata,
            created_at: new.started_at,
            updated_at: new.started_at,
        }
    }
}

/// Data required to open a session. Built by the lifecycle service after
/// the rate is resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRentalSession {
    /// Pre-generated identifier so the occupancy record can reference it.
    pub id: RentalSessionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Asset to occupy.
    pub asset_id: AssetId,
    /// Start instant.
    pub started_at: DateTime<Utc>,
    /// Planned length in minutes.
    pub planned_duration: Option<i32>,
    /// Resolved billing type.
    pub billing_type: BillingType,
    /// Resolved rate.
    pub price_snapshot: Decimal,
    /// Source rule.
    pub pricing_rule_id: Option<PricingRuleId>,
    /// Minimum billable minutes.
    pub min_duration: Option<i32>,
    /// Client metadata.
    pub metadata: CustomFields,
}

/// Filters for session listings. Every listing is tenant-scoped by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionFilter {
    /// Only sessions on this asset.
    pub asset_id: Option<AssetId>,
    /// Only sessions in this state.
    pub status: Option<SessionStatus>,
    /// Started at or after.
    pub from: Option<DateTime<Utc>>,
    /// Started strictly before.
    pub to: Option<DateTime<Utc>>,
}

impl SessionFilter {
    /// In-process evaluation of the filter.
    pub fn matches(&self, session: &RentalSession) -> bool {
        self.asset_id.is_none_or(|id| session.asset_id == id)
            && self.status.is_none_or(|status| session.status == status)
            && self.from.is_none_or(|from| session.started_at >= from)
            && self.to.is_none_or(|to| session.started_at < to)
    }
}
