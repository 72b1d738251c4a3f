//! Promotion entity model.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rentflow_core::types::{PromotionId, TenantId};

/// How a promotion's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "discount_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Percent of the subtotal (0-100).
    Percentage,
    /// Absolute amount in whole currency units.
    FixedAmount,
}

impl DiscountType {
    /// Return the discount type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::FixedAmount => "fixed_amount",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A discount code with eligibility rules and a usage cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Promotion {
    /// Unique promotion identifier.
    pub id: PromotionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Code entered at checkout. Unique per tenant, case-insensitive.
    pub code: String,
    /// Discount interpretation.
    pub discount_type: DiscountType,
    /// Percent or amount.
    pub discount_value: Decimal,
    /// Minimum session length in minutes.
    pub min_session_duration: Option<i32>,
    /// Minimum subtotal.
    pub min_total_amount: Option<Decimal>,
    /// Maximum redemptions; `None` is unlimited.
    pub max_usages: Option<i32>,
    /// Redemptions so far.
    pub current_usages: i32,
    /// Start of validity, inclusive.
    pub valid_from: Option<DateTime<Utc>>,
    /// End of validity, inclusive.
    pub valid_until: Option<DateTime<Utc>>,
    /// Inactive promotions are treated as unknown codes.
    pub is_active: bool,
    /// When the promotion was created.
    pub created_at: DateTime<Utc>,
    /// When the promotion was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// Normalized form used for case-insensitive lookup.
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    /// Whether the usage cap has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.max_usages
            .is_some_and(|max| self.current_usages >= max)
    }

    /// Build a new row from a create request.
    pub fn from_create(tenant_id: TenantId, data: CreatePromotion, now: DateTime<Utc>) -> Self {
        Self {
            id: PromotionId::new(),
            tenant_id,
            name: data.name,
            code: Self::normalize_code(&data.code),
            discount_type: data.discount_type,
            discount_value: data.discount_value,
            min_session_duration: data.min_session_duration,
            min_total_amount: data.min_total_amount,
            max_usages: data.max_usages,
            current_usages: 0,
            valid_from: data.valid_from,
            valid_until: data.valid_until,
            is_active: data.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. The usage counter is never touched here.
    pub fn apply(&mut self, update: UpdatePromotion, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(code) = update.code {
            self.code = Self::normalize_code(&code);
        }
        if let Some(discount_type) = update.discount_type {
            self.discount_type = discount_type;
        }
        if let Some(value) = update.discount_value {
            self.discount_value = value;
        }
        if let Some(min) = update.min_session_duration {
            self.min_session_duration = min;
        }
        if let Some(min) = update.min_total_amount {
            self.min_total_amount = min;
        }
        if let Some(max) = update.max_usages {
            self.max_usages = max;
        }
        if let Some(from) = update.valid_from {
            self.valid_from = from;
        }
        if let Some(until) = update.valid_until {
            self.valid_until = until;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
    }
}

/// Data required to create a promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePromotion {
    /// Display name.
    pub name: String,
    /// Redemption code.
    pub code: String,
    /// Discount interpretation.
    pub discount_type: DiscountType,
    /// Percent or amount.
    pub discount_value: Decimal,
    /// Minimum session length in minutes.
    pub min_session_duration: Option<i32>,
    /// Minimum subtotal.
    pub min_total_amount: Option<Decimal>,
    /// Usage cap.
    pub max_usages: Option<i32>,
    /// Start of validity.
    pub valid_from: Option<DateTime<Utc>>,
    /// End of validity.
    pub valid_until: Option<DateTime<Utc>>,
    /// Active flag (default `true`).
    pub is_active: Option<bool>,
}

/// Partial promotion update. A present-but-null nullable field clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePromotion {
    /// New name.
    pub name: Option<String>,
    /// New code.
    pub code: Option<String>,
    /// New discount type.
    pub discount_type: Option<DiscountType>,
    /// New discount value.
    pub discount_value: Option<Decimal>,
    /// New minimum session length.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub min_session_duration: Option<Option<i32>>,
    /// New minimum subtotal.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub min_total_amount: Option<Option<Decimal>>,
    /// New usage cap.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub max_usages: Option<Option<i32>>,
    /// New start of validity.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<Option<DateTime<Utc>>>,
    /// New end of validity.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<Option<DateTime<Utc>>>,
    /// New active flag.
    pub is_active: Option<bool>,
}
