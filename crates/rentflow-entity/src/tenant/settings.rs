//! Tenant settings entity.

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rentflow_core::types::TenantId;

use crate::pricing::BillingType;

/// Billing defaults and locale for one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TenantSettings {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Display symbol for the currency.
    pub currency_symbol: String,
    /// Billing type used when no pricing rule matches.
    pub default_billing_type: BillingType,
    /// Price used when no pricing rule matches. `None` means no fallback.
    pub default_price: Option<Decimal>,
    /// Offset from UTC in minutes; pricing windows are evaluated in this local time.
    pub utc_offset_minutes: i32,
    /// Opening time (informational).
    pub working_hours_start: Option<NaiveTime>,
    /// Closing time (informational).
    pub working_hours_end: Option<NaiveTime>,
    /// When the settings were last changed.
    pub updated_at: DateTime<Utc>,
}

impl TenantSettings {
    /// Settings for a tenant that never configured anything.
    pub fn defaults_for(tenant_id: TenantId, now: DateTime<Utc>) -> Self {
        Self {
            tenant_id,
            currency: "USD".to_string(),
            currency_symbol: "$".to_string(),
            default_billing_type: BillingType::PerHour,
            default_price: None,
            utc_offset_minutes: 0,
            working_hours_start: None,
            working_hours_end: None,
            updated_at: now,
        }
    }

    /// The tenant's local offset. Out-of-range values fall back to UTC.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Apply a partial update.
    pub fn apply(&mut self, update: UpdateTenantSettings, now: DateTime<Utc>) {
        if let Some(currency) = update.currency {
            self.currency = currency;
        }
        if let Some(symbol) = update.currency_symbol {
            self.currency_symbol = symbol;
        }
        if let Some(billing_type) = update.default_billing_type {
            self.default_billing_type = billing_type;
        }
        if let Some(price) = update.default_price {
            self.default_price = price;
        }
        if let Some(offset) = update.utc_offset_minutes {
            self.utc_offset_minutes = offset;
        }
        if let Some(start) = update.working_hours_start {
            self.working_hours_start = start;
        }
        if let Some(end) = update.working_hours_end {
            self.working_hours_end = end;
        }
        self.updated_at = now;
    }
}

/// Partial update of tenant settings. A present-but-null nullable field clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTenantSettings {
    /// New currency code.
    pub currency: Option<String>,
    /// New currency symbol.
    pub currency_symbol: Option<String>,
    /// New default billing type.
    pub default_billing_type: Option<BillingType>,
    /// New default price.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub default_price: Option<Option<Decimal>>,
    /// New UTC offset in minutes.
    pub utc_offset_minutes: Option<i32>,
    /// New opening time.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub working_hours_start: Option<Option<NaiveTime>>,
    /// New closing time.
    #[serde(default, with = "crate::nullable", skip_serializing_if = "Option::is_none")]
    pub working_hours_end: Option<Option<NaiveTime>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_apply_clears_default_price() {
        let now = Utc::now();
        let mut settings = TenantSettings::defaults_for(TenantId::new(), now);
        settings.default_price = Some(dec!(5000));

        let update: UpdateTenantSettings =
            serde_json::from_str(r#"{"default_price": null, "utc_offset_minutes": 420}"#)
                .expect("parse");
        settings.apply(update, now);

        assert_eq!(settings.default_price, None);
        assert_eq!(settings.offset().local_minus_utc(), 420 * 60);
    }

    #[test]
    fn test_absent_field_is_untouched() {
        let now = Utc::now();
        let mut settings = TenantSettings::defaults_for(TenantId::new(), now);
        settings.default_price = Some(dec!(5000));

        let update: UpdateTenantSettings =
            serde_json::from_str(r#"{"currency": "VND"}"#).expect("parse");
        settings.apply(update, now);

        assert_eq!(settings.default_price, Some(dec!(5000)));
        assert_eq!(settings.currency, "VND");
    }
}
