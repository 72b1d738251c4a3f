//! Promotion validation.
//!
//! Checks run in a fixed order and the first failure becomes the reason.
//! Rejections are outcomes, never errors: a stop with a bad code still
//! closes the session at full price.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rentflow_core::types::PromotionId;
use rentflow_entity::promotion::{DiscountType, Promotion};

use crate::accrual::round_currency;

/// Why a promotion was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromotionRejection {
    /// Unknown, inactive, or mismatched code.
    #[serde(rename = "PROMOTION_NOT_FOUND")]
    NotFound,
    /// Outside the validity window.
    #[serde(rename = "PROMOTION_EXPIRED")]
    Expired,
    /// Session too short or subtotal too low.
    #[serde(rename = "PROMOTION_MINIMUM_NOT_MET")]
    MinimumNotMet,
    /// Usage cap reached.
    #[serde(rename = "PROMOTION_EXHAUSTED")]
    Exhausted,
}

impl PromotionRejection {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "PROMOTION_NOT_FOUND",
            Self::Expired => "PROMOTION_EXPIRED",
            Self::MinimumNotMet => "PROMOTION_MINIMUM_NOT_MET",
            Self::Exhausted => "PROMOTION_EXHAUSTED",
        }
    }
}

impl fmt::Display for PromotionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The session figures a promotion is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionContext {
    /// Evaluation instant.
    pub now: DateTime<Utc>,
    /// Session length in whole minutes.
    pub duration_minutes: i32,
    /// Cost before discount.
    pub subtotal: Decimal,
}

/// Result of validating a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionOutcome {
    /// Whether the discount applies.
    pub applied: bool,
    /// Discount in whole currency units; zero when not applied.
    pub discount_amount: Decimal,
    /// Rejection reason when not applied.
    pub reason: Option<PromotionRejection>,
    /// The promotion that was evaluated, if one was found.
    pub promotion_id: Option<PromotionId>,
}

impl PromotionOutcome {
    /// An accepted promotion.
    pub fn applied(promotion_id: PromotionId, discount_amount: Decimal) -> Self {
        Self {
            applied: true,
            discount_amount,
            reason: None,
            promotion_id: Some(promotion_id),
        }
    }

    /// A rejected promotion.
    pub fn rejected(reason: PromotionRejection, promotion_id: Option<PromotionId>) -> Self {
        Self {
            applied: false,
            discount_amount: Decimal::ZERO,
            reason: Some(reason),
            promotion_id,
        }
    }

    /// Downgrade after the store refused the redemption.
    pub fn lost_redemption(self) -> Self {
        Self::rejected(PromotionRejection::Exhausted, self.promotion_id)
    }
}

/// Stateless promotion validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionValidator;

impl PromotionValidator {
    /// Create a validator.
    pub fn new() -> Self {
        Self
    }

    /// Validate `code` against the looked-up promotion.
    pub fn validate(
        &self,
        promotion: Option<&Promotion>,
        code: &str,
        ctx: &PromotionContext,
    ) -> PromotionOutcome {
        let Some(promotion) = promotion.filter(|p| p.is_active) else {
            return PromotionOutcome::rejected(PromotionRejection::NotFound, None);
        };
        let id = Some(promotion.id);

        if Promotion::normalize_code(code) != Promotion::normalize_code(&promotion.code) {
            return PromotionOutcome::rejected(PromotionRejection::NotFound, None);
        }

        let started = promotion.valid_from.is_none_or(|from| ctx.now >= from);
        let not_ended = promotion.valid_until.is_none_or(|until| ctx.now <= until);
        if !started || !not_ended {
            return PromotionOutcome::rejected(PromotionRejection::Expired, id);
        }

        if promotion
            .min_session_duration
            .is_some_and(|min| ctx.duration_minutes < min)
        {
            return PromotionOutcome::rejected(PromotionRejection::MinimumNotMet, id);
        }

        if promotion
            .min_total_amount
            .is_some_and(|min| ctx.subtotal < min)
        {
            return PromotionOutcome::rejected(PromotionRejection::MinimumNotMet, id);
        }

        if promotion.is_exhausted() {
            return PromotionOutcome::rejected(PromotionRejection::Exhausted, id);
        }

        PromotionOutcome::applied(promotion.id, Self::discount_for(promotion, ctx.subtotal))
    }

    /// Discount for `subtotal`, capped at the subtotal and never negative.
    pub fn discount_for(promotion: &Promotion, subtotal: Decimal) -> Decimal {
        let raw = match promotion.discount_type {
            DiscountType::Percentage => {
                round_currency(subtotal * promotion.discount_value / Decimal::ONE_HUNDRED)
            }
            DiscountType::FixedAmount => promotion.discount_value,
        };
        raw.clamp(Decimal::ZERO, subtotal.max(Decimal::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rentflow_core::types::TenantId;
    use rentflow_entity::promotion::CreatePromotion;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap()
    }

    fn promo(discount_type: DiscountType, value: Decimal) -> Promotion {
        Promotion::from_create(
            TenantId::new(),
            CreatePromotion {
                name: "Promo".into(),
                code: "SAVE".into(),
                discount_type,
                discount_value: value,
                min_session_duration: None,
                min_total_amount: None,
                max_usages: None,
                valid_from: None,
                valid_until: None,
                is_active: None,
            },
            now(),
        )
    }

    fn ctx(duration_minutes: i32, subtotal: Decimal) -> PromotionContext {
        PromotionContext {
            now: now(),
            duration_minutes,
            subtotal,
        }
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        let p = promo(DiscountType::Percentage, dec!(15));
        // 15% of 4170 = 625.5
        let outcome = PromotionValidator::new().validate(Some(&p), "save", &ctx(30, dec!(4170)));
        assert!(outcome.applied);
        assert_eq!(outcome.discount_amount, dec!(626));
        assert_eq!(outcome.promotion_id, Some(p.id));
    }

    #[test]
    fn test_fixed_amount_capped_at_subtotal() {
        let p = promo(DiscountType::FixedAmount, dec!(10000));
        let outcome = PromotionValidator::new().validate(Some(&p), "SAVE", &ctx(30, dec!(4000)));
        assert!(outcome.applied);
        assert_eq!(outcome.discount_amount, dec!(4000));
    }

    #[test]
    fn test_missing_inactive_and_mismatched_are_not_found() {
        let validator = PromotionValidator::new();
        let c = ctx(30, dec!(5000));
        assert_eq!(
            validator.validate(None, "SAVE", &c).reason,
            Some(PromotionRejection::NotFound)
        );

        let mut inactive = promo(DiscountType::Percentage, dec!(10));
        inactive.is_active = false;
        assert_eq!(
            validator.validate(Some(&inactive), "SAVE", &c).reason,
            Some(PromotionRejection::NotFound)
        );

        let p = promo(DiscountType::Percentage, dec!(10));
        assert_eq!(
            validator.validate(Some(&p), "OTHER", &c).reason,
            Some(PromotionRejection::NotFound)
        );
    }

    #[test]
    fn test_validity_window() {
        let validator = PromotionValidator::new();
        let mut p = promo(DiscountType::Percentage, dec!(10));
        p.valid_until = Some(now() - Duration::days(1));
        assert_eq!(
            validator.validate(Some(&p), "SAVE", &ctx(30, dec!(5000))).reason,
            Some(PromotionRejection::Expired)
        );

        p.valid_until = None;
        p.valid_from = Some(now() + Duration::days(1));
        assert_eq!(
            validator.validate(Some(&p), "SAVE", &ctx(30, dec!(5000))).reason,
            Some(PromotionRejection::Expired)
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let validator = PromotionValidator::new();
        let mut p = promo(DiscountType::Percentage, dec!(10));
        p.min_session_duration = Some(60);
        p.max_usages = Some(1);
        p.current_usages = 1;

        let outcome = validator.validate(Some(&p), "SAVE", &ctx(30, dec!(5000)));
        assert_eq!(outcome.reason, Some(PromotionRejection::MinimumNotMet));

        p.min_session_duration = None;
        p.min_total_amount = Some(dec!(10000));
        let outcome = validator.validate(Some(&p), "SAVE", &ctx(30, dec!(5000)));
        assert_eq!(outcome.reason, Some(PromotionRejection::MinimumNotMet));

        p.min_total_amount = None;
        let outcome = validator.validate(Some(&p), "SAVE", &ctx(30, dec!(5000)));
        assert_eq!(outcome.reason, Some(PromotionRejection::Exhausted));
        assert_eq!(outcome.discount_amount, Decimal::ZERO);
    }

    #[test]
    fn test_reason_serializes_as_code() {
        let outcome = PromotionOutcome::applied(PromotionId::new(), dec!(500)).lost_redemption();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["reason"], "PROMOTION_EXHAUSTED");
        assert_eq!(json["applied"], false);
    }
}
