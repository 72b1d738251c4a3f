//! Promotion CRUD and ad-hoc code validation.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use rentflow_billing::accrual::{compute_running_cost, whole_minutes};
use rentflow_billing::promotion::{PromotionContext, PromotionOutcome, PromotionValidator};
use rentflow_core::error::AppError;
use rentflow_core::traits::Clock;
use rentflow_core::types::{PromotionId, RentalSessionId};
use rentflow_database::{CatalogStore, RentalLedger};
use rentflow_entity::promotion::{CreatePromotion, DiscountType, Promotion, UpdatePromotion};

use super::category::require_name;
use crate::context::TenantContext;

/// Manages promotions.
#[derive(Debug, Clone)]
pub struct PromotionService {
    catalog: Arc<dyn CatalogStore>,
    ledger: Arc<dyn RentalLedger>,
    clock: Arc<dyn Clock>,
    validator: PromotionValidator,
}

impl PromotionService {
    /// Creates a new promotion service.
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        ledger: Arc<dyn RentalLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            clock,
            validator: PromotionValidator::new(),
        }
    }

    /// Lists promotions, newest first.
    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<Promotion>, AppError> {
        self.catalog.list_promotions(ctx.tenant_id).await
    }

    /// Gets a promotion by ID.
    pub async fn get(&self, ctx: &TenantContext, id: PromotionId) -> Result<Promotion, AppError> {
        self.catalog
            .find_promotion(ctx.tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Promotion {id} not found")))
    }

    /// Creates a promotion. Codes are stored upper-cased.
    pub async fn create(
        &self,
        ctx: &TenantContext,
        data: CreatePromotion,
    ) -> Result<Promotion, AppError> {
        let promotion = Promotion::from_create(ctx.tenant_id, data, self.clock.now());
        validate_promotion(&promotion)?;
        let created = self.catalog.insert_promotion(&promotion).await?;

        info!(
            tenant_id = %ctx.tenant_id,
            promotion_id = %created.id,
            code = %created.code,
            discount_type = %created.discount_type,
            "Promotion created"
        );
        Ok(created)
    }

    /// Applies a partial update. The usage counter is not editable.
    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: PromotionId,
        update: UpdatePromotion,
    ) -> Result<Promotion, AppError> {
        let mut promotion = self.get(ctx, id).await?;
        promotion.apply(update, self.clock.now());
        validate_promotion(&promotion)?;
        self.catalog.update_promotion(&promotion).await
    }

    /// Deletes a promotion that was never redeemed.
    pub async fn delete(&self, ctx: &TenantContext, id: PromotionId) -> Result<(), AppError> {
        if !self.catalog.delete_promotion(ctx.tenant_id, id).await? {
            return Err(AppError::not_found(format!("Promotion {id} not found")));
        }
        info!(tenant_id = %ctx.tenant_id, promotion_id = %id, "Promotion deleted");
        Ok(())
    }

    /// Checks a code without redeeming it.
    ///
    /// With a session, the check runs against that session's figures as of
    /// now and reports the discount a stop would grant. Without one, only
    /// existence, validity window, and usage cap are checked and the
    /// discount is reported as zero.
    pub async fn validate(
        &self,
        ctx: &TenantContext,
        code: &str,
        session_id: Option<RentalSessionId>,
    ) -> Result<PromotionOutcome, AppError> {
        let now = self.clock.now();
        let promotion = self
            .catalog
            .find_promotion_by_code(ctx.tenant_id, code)
            .await?;

        let Some(session_id) = session_id else {
            let promo_ctx = PromotionContext {
                now,
                duration_minutes: promotion
                    .as_ref()
                    .and_then(|p| p.min_session_duration)
                    .unwrap_or(0),
                subtotal: promotion
                    .as_ref()
                    .and_then(|p| p.min_total_amount)
                    .unwrap_or(Decimal::ZERO),
            };
            let mut outcome = self.validator.validate(promotion.as_ref(), code, &promo_ctx);
            outcome.discount_amount = Decimal::ZERO;
            return Ok(outcome);
        };

        let session = self
            .ledger
            .find_session(ctx.tenant_id, session_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Session {session_id} not found")))?;

        let (duration_minutes, subtotal) = if session.is_active() {
            (
                whole_minutes(session.started_at, now),
                compute_running_cost(
                    session.started_at,
                    session.price_snapshot,
                    session.billing_type,
                    now,
                    session.units,
                    session.min_duration,
                ),
            )
        } else {
            (
                session.actual_duration.unwrap_or(0),
                session.subtotal.unwrap_or(Decimal::ZERO),
            )
        };

        let promo_ctx = PromotionContext {
            now,
            duration_minutes,
            subtotal,
        };
        Ok(self.validator.validate(promotion.as_ref(), code, &promo_ctx))
    }
}

fn validate_promotion(promotion: &Promotion) -> Result<(), AppError> {
    require_name(&promotion.name)?;
    if promotion.code.is_empty() {
        return Err(AppError::validation("code must not be empty"));
    }
    match promotion.discount_type {
        DiscountType::Percentage
            if promotion.discount_value < Decimal::ZERO
                || promotion.discount_value > Decimal::ONE_HUNDRED =>
        {
            return Err(AppError::validation(
                "percentage discount_value must be between 0 and 100",
            ));
        }
        DiscountType::FixedAmount if promotion.discount_value < Decimal::ZERO => {
            return Err(AppError::validation("discount_value must not be negative"));
        }
        _ => {}
    }
    if promotion.max_usages.is_some_and(|max| max < 0) {
        return Err(AppError::validation("max_usages must not be negative"));
    }
    if promotion
        .max_usages
        .is_some_and(|max| max < promotion.current_usages)
    {
        return Err(AppError::validation(format!(
            "max_usages cannot be lowered below the {} redemptions already made",
            promotion.current_usages
        )));
    }
    if promotion.min_session_duration.is_some_and(|min| min < 0) {
        return Err(AppError::validation(
            "min_session_duration must not be negative",
        ));
    }
    if promotion.min_total_amount.is_some_and(|min| min < Decimal::ZERO) {
        return Err(AppError::validation("min_total_amount must not be negative"));
    }
    if let (Some(from), Some(until)) = (promotion.valid_from, promotion.valid_until) {
        if from > until {
            return Err(AppError::validation("valid_from must not be after valid_until"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rentflow_billing::promotion::PromotionRejection;
    use rentflow_core::error::ErrorKind;
    use rentflow_core::traits::ManualClock;
    use rentflow_core::types::TenantId;
    use rentflow_database::MemoryStore;
    use rust_decimal_macros::dec;

    fn service() -> (PromotionService, TenantContext) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap(),
        ));
        (
            PromotionService::new(store.clone(), store, clock),
            TenantContext::new(TenantId::new()),
        )
    }

    fn create(code: &str, max_usages: Option<i32>) -> CreatePromotion {
        CreatePromotion {
            name: "Weekday".into(),
            code: code.into(),
            discount_type: DiscountType::FixedAmount,
            discount_value: dec!(2000),
            min_session_duration: Some(60),
            min_total_amount: Some(dec!(10000)),
            max_usages,
            valid_from: None,
            valid_until: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_usage_cap_cannot_drop_below_redemptions() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap(),
        ));
        let promotions = PromotionService::new(store.clone(), store.clone(), clock);
        let ctx = TenantContext::new(TenantId::new());

        let mut promotion = Promotion::from_create(
            ctx.tenant_id,
            create("WEEKDAY", Some(5)),
            Utc::now(),
        );
        promotion.current_usages = 3;
        let promotion = store.insert_promotion(&promotion).await.unwrap();

        let err = promotions
            .update(
                &ctx,
                promotion.id,
                UpdatePromotion {
                    max_usages: Some(Some(1)),
                    ..UpdatePromotion::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let stored = promotions.get(&ctx, promotion.id).await.unwrap();
        assert_eq!(stored.max_usages, Some(5));
        assert_eq!(stored.current_usages, 3);

        let updated = promotions
            .update(
                &ctx,
                promotion.id,
                UpdatePromotion {
                    max_usages: Some(Some(3)),
                    ..UpdatePromotion::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.max_usages, Some(3));
    }

    #[test]
    fn test_cap_below_usage_is_rejected() {
        let mut promotion = Promotion::from_create(
            TenantId::new(),
            create("WEEKDAY", Some(5)),
            Utc::now(),
        );
        promotion.current_usages = 3;
        promotion.max_usages = Some(1);
        let err = validate_promotion(&promotion).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        promotion.max_usages = Some(3);
        assert!(validate_promotion(&promotion).is_ok());
        promotion.max_usages = None;
        assert!(validate_promotion(&promotion).is_ok());
    }

    #[tokio::test]
    async fn test_validate_without_session_skips_minimums() {
        let (promotions, ctx) = service();
        promotions.create(&ctx, create("WEEKDAY", Some(1))).await.unwrap();

        let outcome = promotions.validate(&ctx, "weekday", None).await.unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.discount_amount, Decimal::ZERO);

        let outcome = promotions.validate(&ctx, "MISSING", None).await.unwrap();
        assert!(!outcome.applied);
        assert_eq!(outcome.reason, Some(PromotionRejection::NotFound));
    }
}
