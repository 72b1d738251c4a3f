use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

use rentflow_billing::promotion::PromotionRejection;
use rentflow_core::error::ErrorKind;
use rentflow_core::traits::ManualClock;
use rentflow_core::types::{CustomFields, PageRequest};
use rentflow_database::{CatalogStore, MemoryStore, RentalLedger};
use rentflow_entity::asset::{Asset, CreateAsset};
use rentflow_entity::pricing::{BillingType, CreatePricingRule, PricingRule};
use rentflow_entity::promotion::{CreatePromotion, DiscountType, Promotion};
use rentflow_entity::rental::{PaymentType, SessionFilter, SessionStatus};
use rentflow_entity::tenant::TenantSettings;

use super::*;
use crate::context::TenantContext;
use rentflow_core::types::TenantId;

struct Harness {
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    sessions: RentalSessionService,
    ctx: TenantContext,
}

fn ten_am() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap()
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(ten_am()));
    let sessions = RentalSessionService::new(store.clone(), store.clone(), clock.clone());
    Harness {
        store,
        clock,
        sessions,
        ctx: TenantContext::new(TenantId::new()),
    }
}

async fn add_asset(h: &Harness) -> Asset {
    let asset = Asset::from_create(
        h.ctx.tenant_id,
        CreateAsset {
            name: "Table 1".into(),
            category_id: None,
            description: None,
            sort_order: None,
            is_active: None,
            custom_fields: None,
        },
        ten_am(),
    );
    h.store.insert_asset(&asset).await.unwrap()
}

async fn add_rule(h: &Harness, billing_type: BillingType, price: rust_decimal::Decimal) {
    let rule = PricingRule::from_create(
        h.ctx.tenant_id,
        CreatePricingRule {
            name: "Standard".into(),
            asset_id: None,
            category_id: None,
            billing_type,
            price,
            min_duration: None,
            day_of_week_start: None,
            day_of_week_end: None,
            time_start: None,
            time_end: None,
            priority: None,
            is_active: None,
        },
        ten_am(),
    );
    h.store.insert_rule(&rule).await.unwrap();
}

async fn add_promotion(h: &Harness, code: &str, max_usages: Option<i32>, used: i32) -> Promotion {
    let mut promotion = Promotion::from_create(
        h.ctx.tenant_id,
        CreatePromotion {
            name: "Happy hour".into(),
            code: code.into(),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            min_session_duration: None,
            min_total_amount: None,
            max_usages,
            valid_from: None,
            valid_until: None,
            is_active: None,
        },
        ten_am(),
    );
    promotion.current_usages = used;
    h.store.insert_promotion(&promotion).await.unwrap()
}

fn start_request(asset: &Asset) -> StartSessionRequest {
    StartSessionRequest {
        asset_id: asset.id,
        planned_duration: None,
        fixed_price: None,
        metadata: CustomFields::new(),
    }
}

fn cash() -> StopSessionRequest {
    StopSessionRequest {
        payment_type: PaymentType::Cash,
        promotion_code: None,
        units: None,
    }
}

#[tokio::test]
async fn test_per_hour_half_hour_stop() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;

    let session = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.price_snapshot, dec!(10000));
    assert!(session.pricing_rule_id.is_some());

    h.clock.advance(Duration::minutes(30));
    let stopped = h.sessions.stop(&h.ctx, session.id, cash()).await.unwrap();

    let closed = stopped.session;
    assert_eq!(closed.status, SessionStatus::Completed);
    assert_eq!(closed.actual_duration, Some(30));
    assert_eq!(closed.subtotal, Some(dec!(5000)));
    assert_eq!(closed.total_cost, Some(dec!(5000)));
    assert_eq!(closed.ended_at, Some(ten_am() + Duration::minutes(30)));
    assert_eq!(closed.payment_type, Some(PaymentType::Cash));
    assert!(stopped.promotion.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_yield_one_session() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;

    let a = {
        let sessions = h.sessions.clone();
        let req = start_request(&asset);
        let ctx = h.ctx;
        tokio::spawn(async move { sessions.start(&ctx, req).await })
    };
    let b = {
        let sessions = h.sessions.clone();
        let req = start_request(&asset);
        let ctx = h.ctx;
        tokio::spawn(async move { sessions.start(&ctx, req).await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let occupied = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind == ErrorKind::AssetOccupied))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(occupied, 1);

    let active = h
        .sessions
        .list(
            &h.ctx,
            &SessionFilter {
                status: Some(SessionStatus::Active),
                ..SessionFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(active.total_items, 1);
}

#[tokio::test]
async fn test_manual_fixed_price_ignores_elapsed_time() {
    let h = harness();
    let asset = add_asset(&h).await;

    let mut req = start_request(&asset);
    req.planned_duration = Some(60);
    req.fixed_price = Some(dec!(20000));
    let session = h.sessions.start(&h.ctx, req).await.unwrap();
    assert_eq!(session.billing_type, BillingType::Fixed);
    assert!(session.pricing_rule_id.is_none());

    h.clock.advance(Duration::minutes(10));
    let stopped = h.sessions.stop(&h.ctx, session.id, cash()).await.unwrap();
    assert_eq!(stopped.session.total_cost, Some(dec!(20000)));
}

#[tokio::test]
async fn test_exhausted_promotion_still_closes_session() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;
    add_promotion(&h, "ONCE", Some(1), 1).await;

    let session = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
    h.clock.advance(Duration::minutes(60));

    let mut req = cash();
    req.promotion_code = Some("once".into());
    let stopped = h.sessions.stop(&h.ctx, session.id, req).await.unwrap();

    let outcome = stopped.promotion.unwrap();
    assert!(!outcome.applied);
    assert_eq!(outcome.reason, Some(PromotionRejection::Exhausted));
    assert_eq!(outcome.discount_amount, dec!(0));
    assert_eq!(stopped.session.status, SessionStatus::Completed);
    assert_eq!(stopped.session.total_cost, Some(dec!(10000)));
    assert!(stopped.session.promotion_id.is_none());
}

#[tokio::test]
async fn test_per_minute_long_session() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerMinute, dec!(100)).await;

    let session = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
    h.clock.advance(Duration::minutes(125));
    let stopped = h.sessions.stop(&h.ctx, session.id, cash()).await.unwrap();
    assert_eq!(stopped.session.subtotal, Some(dec!(12500)));
}

#[tokio::test]
async fn test_percentage_promotion_is_redeemed() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;
    let promotion = add_promotion(&h, "TENOFF", Some(5), 0).await;

    let session = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
    h.clock.advance(Duration::minutes(30));

    let mut req = cash();
    req.promotion_code = Some("TenOff".into());
    let stopped = h.sessions.stop(&h.ctx, session.id, req).await.unwrap();

    assert!(stopped.promotion.as_ref().unwrap().applied);
    assert_eq!(stopped.session.discount_amount, dec!(500));
    assert_eq!(stopped.session.total_cost, Some(dec!(4500)));
    assert_eq!(stopped.session.promotion_id, Some(promotion.id));

    let stored = h
        .store
        .find_promotion(h.ctx.tenant_id, promotion.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.current_usages, 1);
}

#[tokio::test]
async fn test_unknown_code_is_not_an_error() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(6000)).await;

    let session = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
    h.clock.advance(Duration::minutes(10));

    let mut req = cash();
    req.promotion_code = Some("NOPE".into());
    let stopped = h.sessions.stop(&h.ctx, session.id, req).await.unwrap();
    let outcome = stopped.promotion.unwrap();
    assert_eq!(outcome.reason, Some(PromotionRejection::NotFound));
    assert_eq!(stopped.session.total_cost, Some(dec!(1000)));
}

#[tokio::test]
async fn test_second_stop_is_rejected_without_double_charge() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;

    let session = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
    h.clock.advance(Duration::minutes(30));
    let first = h.sessions.stop(&h.ctx, session.id, cash()).await.unwrap();

    h.clock.advance(Duration::minutes(30));
    let err = h.sessions.stop(&h.ctx, session.id, cash()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionClosed);

    let stored = h.sessions.get(&h.ctx, session.id).await.unwrap();
    assert_eq!(stored.total_cost, first.session.total_cost);
    assert_eq!(stored.ended_at, first.session.ended_at);
}

#[tokio::test]
async fn test_cancel_frees_asset_without_charge() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;

    let session = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
    h.clock.advance(Duration::minutes(5));
    let cancelled = h.sessions.cancel(&h.ctx, session.id).await.unwrap();
    assert_eq!(cancelled.status, SessionStatus::Cancelled);
    assert!(cancelled.total_cost.is_none());
    assert!(cancelled.ended_at.is_some());

    let err = h.sessions.cancel(&h.ctx, session.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionClosed);

    h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
}

#[tokio::test]
async fn test_expire_bills_planned_duration() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;

    let mut req = start_request(&asset);
    req.planned_duration = Some(60);
    let session = h.sessions.start(&h.ctx, req).await.unwrap();

    h.clock.advance(Duration::minutes(30));
    let err = h.sessions.expire(&h.ctx, session.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    h.clock.advance(Duration::minutes(45));
    let summary = h.sessions.expire_overdue().await.unwrap();
    assert_eq!(summary.expired, 1);

    let expired = h.sessions.get(&h.ctx, session.id).await.unwrap();
    assert_eq!(expired.status, SessionStatus::Expired);
    assert_eq!(expired.actual_duration, Some(60));
    assert_eq!(expired.ended_at, Some(ten_am() + Duration::minutes(60)));
    assert_eq!(expired.total_cost, Some(dec!(10000)));
    assert!(expired.payment_type.is_none());

    let again = h.sessions.expire_overdue().await.unwrap();
    assert_eq!(again.scanned, 0);
}

#[tokio::test]
async fn test_expiry_waits_for_grace() {
    let mut h = harness();
    h.sessions = h.sessions.clone().with_expiry_grace(5);
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;

    let mut req = start_request(&asset);
    req.planned_duration = Some(60);
    h.sessions.start(&h.ctx, req).await.unwrap();

    h.clock.advance(Duration::minutes(63));
    assert_eq!(h.sessions.expire_overdue().await.unwrap().expired, 0);

    h.clock.advance(Duration::minutes(2));
    assert_eq!(h.sessions.expire_overdue().await.unwrap().expired, 1);
}

#[tokio::test]
async fn test_open_ended_session_never_expires() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;
    let session = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();

    h.clock.advance(Duration::hours(12));
    assert_eq!(h.sessions.expire_overdue().await.unwrap().scanned, 0);
    let err = h.sessions.expire(&h.ctx, session.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_no_rule_and_no_default_price() {
    let h = harness();
    let asset = add_asset(&h).await;

    let err = h
        .sessions
        .start(&h.ctx, start_request(&asset))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoApplicableRate);
    assert!(
        h.store
            .active_session_for_asset(h.ctx.tenant_id, asset.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_tenant_default_price_fallback() {
    let h = harness();
    let asset = add_asset(&h).await;
    let mut settings = TenantSettings::defaults_for(h.ctx.tenant_id, ten_am());
    settings.default_billing_type = BillingType::PerMinute;
    settings.default_price = Some(dec!(50));
    h.store.save_tenant_settings(&settings).await.unwrap();

    let session = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
    assert_eq!(session.billing_type, BillingType::PerMinute);
    assert!(session.pricing_rule_id.is_none());

    h.clock.advance(Duration::minutes(3));
    let preview = h.sessions.running_cost(&h.ctx, session.id, None).await.unwrap();
    assert_eq!(preview.cost, dec!(150));
}

#[tokio::test]
async fn test_running_cost_then_final() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;
    let session = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();

    h.clock.advance(Duration::minutes(15));
    let preview = h.sessions.running_cost(&h.ctx, session.id, None).await.unwrap();
    assert_eq!(preview.cost, dec!(2500));
    assert_eq!(preview.status, SessionStatus::Active);

    h.clock.advance(Duration::minutes(15));
    h.sessions.stop(&h.ctx, session.id, cash()).await.unwrap();
    h.clock.advance(Duration::minutes(60));
    let closed = h.sessions.running_cost(&h.ctx, session.id, None).await.unwrap();
    assert_eq!(closed.cost, dec!(5000));
    assert_eq!(closed.elapsed_minutes, dec!(30));
}

#[tokio::test]
async fn test_per_game_defaults_to_one_unit() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerGame, dec!(3000)).await;

    let first = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
    let stopped = h.sessions.stop(&h.ctx, first.id, cash()).await.unwrap();
    assert_eq!(stopped.session.units, Some(1));
    assert_eq!(stopped.session.total_cost, Some(dec!(3000)));

    let second = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
    let mut req = cash();
    req.units = Some(4);
    let stopped = h.sessions.stop(&h.ctx, second.id, req).await.unwrap();
    assert_eq!(stopped.session.total_cost, Some(dec!(12000)));
}

#[tokio::test]
async fn test_inactive_and_missing_assets() {
    let h = harness();
    let mut asset = add_asset(&h).await;
    asset.is_active = false;
    h.store.update_asset(&asset).await.unwrap();

    let err = h
        .sessions
        .start(&h.ctx, start_request(&asset))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let other = TenantContext::new(TenantId::new());
    let err = h
        .sessions
        .start(&other, start_request(&asset))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stops_redeem_capped_code_once() {
    let h = harness();
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;
    let promotion = add_promotion(&h, "SOLO", Some(1), 0).await;

    let first = add_asset(&h).await;
    let second = add_asset(&h).await;
    let a = h.sessions.start(&h.ctx, start_request(&first)).await.unwrap();
    let b = h.sessions.start(&h.ctx, start_request(&second)).await.unwrap();
    h.clock.advance(Duration::minutes(60));

    let stop_with_code = |id| {
        let sessions = h.sessions.clone();
        let ctx = h.ctx;
        tokio::spawn(async move {
            let mut req = cash();
            req.promotion_code = Some("solo".into());
            sessions.stop(&ctx, id, req).await
        })
    };
    let (ra, rb) = tokio::join!(stop_with_code(a.id), stop_with_code(b.id));
    let outcomes = [ra.unwrap().unwrap(), rb.unwrap().unwrap()];

    let applied: Vec<_> = outcomes
        .iter()
        .filter(|s| s.promotion.as_ref().unwrap().applied)
        .collect();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].session.total_cost, Some(dec!(9000)));

    let rejected = outcomes
        .iter()
        .find(|s| !s.promotion.as_ref().unwrap().applied)
        .unwrap();
    assert_eq!(
        rejected.promotion.as_ref().unwrap().reason,
        Some(PromotionRejection::Exhausted)
    );
    assert_eq!(rejected.session.status, SessionStatus::Completed);
    assert_eq!(rejected.session.total_cost, Some(dec!(10000)));
    assert!(rejected.session.promotion_id.is_none());

    let stored = h
        .store
        .find_promotion(h.ctx.tenant_id, promotion.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.current_usages, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_double_stop_closes_once() {
    let h = harness();
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;
    let session = h.sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
    h.clock.advance(Duration::minutes(30));

    let stop = || {
        let sessions = h.sessions.clone();
        let ctx = h.ctx;
        let id = session.id;
        tokio::spawn(async move { sessions.stop(&ctx, id, cash()).await })
    };
    let (r1, r2) = tokio::join!(stop(), stop());
    let results = [r1.unwrap(), r2.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let err = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(
        err.kind,
        ErrorKind::SessionNotActive | ErrorKind::SessionClosed
    ));

    let stored = h.sessions.get(&h.ctx, session.id).await.unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert_eq!(stored.total_cost, Some(dec!(5000)));
    assert!(h.store.occupancy().holder(asset.id).await.unwrap().is_none());
}

/// Ledger that lets another redemption exhaust the promotion just before
/// each close is applied.
#[derive(Debug)]
struct RedeemedFirst {
    store: Arc<MemoryStore>,
}

#[async_trait::async_trait]
impl RentalLedger for RedeemedFirst {
    async fn open_session(
        &self,
        session: rentflow_entity::rental::NewRentalSession,
    ) -> rentflow_core::AppResult<rentflow_entity::rental::RentalSession> {
        self.store.open_session(session).await
    }

    async fn close_session(
        &self,
        closure: rentflow_entity::rental::SessionClosure,
    ) -> rentflow_core::AppResult<rentflow_entity::rental::ClosedSession> {
        if let Some(id) = closure.promotion_id {
            let mut promotion = self
                .store
                .find_promotion(closure.tenant_id, id)
                .await?
                .unwrap();
            promotion.max_usages = Some(promotion.current_usages);
            self.store.update_promotion(&promotion).await?;
        }
        self.store.close_session(closure).await
    }

    async fn find_session(
        &self,
        tenant_id: TenantId,
        id: rentflow_core::types::RentalSessionId,
    ) -> rentflow_core::AppResult<Option<rentflow_entity::rental::RentalSession>> {
        self.store.find_session(tenant_id, id).await
    }

    async fn active_session_for_asset(
        &self,
        tenant_id: TenantId,
        asset_id: rentflow_core::types::AssetId,
    ) -> rentflow_core::AppResult<Option<rentflow_entity::rental::RentalSession>> {
        self.store.active_session_for_asset(tenant_id, asset_id).await
    }

    async fn list_sessions(
        &self,
        tenant_id: TenantId,
        filter: &SessionFilter,
        page: PageRequest,
    ) -> rentflow_core::AppResult<
        rentflow_core::types::PageResponse<rentflow_entity::rental::RentalSession>,
    > {
        self.store.list_sessions(tenant_id, filter, page).await
    }

    async fn asset_has_sessions(
        &self,
        tenant_id: TenantId,
        asset_id: rentflow_core::types::AssetId,
    ) -> rentflow_core::AppResult<bool> {
        self.store.asset_has_sessions(tenant_id, asset_id).await
    }

    async fn find_overdue_sessions(
        &self,
        now: DateTime<Utc>,
        grace_minutes: i64,
    ) -> rentflow_core::AppResult<Vec<rentflow_entity::rental::RentalSession>> {
        self.store.find_overdue_sessions(now, grace_minutes).await
    }

    async fn list_active_sessions(
        &self,
    ) -> rentflow_core::AppResult<Vec<rentflow_entity::rental::RentalSession>> {
        self.store.list_active_sessions().await
    }

    fn occupancy(&self) -> Arc<dyn rentflow_billing::occupancy::OccupancyGuard> {
        self.store.occupancy()
    }

    async fn health_check(&self) -> rentflow_core::AppResult<bool> {
        self.store.health_check().await
    }
}

#[tokio::test]
async fn test_redemption_lost_at_close_reports_exhausted() {
    let h = harness();
    let ledger = Arc::new(RedeemedFirst {
        store: h.store.clone(),
    });
    let sessions = RentalSessionService::new(ledger, h.store.clone(), h.clock.clone());
    let asset = add_asset(&h).await;
    add_rule(&h, BillingType::PerHour, dec!(10000)).await;
    let promotion = add_promotion(&h, "LAST", Some(1), 0).await;

    let session = sessions.start(&h.ctx, start_request(&asset)).await.unwrap();
    h.clock.advance(Duration::minutes(60));

    let mut req = cash();
    req.promotion_code = Some("LAST".into());
    let stopped = sessions.stop(&h.ctx, session.id, req).await.unwrap();

    let outcome = stopped.promotion.unwrap();
    assert!(!outcome.applied);
    assert_eq!(outcome.reason, Some(PromotionRejection::Exhausted));
    assert_eq!(outcome.discount_amount, dec!(0));
    assert_eq!(stopped.session.total_cost, Some(dec!(10000)));
    assert_eq!(stopped.session.discount_amount, dec!(0));

    let stored = h
        .store
        .find_promotion(h.ctx.tenant_id, promotion.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.current_usages, 0);
}
