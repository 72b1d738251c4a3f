//! Rental session lifecycle: start, stop, cancel, and reads.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use rentflow_billing::accrual::{
    compute_final_cost, compute_running_cost, elapsed_minutes, whole_minutes,
};
use rentflow_billing::pricing::{PricingResolver, ResolvedRate};
use rentflow_billing::promotion::{PromotionContext, PromotionValidator};
use rentflow_core::error::{AppError, ErrorKind};
use rentflow_core::traits::Clock;
use rentflow_core::types::{AssetId, PageRequest, PageResponse, RentalSessionId};
use rentflow_database::{CatalogStore, RentalLedger};
use rentflow_entity::pricing::BillingType;
use rentflow_entity::rental::{NewRentalSession, RentalSession, SessionClosure, SessionFilter};

use super::request::{CostPreview, StartSessionRequest, StopSessionRequest, StoppedSession};
use crate::catalog::tenant::effective_settings;
use crate::context::TenantContext;

/// Drives rental sessions through `active → completed | cancelled | expired`.
///
/// Every transition is a single call on the [`RentalLedger`], which applies
/// it atomically together with the occupancy change and any promotion
/// redemption.
#[derive(Debug, Clone)]
pub struct RentalSessionService {
    pub(super) ledger: Arc<dyn RentalLedger>,
    catalog: Arc<dyn CatalogStore>,
    pub(super) clock: Arc<dyn Clock>,
    resolver: PricingResolver,
    validator: PromotionValidator,
    pub(super) expiry_grace_minutes: i64,
}

impl RentalSessionService {
    /// Creates a new rental session service.
    pub fn new(
        ledger: Arc<dyn RentalLedger>,
        catalog: Arc<dyn CatalogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            clock,
            resolver: PricingResolver::new(),
            validator: PromotionValidator::new(),
            expiry_grace_minutes: 0,
        }
    }

    /// Minutes past the planned end before a session may be expired.
    pub fn with_expiry_grace(mut self, minutes: i64) -> Self {
        self.expiry_grace_minutes = minutes.max(0);
        self
    }

    /// Starts a session on an asset.
    pub async fn start(
        &self,
        ctx: &TenantContext,
        req: StartSessionRequest,
    ) -> Result<RentalSession, AppError> {
        if req.planned_duration.is_some_and(|d| d <= 0) {
            return Err(AppError::validation("planned_duration must be positive"));
        }
        if req.fixed_price.is_some_and(|p| p < Decimal::ZERO) {
            return Err(AppError::validation("fixed_price must not be negative"));
        }

        let asset = self
            .catalog
            .find_asset(ctx.tenant_id, req.asset_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Asset {} not found", req.asset_id)))?;
        if !asset.is_active {
            return Err(AppError::validation(format!(
                "Asset {} is inactive",
                asset.id
            )));
        }

        let now = self.clock.now();
        let rate = match req.fixed_price {
            Some(price) => ResolvedRate::manual(price),
            None => {
                let settings =
                    effective_settings(self.catalog.as_ref(), ctx, self.clock.as_ref()).await?;
                let rules = self.catalog.rules_for_asset(&asset).await?;
                self.resolver.resolve(&asset, &rules, &settings, now)?
            }
        };

        let new = NewRentalSession {
            id: RentalSessionId::new(),
            tenant_id: ctx.tenant_id,
            asset_id: asset.id,
            started_at: now,
            planned_duration: req.planned_duration,
            billing_type: rate.billing_type,
            price_snapshot: rate.price,
            pricing_rule_id: rate.pricing_rule_id,
            min_duration: rate.min_duration,
            metadata: req.metadata,
        };

        let session = match self.ledger.open_session(new).await {
            Ok(session) => session,
            Err(e) => {
                if e.kind == ErrorKind::AssetOccupied {
                    warn!(
                        tenant_id = %ctx.tenant_id,
                        asset_id = %asset.id,
                        "Start rejected: asset already occupied"
                    );
                }
                return Err(e);
            }
        };

        info!(
            tenant_id = %ctx.tenant_id,
            session_id = %session.id,
            asset_id = %session.asset_id,
            billing_type = %session.billing_type,
            price = %session.price_snapshot,
            rate_source = ?rate.source,
            planned_duration = ?session.planned_duration,
            "Rental session started"
        );
        Ok(session)
    }

    /// Stops a session, charging for the elapsed time.
    pub async fn stop(
        &self,
        ctx: &TenantContext,
        id: RentalSessionId,
        req: StopSessionRequest,
    ) -> Result<StoppedSession, AppError> {
        if req.units.is_some_and(|u| u < 0) {
            return Err(AppError::validation("units must not be negative"));
        }

        let session = self.require_open(ctx, id).await?;
        let now = self.clock.now();
        let actual_duration = whole_minutes(session.started_at, now);
        let units = (session.billing_type == BillingType::PerGame)
            .then(|| req.units.unwrap_or(1));
        let subtotal = compute_final_cost(
            actual_duration,
            session.price_snapshot,
            session.billing_type,
            units,
            session.min_duration,
        );

        let outcome = match req.promotion_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                let promotion = self
                    .catalog
                    .find_promotion_by_code(ctx.tenant_id, code)
                    .await?;
                let promo_ctx = PromotionContext {
                    now,
                    duration_minutes: actual_duration,
                    subtotal,
                };
                Some(self.validator.validate(promotion.as_ref(), code, &promo_ctx))
            }
            _ => None,
        };

        let (discount, promotion_id) = match &outcome {
            Some(o) if o.applied => (o.discount_amount, o.promotion_id),
            _ => (Decimal::ZERO, None),
        };

        let closure = SessionClosure::completed(
            &session,
            now,
            actual_duration,
            subtotal,
            discount,
            promotion_id,
            units,
            req.payment_type,
        );
        let closed = self.ledger.close_session(closure).await?;

        let outcome = outcome.map(|o| {
            if o.applied && !closed.promotion_claimed {
                o.lost_redemption()
            } else {
                o
            }
        });
        if let Some(o) = outcome.as_ref().filter(|o| !o.applied) {
            info!(
                tenant_id = %ctx.tenant_id,
                session_id = %id,
                reason = ?o.reason.map(|r| r.code()),
                "Promotion not applied"
            );
        }

        let session = closed.session;
        info!(
            tenant_id = %ctx.tenant_id,
            session_id = %session.id,
            asset_id = %session.asset_id,
            actual_duration = ?session.actual_duration,
            subtotal = ?session.subtotal,
            discount = %session.discount_amount,
            total_cost = ?session.total_cost,
            payment_type = ?session.payment_type,
            "Rental session stopped"
        );

        Ok(StoppedSession {
            session,
            promotion: outcome,
        })
    }

    /// Voids a session without charge.
    pub async fn cancel(
        &self,
        ctx: &TenantContext,
        id: RentalSessionId,
    ) -> Result<RentalSession, AppError> {
        let session = self.require_open(ctx, id).await?;
        let closure = SessionClosure::cancelled(&session, self.clock.now());
        let closed = self.ledger.close_session(closure).await?;

        info!(
            tenant_id = %ctx.tenant_id,
            session_id = %id,
            asset_id = %closed.session.asset_id,
            "Rental session cancelled"
        );
        Ok(closed.session)
    }

    /// Gets a session by ID.
    pub async fn get(
        &self,
        ctx: &TenantContext,
        id: RentalSessionId,
    ) -> Result<RentalSession, AppError> {
        self.ledger
            .find_session(ctx.tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Session {id} not found")))
    }

    /// Lists sessions matching a filter, newest first.
    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: &SessionFilter,
        page: PageRequest,
    ) -> Result<PageResponse<RentalSession>, AppError> {
        self.ledger.list_sessions(ctx.tenant_id, filter, page).await
    }

    /// Session history of one asset.
    pub async fn asset_sessions(
        &self,
        ctx: &TenantContext,
        asset_id: AssetId,
        page: PageRequest,
    ) -> Result<PageResponse<RentalSession>, AppError> {
        if self
            .catalog
            .find_asset(ctx.tenant_id, asset_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found(format!("Asset {asset_id} not found")));
        }
        let filter = SessionFilter {
            asset_id: Some(asset_id),
            ..SessionFilter::default()
        };
        self.ledger.list_sessions(ctx.tenant_id, &filter, page).await
    }

    /// Cost as of now. Closed sessions report their final figures.
    pub async fn running_cost(
        &self,
        ctx: &TenantContext,
        id: RentalSessionId,
        units: Option<i32>,
    ) -> Result<CostPreview, AppError> {
        let session = self.get(ctx, id).await?;
        let now = self.clock.now();

        let (elapsed, cost) = if session.is_active() {
            (
                elapsed_minutes(session.started_at, now).round_dp(2),
                compute_running_cost(
                    session.started_at,
                    session.price_snapshot,
                    session.billing_type,
                    now,
                    units,
                    session.min_duration,
                ),
            )
        } else {
            (
                Decimal::from(session.actual_duration.unwrap_or(0)),
                session.total_cost.unwrap_or(Decimal::ZERO),
            )
        };

        Ok(CostPreview {
            session_id: session.id,
            status: session.status,
            billing_type: session.billing_type,
            price_snapshot: session.price_snapshot,
            elapsed_minutes: elapsed,
            cost,
            as_of: now,
        })
    }

    /// Reads a session that must still be active.
    pub(super) async fn require_open(
        &self,
        ctx: &TenantContext,
        id: RentalSessionId,
    ) -> Result<RentalSession, AppError> {
        let session = self.get(ctx, id).await?;
        if session.status.is_terminal() {
            return Err(AppError::session_closed(format!(
                "Session {id} is already {}",
                session.status
            )));
        }
        Ok(session)
    }
}

