//! Payloads for closing transitions applied atomically by the store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rentflow_core::types::{PromotionId, RentalSessionId, TenantId};

use super::model::RentalSession;
use super::status::{PaymentType, SessionStatus};

/// Final figures for an active session.
///
/// The store applies the closure only if the session is still active. When
/// `promotion_id` is set the store claims one redemption in the same unit of
/// work; if the claim fails the discount is dropped and `total_cost`
/// falls back to `subtotal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClosure {
    /// Session to close.
    pub session_id: RentalSessionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Terminal state to enter.
    pub status: SessionStatus,
    /// Close instant.
    pub ended_at: DateTime<Utc>,
    /// Billed whole minutes.
    pub actual_duration: Option<i32>,
    /// Cost before discount.
    pub subtotal: Option<Decimal>,
    /// Discount granted by the promotion.
    pub discount_amount: Decimal,
    /// Amount charged.
    pub total_cost: Option<Decimal>,
    /// Promotion to redeem.
    pub promotion_id: Option<PromotionId>,
    /// Games played.
    pub units: Option<i32>,
    /// Payment method.
    pub payment_type: Option<PaymentType>,
}

impl SessionClosure {
    /// A paid stop.
    #[allow(clippy::too_many_arguments)]
    pub fn completed(
        session: &RentalSession,
        ended_at: DateTime<Utc>,
        actual_duration: i32,
        subtotal: Decimal,
        discount_amount: Decimal,
        promotion_id: Option<PromotionId>,
        units: Option<i32>,
        payment_type: PaymentType,
    ) -> Self {
        Self {
            session_id: session.id,
            tenant_id: session.tenant_id,
            status: SessionStatus::Completed,
            ended_at,
            actual_duration: Some(actual_duration),
            subtotal: Some(subtotal),
            discount_amount,
            total_cost: Some((subtotal - discount_amount).max(Decimal::ZERO)),
            promotion_id,
            units,
            payment_type: Some(payment_type),
        }
    }

    /// A void with no charge.
    pub fn cancelled(session: &RentalSession, ended_at: DateTime<Utc>) -> Self {
        Self {
            session_id: session.id,
            tenant_id: session.tenant_id,
            status: SessionStatus::Cancelled,
            ended_at,
            actual_duration: None,
            subtotal: None,
            discount_amount: Decimal::ZERO,
            total_cost: None,
            promotion_id: None,
            units: None,
            payment_type: None,
        }
    }

    /// A system close billed for the planned duration.
    pub fn expired(
        session: &RentalSession,
        ended_at: DateTime<Utc>,
        actual_duration: i32,
        subtotal: Decimal,
    ) -> Self {
        Self {
            session_id: session.id,
            tenant_id: session.tenant_id,
            status: SessionStatus::Expired,
            ended_at,
            actual_duration: Some(actual_duration),
            subtotal: Some(subtotal),
            discount_amount: Decimal::ZERO,
            total_cost: Some(subtotal),
            promotion_id: None,
            units: None,
            payment_type: None,
        }
    }

    /// Drop the promotion after a lost redemption race.
    pub fn without_promotion(mut self) -> Self {
        self.promotion_id = None;
        self.discount_amount = Decimal::ZERO;
        self.total_cost = self.subtotal;
        self
    }

    /// Apply the closure to an in-memory row.
    pub fn apply_to(&self, session: &mut RentalSession) {
        session.status = self.status;
        session.ended_at = Some(self.ended_at);
        session.actual_duration = self.actual_duration;
        session.subtotal = self.subtotal;
        session.discount_amount = self.discount_amount;
        session.total_cost = self.total_cost;
        session.promotion_id = self.promotion_id;
        session.units = self.units;
        session.payment_type = self.payment_type;
        session.updated_at = self.ended_at;
    }
}

/// Result of a successful close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedSession {
    /// The session after the transition.
    pub session: RentalSession,
    /// Whether a requested promotion redemption was recorded.
    pub promotion_claimed: bool,
}
