//! Request and response payloads for the rental lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rentflow_billing::promotion::PromotionOutcome;
use rentflow_core::types::{AssetId, CustomFields, RentalSessionId};
use rentflow_entity::pricing::BillingType;
use rentflow_entity::rental::{PaymentType, RentalSession, SessionStatus};

/// Request to start a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionRequest {
    /// Asset to occupy.
    pub asset_id: AssetId,
    /// Planned length in minutes; omit for open-ended.
    pub planned_duration: Option<i32>,
    /// Manual price; the session bills as `fixed` with this amount.
    pub fixed_price: Option<Decimal>,
    /// Opaque client metadata.
    #[serde(default)]
    pub metadata: CustomFields,
}

/// Request to stop (complete) a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopSessionRequest {
    /// How the customer paid.
    pub payment_type: PaymentType,
    /// Discount code to redeem.
    pub promotion_code: Option<String>,
    /// Games played, for per-game billing. Defaults to one.
    pub units: Option<i32>,
}

/// A completed session and what happened to the promotion code, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoppedSession {
    /// The session after completion.
    pub session: RentalSession,
    /// Outcome of the supplied promotion code.
    pub promotion: Option<PromotionOutcome>,
}

/// Cost of a session as of an instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostPreview {
    /// The session.
    pub session_id: RentalSessionId,
    /// Its state.
    pub status: SessionStatus,
    /// Billing type captured at start.
    pub billing_type: BillingType,
    /// Rate captured at start.
    pub price_snapshot: Decimal,
    /// Minutes elapsed (fractional while active, billed minutes once closed).
    pub elapsed_minutes: Decimal,
    /// Cost at `as_of`; the final total once closed.
    pub cost: Decimal,
    /// Evaluation instant.
    pub as_of: DateTime<Utc>,
}

/// Result of one expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirySummary {
    /// Overdue sessions found.
    pub scanned: usize,
    /// Sessions moved to `expired`.
    pub expired: usize,
    /// Sessions closed by someone else first.
    pub skipped: usize,
    /// Sessions that failed with an unexpected error.
    pub failed: usize,
}
