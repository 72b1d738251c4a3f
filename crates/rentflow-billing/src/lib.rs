//! # rentflow-billing
//!
//! The rental billing engine. Everything here except the occupancy guard is
//! pure: no I/O, no clock reads. Callers pass the instant they care about.
//!
//! ## Modules
//!
//! - `pricing`: rate resolution by priority, scope, and time window
//! - `promotion`: discount code eligibility and discount amounts
//! - `accrual`: running and final cost computation
//! - `occupancy`: at-most-one-active-session-per-asset guard

pub mod accrual;
pub mod occupancy;
pub mod pricing;
pub mod promotion;

pub use accrual::{compute_final_cost, compute_running_cost, round_currency};
pub use occupancy::{MemoryOccupancyGuard, OccupancyGuard, OccupancyRecord};
pub use pricing::{PricingResolver, RateSource, ResolvedRate};
pub use promotion::{PromotionContext, PromotionOutcome, PromotionRejection, PromotionValidator};
