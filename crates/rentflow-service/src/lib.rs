//! # rentflow-service
//!
//! Business logic for RentFlow. Services orchestrate the stores from
//! `rentflow-database` and the pure billing engine from `rentflow-billing`.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references. Every call takes an explicit
//! [`TenantContext`].

pub mod catalog;
pub mod context;
pub mod reconcile;
pub mod rental;

pub use catalog::{
    AssetDetail, AssetService, CategoryService, PriceQuote, PricingService, PromotionService,
    TenantSettingsService,
};
pub use context::TenantContext;
pub use reconcile::{OccupancyReconciler, ReconcileReport};
pub use rental::{
    CostPreview, ExpirySummary, RentalSessionService, StartSessionRequest, StopSessionRequest,
    StoppedSession,
};
