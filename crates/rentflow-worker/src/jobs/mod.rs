//! Built-in job handler implementations.

pub mod expiry;
pub mod occupancy;

pub use expiry::{SESSION_EXPIRY, SessionExpiryHandler};
pub use occupancy::{OCCUPANCY_RECONCILIATION, OccupancyReconcileHandler};
