//! Asset occupancy: at most one active session per asset.
//!
//! Two implementations exist:
//! - PostgreSQL, an `asset_occupancy` row written inside the start transaction
//!   (in `rentflow-database`)
//! - In-memory, a `DashMap` vacant-entry insert (single-process deployments
//!   and tests)

pub mod guard;
pub mod memory;

pub use guard::{OccupancyGuard, OccupancyRecord};
pub use memory::MemoryOccupancyGuard;
