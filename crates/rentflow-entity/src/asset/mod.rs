//! Rentable asset entity.

pub mod model;

pub use model::{Asset, CreateAsset, UpdateAsset};
