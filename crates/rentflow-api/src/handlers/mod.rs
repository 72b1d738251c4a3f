//! Route handlers organized by domain.

pub mod asset;
pub mod category;
pub mod health;
pub mod pricing;
pub mod promotion;
pub mod session;
pub mod tenant;
