//! Promotion (discount code) entity.

pub mod model;

pub use model::{CreatePromotion, DiscountType, Promotion, UpdatePromotion};
