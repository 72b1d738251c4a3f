//! Promotion eligibility and discount computation.

pub mod validator;

pub use validator::{PromotionContext, PromotionOutcome, PromotionRejection, PromotionValidator};
