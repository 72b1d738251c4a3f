//! Pricing rule entity and billing type enumeration.

pub mod billing_type;
pub mod rule;

pub use billing_type::BillingType;
pub use rule::{CreatePricingRule, PricingRule, RuleScope, UpdatePricingRule};
