//! Pricing rule resolution.
//!
//! Resolution order:
//! 1. Active rules scoped to the asset, its category, or the tenant
//! 2. Whose day and time windows contain the instant (tenant local time)
//! 3. Highest priority, then most specific scope, then newest, then id
//! 4. Tenant default billing type and price

pub mod resolver;
pub mod window;

pub use resolver::{PricingResolver, RateSource, ResolvedRate};
