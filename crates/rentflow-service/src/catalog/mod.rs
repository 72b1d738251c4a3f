//! Operator-managed catalog services.

pub mod asset;
pub mod category;
pub mod pricing;
pub mod promotion;
pub mod tenant;

pub use asset::{AssetDetail, AssetService};
pub use category::CategoryService;
pub use pricing::{PriceQuote, PricingService};
pub use promotion::PromotionService;
pub use tenant::TenantSettingsService;
