//! Custom Axum extractors.

pub mod json;
pub mod pagination;
pub mod tenant;

pub use json::{ApiJson, ValidatedJson};
pub use pagination::PaginationParams;
pub use tenant::Tenant;
