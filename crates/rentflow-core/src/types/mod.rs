//! Core type definitions used across the RentFlow workspace.

pub mod custom_fields;
pub mod id;
pub mod pagination;
pub mod response;

pub use custom_fields::CustomFields;
pub use id::*;
pub use pagination::{PageRequest, PageResponse};
pub use response::{ApiErrorResponse, ApiResponse};
