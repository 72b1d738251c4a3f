//! # rentflow-core
//!
//! Core crate for RentFlow. Contains configuration schemas, typed
//! identifiers, pagination types, the opaque custom-fields map, the
//! clock abstraction, and the unified error system.
//!
//! This crate has **no** internal dependencies on other RentFlow crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
