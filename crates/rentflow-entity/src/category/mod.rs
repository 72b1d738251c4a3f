//! Asset category entity.

pub mod model;

pub use model::{Category, CreateCategory, UpdateCategory};
