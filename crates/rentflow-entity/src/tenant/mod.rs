//! Per-tenant billing defaults.

pub mod settings;

pub use settings::{TenantSettings, UpdateTenantSettings};
