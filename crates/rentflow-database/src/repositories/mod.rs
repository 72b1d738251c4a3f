//! PostgreSQL repository implementations.
//!
//! Each repository wraps a [`PgPool`](sqlx::PgPool) and maps sqlx errors
//! into [`AppError`](rentflow_core::error::AppError) with a
//! [`Database`](rentflow_core::error::ErrorKind::Database) kind, except for
//! constraint violations that have a domain meaning.

pub mod asset;
pub mod category;
pub mod occupancy;
pub mod pricing;
pub mod promotion;
pub mod rental;
pub mod tenant;

pub use asset::AssetRepository;
pub use category::CategoryRepository;
pub use occupancy::PgOccupancyGuard;
pub use pricing::PricingRuleRepository;
pub use promotion::PromotionRepository;
pub use rental::RentalSessionRepository;
pub use tenant::TenantSettingsRepository;

/// Whether the error is a unique constraint violation (SQLSTATE 23505).
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Whether the error is a foreign key violation (SQLSTATE 23503).
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Whether the error is a check constraint violation (SQLSTATE 23514).
pub(crate) fn is_check_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_check_violation())
}
