//! # rentflow-database
//!
//! Persistence for RentFlow: the [`RentalLedger`] and [`CatalogStore`]
//! traits, their PostgreSQL implementation, and an in-memory
//! implementation for single-node runs and tests.

pub mod backend;
pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use backend::Persistence;
pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{CatalogStore, RentalLedger};
