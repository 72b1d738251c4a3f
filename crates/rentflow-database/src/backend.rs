//! Backend selection from configuration.

use std::sync::Arc;

use tracing::info;

use rentflow_core::config::{DatabaseBackend, DatabaseConfig};
use rentflow_core::result::AppResult;

use crate::connection::DatabasePool;
use crate::memory::MemoryStore;
use crate::migration::run_migrations;
use crate::postgres::PgStore;
use crate::store::{CatalogStore, RentalLedger};

/// The stores the service layer runs on.
#[derive(Debug, Clone)]
pub struct Persistence {
    /// Session state and lifecycle transitions.
    pub ledger: Arc<dyn RentalLedger>,
    /// Operator-managed catalog.
    pub catalog: Arc<dyn CatalogStore>,
    /// The PostgreSQL pool, when that backend is selected.
    pub database: Option<DatabasePool>,
}

impl Persistence {
    /// Connect the configured backend. Pending migrations run when enabled.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        match config.backend {
            DatabaseBackend::Memory => {
                info!("Using in-memory store; data is lost on restart");
                Ok(Self::memory())
            }
            DatabaseBackend::Postgres => {
                let db = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    run_migrations(db.pool()).await?;
                }
                Ok(Self::postgres(db))
            }
        }
    }

    /// A fresh in-memory backend.
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            ledger: store.clone(),
            catalog: store,
            database: None,
        }
    }

    /// A PostgreSQL backend over an existing pool.
    pub fn postgres(db: DatabasePool) -> Self {
        let store = Arc::new(PgStore::new(db.clone()));
        Self {
            ledger: store.clone(),
            catalog: store,
            database: Some(db),
        }
    }

    /// Close the pool, if any.
    pub async fn close(&self) {
        if let Some(db) = &self.database {
            db.close().await;
        }
    }
}
