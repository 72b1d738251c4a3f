//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use rentflow_core::config::AppConfig;
use rentflow_core::traits::Clock;
use rentflow_database::Persistence;
use rentflow_service::{
    AssetService, CategoryService, PricingService, PromotionService, RentalSessionService,
    TenantSettingsService,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Process start, for uptime reporting
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// Selected storage backend
    pub persistence: Persistence,

    // ── Services ─────────────────────────────────────────────
    /// Rental session lifecycle
    pub sessions: Arc<RentalSessionService>,
    /// Asset catalog
    pub assets: Arc<AssetService>,
    /// Category catalog
    pub categories: Arc<CategoryService>,
    /// Pricing rules and quotes
    pub pricing: Arc<PricingService>,
    /// Promotions and code validation
    pub promotions: Arc<PromotionService>,
    /// Per-tenant settings
    pub tenant_settings: Arc<TenantSettingsService>,
}

impl AppState {
    /// Wire every service over the given stores and clock.
    pub fn new(config: AppConfig, persistence: Persistence, clock: Arc<dyn Clock>) -> Self {
        let ledger = Arc::clone(&persistence.ledger);
        let catalog = Arc::clone(&persistence.catalog);

        let sessions = RentalSessionService::new(
            Arc::clone(&ledger),
            Arc::clone(&catalog),
            Arc::clone(&clock),
        )
        .with_expiry_grace(config.worker.expiry_grace_minutes);

        Self {
            started_at: Instant::now(),
            sessions: Arc::new(sessions),
            assets: Arc::new(AssetService::new(
                Arc::clone(&catalog),
                Arc::clone(&ledger),
                Arc::clone(&clock),
            )),
            categories: Arc::new(CategoryService::new(Arc::clone(&catalog), Arc::clone(&clock))),
            pricing: Arc::new(PricingService::new(Arc::clone(&catalog), Arc::clone(&clock))),
            promotions: Arc::new(PromotionService::new(
                Arc::clone(&catalog),
                Arc::clone(&ledger),
                Arc::clone(&clock),
            )),
            tenant_settings: Arc::new(TenantSettingsService::new(catalog, clock)),
            config: Arc::new(config),
            persistence,
        }
    }
}
