//! CLI command definitions and dispatch.

pub mod config;
pub mod migrate;
pub mod serve;
pub mod session;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::{self, OutputFormat};
use rentflow_core::config::{AppConfig, DatabaseBackend};
use rentflow_core::error::AppError;
use rentflow_core::traits::SystemClock;
use rentflow_database::Persistence;
use rentflow_service::RentalSessionService;

/// RentFlow: rental session lifecycle and billing
#[derive(Debug, Parser)]
#[command(name = "rentflow", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.toml` and environment overlays
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Environment overlay to load (defaults to `RENTFLOW_ENV`)
    #[arg(short, long)]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the RentFlow server
    Serve(serve::ServeArgs),
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Rental session administration
    Session(session::SessionArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = self.load_config()?;
        match &self.command {
            Commands::Serve(args) => serve::execute(args, config).await,
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Session(args) => session::execute(args, &config, self.format).await,
            Commands::Config(args) => config::execute(args, &config, self.format),
        }
    }

    fn load_config(&self) -> Result<AppConfig, AppError> {
        let env = self.env.clone().unwrap_or_else(AppConfig::environment);
        AppConfig::load_from(&self.config, &env)
    }
}

/// Helper: open the configured backend for an administrative command
pub async fn open_persistence(config: &AppConfig) -> Result<Persistence, AppError> {
    if config.database.backend == DatabaseBackend::Memory {
        output::print_warning(
            "database.backend is \"memory\"; this process cannot see the server's sessions",
        );
    }
    Persistence::connect(&config.database).await
}

/// Helper: lifecycle service over the configured backend
pub fn session_service(config: &AppConfig, persistence: &Persistence) -> RentalSessionService {
    RentalSessionService::new(
        Arc::clone(&persistence.ledger),
        Arc::clone(&persistence.catalog),
        Arc::new(SystemClock),
    )
    .with_expiry_grace(config.worker.expiry_grace_minutes)
}
