//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use rentflow_core::config::AppConfig;
use rentflow_core::error::AppError;
use rentflow_database::connection::mask_password;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut shown = config.clone();
            shown.database.url = mask_password(&shown.database.url);

            match format {
                OutputFormat::Json => output::print_json(&shown)?,
                OutputFormat::Table => {
                    println!("Server");
                    output::print_kv("bind", &shown.server.bind_address());
                    output::print_kv(
                        "request timeout",
                        &format!("{}s", shown.server.request_timeout_seconds),
                    );
                    output::print_kv(
                        "cors origins",
                        &shown.server.cors.allowed_origins.join(", "),
                    );
                    println!("Database");
                    output::print_kv("backend", &format!("{:?}", shown.database.backend));
                    output::print_kv("url", &shown.database.url);
                    output::print_kv(
                        "pool",
                        &format!(
                            "{}..{}",
                            shown.database.min_connections, shown.database.max_connections
                        ),
                    );
                    output::print_kv(
                        "run migrations",
                        &shown.database.run_migrations.to_string(),
                    );
                    println!("Logging");
                    output::print_kv("level", &shown.logging.level);
                    output::print_kv("format", &shown.logging.format);
                    println!("Worker");
                    output::print_kv("enabled", &shown.worker.enabled.to_string());
                    output::print_kv("expiry cron", &shown.worker.expiry_cron);
                    output::print_kv(
                        "expiry grace",
                        &format!("{} min", shown.worker.expiry_grace_minutes),
                    );
                    output::print_kv(
                        "reconcile cron",
                        &shown.worker.occupancy_reconcile_cron,
                    );
                }
            }
        }
    }

    Ok(())
}
