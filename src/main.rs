//! RentFlow Server: rental session lifecycle and billing.
//!
//! Loads configuration, installs logging and hands off to the API server.

use rentflow_core::config::AppConfig;

#[tokio::main]
async fn main() {
    let env = AppConfig::environment();
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    rentflow_api::init_logging(&config.logging);
    tracing::info!(environment = %env, "Configuration loaded");

    if let Err(e) = rentflow_api::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
