//! Rental session administration commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use rentflow_core::config::AppConfig;
use rentflow_core::error::AppError;
use rentflow_core::types::{AssetId, PageRequest, RentalSessionId, TenantId};
use rentflow_entity::rental::{RentalSession, SessionFilter, SessionStatus};
use rentflow_service::TenantContext;

/// Arguments for session commands
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Session subcommand
    #[command(subcommand)]
    pub command: SessionCommand,
}

/// Session subcommands
#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// List a tenant's sessions
    List {
        /// Tenant ID
        #[arg(long)]
        tenant: TenantId,
        /// Only sessions in this state
        #[arg(long)]
        status: Option<SessionStatus>,
        /// Only sessions on this asset
        #[arg(long)]
        asset: Option<AssetId>,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Page size
        #[arg(long, default_value_t = 25)]
        per_page: u64,
    },
    /// Show one session
    Show {
        /// Tenant ID
        #[arg(long)]
        tenant: TenantId,
        /// Session ID
        id: RentalSessionId,
    },
    /// Cancel an active session without charge
    Cancel {
        /// Tenant ID
        #[arg(long)]
        tenant: TenantId,
        /// Session ID
        id: RentalSessionId,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Expire every overdue planned session now
    ExpireOverdue,
}

/// Session display row
#[derive(Debug, Serialize, Tabled)]
struct SessionRow {
    /// Session ID
    id: String,
    /// Asset ID
    asset: String,
    /// Status
    status: String,
    /// Billing
    billing: String,
    /// Started
    started: String,
    /// Ended
    ended: String,
    /// Total
    total: String,
}

impl From<&RentalSession> for SessionRow {
    fn from(s: &RentalSession) -> Self {
        Self {
            id: short_id(&s.id.to_string()),
            asset: short_id(&s.asset_id.to_string()),
            status: s.status.to_string(),
            billing: format!("{} @ {}", s.billing_type, s.price_snapshot),
            started: s.started_at.format("%Y-%m-%d %H:%M").to_string(),
            ended: s
                .ended_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            total: s
                .total_cost
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Execute session commands
pub async fn execute(
    args: &SessionArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let persistence = super::open_persistence(config).await?;
    let sessions = super::session_service(config, &persistence);

    match &args.command {
        SessionCommand::List {
            tenant,
            status,
            asset,
            page,
            per_page,
        } => {
            let ctx = TenantContext::new(*tenant);
            let filter = SessionFilter {
                asset_id: *asset,
                status: *status,
                ..SessionFilter::default()
            };
            let page = sessions
                .list(&ctx, &filter, PageRequest::new(*page, *per_page))
                .await?;

            let rows: Vec<SessionRow> = page.items.iter().map(SessionRow::from).collect();
            output::print_list(&rows, &page, format)?;
            if format == OutputFormat::Table {
                println!(
                    "Page {}/{} ({} sessions)",
                    page.page, page.total_pages, page.total_items
                );
            }
        }
        SessionCommand::Show { tenant, id } => {
            let session = sessions.get(&TenantContext::new(*tenant), *id).await?;
            match format {
                OutputFormat::Json => output::print_json(&session)?,
                OutputFormat::Table => print_session(&session),
            }
        }
        SessionCommand::Cancel { tenant, id, force } => {
            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Cancel session {} without charge?", id))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

                if !confirm {
                    println!("Cancelled.");
                    persistence.close().await;
                    return Ok(());
                }
            }

            let session = sessions.cancel(&TenantContext::new(*tenant), *id).await?;
            output::print_success(&format!(
                "Session {} cancelled; asset {} released",
                session.id, session.asset_id
            ));
        }
        SessionCommand::ExpireOverdue => {
            let summary = sessions.expire_overdue().await?;
            match format {
                OutputFormat::Json => output::print_json(&summary)?,
                OutputFormat::Table => {
                    output::print_kv("scanned", &summary.scanned.to_string());
                    output::print_kv("expired", &summary.expired.to_string());
                    output::print_kv("skipped", &summary.skipped.to_string());
                    output::print_kv("failed", &summary.failed.to_string());
                }
            }
        }
    }

    persistence.close().await;
    Ok(())
}

fn print_session(s: &RentalSession) {
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());

    output::print_kv("id", &s.id.to_string());
    output::print_kv("asset", &s.asset_id.to_string());
    output::print_kv("status", s.status.as_str());
    output::print_kv("started", &s.started_at.to_rfc3339());
    output::print_kv("ended", &or_dash(s.ended_at.map(|t| t.to_rfc3339())));
    output::print_kv(
        "planned",
        &or_dash(s.planned_duration.map(|m| format!("{m} min"))),
    );
    output::print_kv(
        "actual",
        &or_dash(s.actual_duration.map(|m| format!("{m} min"))),
    );
    output::print_kv("billing type", s.billing_type.as_str());
    output::print_kv("price", &s.price_snapshot.to_string());
    output::print_kv("subtotal", &or_dash(s.subtotal.map(|d| d.to_string())));
    output::print_kv("discount", &s.discount_amount.to_string());
    output::print_kv("total", &or_dash(s.total_cost.map(|d| d.to_string())));
    output::print_kv(
        "payment",
        &or_dash(s.payment_type.map(|p| p.as_str().to_string())),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::commands::{Cli, Commands};

    #[test]
    fn test_parses_session_list_filters() {
        let tenant = TenantId::new();
        let cli = Cli::try_parse_from([
            "rentflow",
            "--format",
            "json",
            "session",
            "list",
            "--tenant",
            &tenant.to_string(),
            "--status",
            "active",
        ])
        .unwrap();

        let Commands::Session(args) = cli.command else {
            panic!("expected session command");
        };
        match args.command {
            SessionCommand::List {
                tenant: parsed,
                status,
                asset,
                page,
                ..
            } => {
                assert_eq!(parsed, tenant);
                assert_eq!(status, Some(SessionStatus::Active));
                assert!(asset.is_none());
                assert_eq!(page, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_rejects_malformed_session_id() {
        let result = Cli::try_parse_from([
            "rentflow",
            "session",
            "show",
            "--tenant",
            &TenantId::new().to_string(),
            "not-a-uuid",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
