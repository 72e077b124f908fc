//! SeatKey license server
//!
//! This binary serves the two SeatKey endpoints:
//! 1. Payment webhooks that create and update licenses
//! 2. Device activations that claim seats on those licenses
//!
//! Usage:
//!   STRIPE_WEBHOOK_SECRET=whsec_... seatkey-server --port 8787 --database seatkey.db

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use seatkey_billing::{DEFAULT_TOLERANCE_SECS, StripeVerifier};
use seatkey_db::SqliteLicenseStore;
use seatkey_server::{ACTIVATE_PATH, AppState, WEBHOOK_PATH, build_router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "seatkey-server")]
#[command(about = "SeatKey license webhook and seat activation server")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, env = "SEATKEY_PORT", default_value = "8787")]
    port: u16,

    /// Path to the SQLite license database
    #[arg(short, long, env = "SEATKEY_DATABASE", default_value = "seatkey.db")]
    database: PathBuf,

    /// Webhook endpoint signing secret (whsec_...)
    #[arg(long, env = "STRIPE_WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: String,

    /// Maximum accepted webhook signature age in seconds, 0 to disable
    #[arg(long, env = "SEATKEY_SIGNATURE_TOLERANCE_SECS", default_value_t = DEFAULT_TOLERANCE_SECS)]
    signature_tolerance_secs: u64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("SeatKey server starting...");

    let store = SqliteLicenseStore::open(&args.database).with_context(|| {
        format!("Failed to open license database {}", args.database.display())
    })?;
    info!("License database: {}", args.database.display());

    let verifier = StripeVerifier::new(args.webhook_secret)
        .with_tolerance_secs(args.signature_tolerance_secs);

    let app = build_router(AppState::new(Arc::new(store), Arc::new(verifier)));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("Failed to bind HTTP port {}", args.port))?;
    info!("HTTP API listening on port {}", args.port);
    info!("  POST {WEBHOOK_PATH}");
    info!("  POST {ACTIVATE_PATH}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("SeatKey server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
