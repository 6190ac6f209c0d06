//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the clinic REST API (with OpenAPI/Swagger UI) on its own. The workspace's `clinic-run`
//! binary serves the same router and additionally reports low stock at startup.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use clinic_core::config::{config_from_lookup, env_keys};
use clinic_core::constants::DEFAULT_REST_ADDR;
use clinic_core::Clinic;

/// Main entry point for the clinic REST API server
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CLINIC_STAFF_PIN_SHA256`: SHA-256 hex digest of the staff PIN (required)
/// - `CLINIC_DATA_DIR` and the other `CLINIC_*` settings read by `config_from_lookup`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the data snapshot cannot be loaded,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var(env_keys::REST_ADDR).unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let cfg = Arc::new(config_from_lookup(|key| std::env::var(key).ok())?);
    let clinic = Clinic::open(cfg)?;

    tracing::info!("-- Starting clinic REST API on {}", addr);

    let app = router(AppState { clinic });
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
