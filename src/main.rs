use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use clinic_core::Clinic;
use clinic_core::config::{config_from_lookup, env_keys};
use clinic_core::constants::DEFAULT_REST_ADDR;

/// Main entry point for the clinic service
///
/// Loads configuration and the data snapshot, reports medicines that are running low, then
/// serves the REST API until interrupted.
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Directory holding the data snapshot (default: "clinic_data")
/// - `CLINIC_STAFF_PIN_SHA256`: SHA-256 hex digest of the staff PIN (required)
/// - `CLINIC_SESSION_TTL_MINUTES`, `CLINIC_LOW_STOCK_THRESHOLD`, `CLINIC_DEFAULT_EXAMINER`,
///   `CLINIC_DIAGNOSIS_CODES_FILE`, `CLINIC_NAME`: optional overrides
///
/// # Returns
/// * `Ok(())` - If the server shuts down cleanly
/// * `Err(anyhow::Error)` - If startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_run=info".parse()?)
                .add_directive("clinic_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var(env_keys::REST_ADDR).unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let cfg = Arc::new(config_from_lookup(|key| std::env::var(key).ok())?);
    let clinic = Clinic::open(cfg)?;

    for medicine in clinic.stock().low_stock_alerts()? {
        tracing::warn!(
            name = %medicine.name,
            stock = medicine.stock_qty,
            "medicine is running low"
        );
    }

    tracing::info!("++ Starting clinic REST on {}", rest_addr);

    let app = router(AppState { clinic });
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("-- Shutting down clinic REST");
        })
        .await?;

    Ok(())
}
