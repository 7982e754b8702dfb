//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging when only the REST surface (with
//! OpenAPI/Swagger UI) is wanted. The workspace's main `partogram-run`
//! binary is the production entry point.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use partogram_core::{
    backdate_policy_from_env_value, CoreConfig, FileStore, LaborService, LaborStore, SystemClock,
    TimerQueryService, DEFAULT_DATA_DIR,
};

/// Main entry point for the partogram REST API server.
///
/// # Environment Variables
/// - `PARTOGRAM_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `PARTOGRAM_DATA_DIR`: Directory for patient records (default: "/partogram_data")
/// - `PARTOGRAM_STRICT_TIME_ORDER`: Reject backdated measurements when set to `reject`/`true`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the data directory cannot be opened, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("PARTOGRAM_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting partogram REST API on {}", addr);

    let data_dir =
        std::env::var("PARTOGRAM_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let backdate_policy =
        backdate_policy_from_env_value(std::env::var("PARTOGRAM_STRICT_TIME_ORDER").ok())?;

    let cfg = Arc::new(CoreConfig::new(data_dir.clone().into(), backdate_policy)?);
    let store: Arc<dyn LaborStore> = Arc::new(FileStore::open(data_dir)?);
    let clock = Arc::new(SystemClock);

    let state = AppState {
        labor: LaborService::new(store.clone(), clock.clone(), cfg),
        query: TimerQueryService::new(store, clock.clone()),
        clock,
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
