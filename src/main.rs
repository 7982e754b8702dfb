//! Main entry point for the partogram labor-timer service.
//!
//! Serves the REST API over a file-backed patient store. All timer state is
//! derived on query; nothing timer-shaped is ever persisted.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use partogram_core::{
    backdate_policy_from_env_value, CoreConfig, FileStore, LaborService, LaborStore, SystemClock,
    TimerQueryService, DEFAULT_DATA_DIR,
};

/// Starts the partogram REST server.
///
/// # Environment Variables
/// - `PARTOGRAM_ADDR`: server address (default: "0.0.0.0:3000")
/// - `PARTOGRAM_DATA_DIR`: directory for patient records (default: "/partogram_data")
/// - `PARTOGRAM_STRICT_TIME_ORDER`: reject backdated measurements when set to `reject`/`true`
///
/// # Returns
/// * `Ok(())` - if the server starts and runs successfully
/// * `Err(anyhow::Error)` - if startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("partogram=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("PARTOGRAM_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir =
        std::env::var("PARTOGRAM_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let backdate_policy =
        backdate_policy_from_env_value(std::env::var("PARTOGRAM_STRICT_TIME_ORDER").ok())?;

    tracing::info!("++ Starting partogram REST on {}", addr);
    tracing::info!("++ Patient records under {}", data_dir);

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
