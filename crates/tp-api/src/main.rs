//! TaskPilot API server.
//!
//! Serves the task REST endpoints and the natural-language chat surface
//! backed by whichever AI provider the environment configures.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use tp_ai::ProviderManager;
use tp_api::config::ApiConfig;
use tp_api::routes;
use tp_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tp-api starting");

    let config = ApiConfig::from_env();
    let ai = ProviderManager::from_config(&config.ai)?;
    let state = AppState::new(Arc::new(ai));

    let app = routes::build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
