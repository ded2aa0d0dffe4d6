use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use co2_api::config::Config;
use co2_api::predictor::ModelHandle;
use co2_api::store::{create_pool, Store};
use co2_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("co2_api=info,warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("failed to connect to {}", config.database_url))?;
    let store = Store::new(pool);
    store
        .init_schema()
        .await
        .context("failed to create database schema")?;

    let model = ModelHandle::new(&config.model_path);
    // Warm the model up front; the service still starts without it.
    if let Err(e) = model.load().await {
        warn!(path = %model.path().display(), error = %e, "model not loaded at startup");
    }

    let state = AppState { store, model };
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
