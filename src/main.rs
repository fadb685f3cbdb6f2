use dotenvy::dotenv;
use log::{error, info, warn};
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use projectserver::core::config::AppConfig;
use projectserver::core::shared::state::AppState;
use projectserver::core::shared::utils::{create_conn, redact_url, run_migrations};
use projectserver::core::storage::Store;
use projectserver::main_module::run_axum_server;
use projectserver::security::PasswordHasher2;

fn open_store(config: &AppConfig) -> anyhow::Result<Store> {
    let Some(url) = config.database.url.as_deref() else {
        warn!("No database URL configured; using the in-memory store (data is lost on exit)");
        return Ok(Store::memory());
    };

    info!("Connecting to database at {}", redact_url(url));
    let pool = create_conn(url, config.database.max_connections)?;
    if config.database.run_migrations {
        run_migrations(&pool)?;
    }
    Ok(Store::Postgres(pool))
}

fn build_state() -> anyhow::Result<AppState> {
    let config = AppConfig::load()?;
    let store = open_store(&config)?;
    let jwt = AppState::jwt_from_config(&config)?;
    let hasher = PasswordHasher2::with_defaults()?;
    Ok(AppState::new(store, config, jwt, hasher))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting projectserver {}", env!("CARGO_PKG_VERSION"));

    let state = match build_state() {
        Ok(state) => state,
        Err(e) => {
            error!("Startup failed: {e:#}");
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    run_axum_server(Arc::new(state)).await
}
