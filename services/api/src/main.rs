use anyhow::Result;
use tracing::{info, warn};

mod alerts;
mod error;
#[cfg(test)]
mod integration;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
#[cfg(test)]
mod testing;
mod validation;

use common::{
    database::{self, DatabaseConfig, init_pool},
    settings::{AlertSettings, ServerConfig},
    telemetry,
    token::{TokenVerifier, pem_from_env},
};
use tokio::net::TcpListener;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Access tokens are issued by the auth service; only the public key is needed here
    let public_key = pem_from_env("JWT_PUBLIC_KEY", env!("CARGO_MANIFEST_DIR"))?;
    let verifier = TokenVerifier::from_public_pem(&public_key)?;

    let alert_settings = AlertSettings::from_env()?;
    info!(
        "Upcoming deadline window: {} day(s)",
        alert_settings.echeance_days
    );

    let app_state = AppState::new(pool, verifier, alert_settings.into());

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let server = ServerConfig::from_env(3001)?;
    let listener = TcpListener::bind(server.addr()).await?;
    info!("API service listening on {}", server.addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
