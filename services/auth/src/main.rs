use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

mod error;
mod jwt;
mod middleware;
mod models;
mod password;
mod rate_limiter;
mod repositories;
mod routes;
mod session;
mod store;
#[cfg(test)]
mod testing;
mod validation;

use common::{cache, database, settings::ServerConfig, telemetry};
use tokio::net::TcpListener;

use crate::{
    jwt::JwtService,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::UserRepository,
    session::RedisSessionStore,
    store::{SessionStore, UserStore},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub jwt_service: JwtService,
    pub rate_limiter: RateLimiter,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Initialize JWT service
    let jwt_config = jwt::JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;

    // Initialize Redis connection pool
    let redis_config = cache::RedisConfig::from_env()?;
    let redis_pool = cache::RedisPool::new(&redis_config)?;
    let sessions = RedisSessionStore::new(redis_pool);
    match sessions.health_check().await {
        Ok(true) => info!("Redis connection successful"),
        Ok(false) => warn!("Redis answered PING unexpectedly"),
        Err(e) => warn!("Redis is not reachable yet: {}", e),
    }

    let app_state = AppState {
        users: Arc::new(UserRepository::new(pool)),
        sessions: Arc::new(sessions),
        jwt_service,
        rate_limiter: RateLimiter::new(RateLimiterConfig::from_env()?),
    };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let server = ServerConfig::from_env(3000)?;
    let listener = TcpListener::bind(server.addr()).await?;
    info!("Authentication service listening on {}", server.addr());

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
