//! Taskboard API server

use anyhow::{Context, Result};
use std::path::Path;

use taskboard::{
    api::{self, AppState},
    config::Config,
    db,
    services::{AdminCredentials, TokenCodec},
};

#[tokio::main]
async fn main() -> Result<()> {
    taskboard::init_tracing("taskboard=info,tower_http=debug");

    tracing::info!("Starting Taskboard API...");

    let config = Config::load_with_env(Path::new("config.yml"))?;
    config.validate()?;
    tracing::info!("Configuration loaded");

    let auth = config.auth.settings()?;
    let token_codec = TokenCodec::new(auth.secret).context("Invalid auth secret")?;
    let credentials = AdminCredentials::new(auth.username, auth.password)?;
    tracing::info!("Admin account '{}' configured", credentials.username());

    let pool = db::create_pool(&config.database).await?;
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let state = AppState::new(pool.clone(), token_codec, credentials);
    let app = api::build_router(state, &config.server.cors_origin)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
