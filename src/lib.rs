//! Taskboard - a small Kanban task board API
//!
//! Tasks live in SQLite or MySQL and are served over a JSON API guarded by
//! HMAC-signed bearer tokens.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

/// Initialise `tracing` with an env-filter, defaulting to `default_filter`
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
