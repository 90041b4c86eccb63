//! API layer - HTTP handlers and routing
//!
//! - `/`            health check (public)
//! - `/api/auth`    login, logout, token check (public)
//! - `/api/tasks`   task CRUD and board view (token required)
//! - `/api/export`  JSON and Markdown downloads (token required)

pub mod auth;
pub mod export;
pub mod middleware;
pub mod site;
pub mod tasks;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{extract_bearer_token, require_auth, ApiError, AppState, AuthenticatedSubject};

/// Routes under `/api`
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .nest("/tasks", tasks::router())
        .nest("/export", export::router())
        .route_layer(axum_middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .nest("/auth", auth::router())
        .merge(protected_routes)
}

/// Build the complete application router
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Ok(Router::new()
        .route("/", get(site::health))
        .nest("/api", build_api_router(state.clone()))
        .fallback(site::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}
