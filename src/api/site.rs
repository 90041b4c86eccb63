//! Service-level endpoints: health check and the JSON 404 fallback

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// GET / - Health check
///
/// Reports `degraded` with 503 when the database does not answer.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status) = match state.pool.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!("Health check failed: {:#}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            message: "Taskboard API",
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }),
    )
}

/// Fallback for any route that does not exist
pub async fn not_found() -> ApiError {
    ApiError::route_not_found()
}
