//! Authentication API endpoints
//!
//! - POST /api/auth/login  - Exchange the admin credentials for a signed token
//! - POST /api/auth/logout - Advisory; tokens are stateless
//! - GET  /api/auth/verify - Check a bearer token

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{extract_bearer_token, ApiError, AppState};
use crate::services::Verification;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub username: String,
    /// Epoch milliseconds
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/verify", get(verify))
}

/// POST /api/auth/login
///
/// A body that does not parse is treated like wrong credentials.
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Ok(Json(request)) = payload else {
        return Err(ApiError::invalid_credentials());
    };

    if !state.credentials.check(&request.username, &request.password) {
        tracing::info!("Failed login attempt for user '{}'", request.username);
        return Err(ApiError::invalid_credentials());
    }

    let issued = state.token_codec.issue(&request.username);
    tracing::info!("User '{}' logged in", request.username);

    Ok(Json(LoginResponse {
        success: true,
        token: issued.token,
        username: request.username,
        expires_at: issued.expires_at,
    }))
}

async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse { success: true })
}

/// GET /api/auth/verify
async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let verification = match extract_bearer_token(&headers) {
        Some(token) => state.token_codec.verify(token),
        None => Verification {
            valid: false,
            subject: None,
        },
    };

    let status = if verification.valid {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    (status, Json(verification)).into_response()
}
