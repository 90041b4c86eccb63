//! API middleware
//!
//! Shared application state, the JSON error type returned by every handler,
//! and the bearer-token gate in front of the task and export routes.

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::db::{repositories::SqlxTaskRepository, DynDatabasePool};
use crate::services::{AdminCredentials, FieldError, TaskService, TaskServiceError, TokenCodec};

const UNAUTHORIZED_MESSAGE: &str = "Invalid or expired token. Please log in again.";

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub task_service: Arc<TaskService>,
    pub token_codec: Arc<TokenCodec>,
    pub credentials: Arc<AdminCredentials>,
}

impl AppState {
    pub fn new(pool: DynDatabasePool, token_codec: TokenCodec, credentials: AdminCredentials) -> Self {
        let task_service = TaskService::new(SqlxTaskRepository::boxed(pool.clone()));
        Self {
            pool,
            task_service: Arc::new(task_service),
            token_codec: Arc::new(token_codec),
            credentials: Arc::new(credentials),
        }
    }
}

/// Username of the caller, attached by [`require_auth`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject(pub String);

impl<S> FromRequestParts<S> for AuthenticatedSubject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedSubject>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)
    }
}

/// JSON error body.
///
/// The shape varies by endpoint family, so optional members are omitted when
/// unset. `code` only selects the HTTP status and is never serialized.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ApiError {
    fn new(code: &'static str, error: impl Into<String>) -> Self {
        Self {
            code,
            success: None,
            error: error.into(),
            message: None,
            details: None,
        }
    }

    /// Rejection from the token gate
    pub fn unauthorized() -> Self {
        Self {
            message: Some(UNAUTHORIZED_MESSAGE.to_string()),
            ..Self::new("UNAUTHORIZED", "Unauthorized")
        }
    }

    pub fn invalid_credentials() -> Self {
        Self {
            success: Some(false),
            ..Self::new("UNAUTHORIZED", "Invalid username or password")
        }
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            ..Self::new("NOT_FOUND", error)
        }
    }

    /// Fallback for unknown routes
    pub fn route_not_found() -> Self {
        Self {
            message: Some("The requested resource was not found".to_string()),
            ..Self::new("NOT_FOUND", "Not Found")
        }
    }

    pub fn validation(details: Vec<FieldError>) -> Self {
        Self {
            success: Some(false),
            details: Some(details),
            ..Self::new("VALIDATION_ERROR", "Validation error")
        }
    }

    /// A request body that could not be parsed as JSON of the expected shape
    pub fn bad_body(rejection: JsonRejection) -> Self {
        Self::validation(vec![FieldError::new("body", rejection.body_text())])
    }

    pub fn internal_error(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            message: Some(message.into()),
            ..Self::new("INTERNAL_ERROR", error)
        }
    }

    /// Map a task service failure, naming the operation for 500 responses
    /// (e.g. "Failed to update task").
    pub fn from_task_error(failure: &str, err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::NotFound(_) => Self::not_found("Task not found"),
            TaskServiceError::Validation(details) => Self::validation(details),
            TaskServiceError::Internal(e) => {
                tracing::error!("{}: {:#}", failure, e);
                Self::internal_error(failure, e.to_string())
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Token from an `Authorization: Bearer <token>` header.
///
/// Any other scheme, a missing header, or an empty token yields `None`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware: verifies the bearer token and attaches the
/// subject to the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).ok_or_else(ApiError::unauthorized)?;

    let subject = state
        .token_codec
        .verify(token)
        .subject
        .ok_or_else(ApiError::unauthorized)?;

    request.extensions_mut().insert(AuthenticatedSubject(subject));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        let headers = headers_with_auth("Bearer abc.def");
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn test_extract_bearer_token_missing_header() {
        assert!(extract_bearer_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_extract_bearer_token_other_scheme() {
        assert!(extract_bearer_token(&headers_with_auth("Basic YWRtaW46YWRtaW4=")).is_none());
        assert!(extract_bearer_token(&headers_with_auth("bearer abc.def")).is_none());
        assert!(extract_bearer_token(&headers_with_auth("abc.def")).is_none());
    }

    #[test]
    fn test_extract_bearer_token_empty() {
        assert!(extract_bearer_token(&headers_with_auth("Bearer ")).is_none());
        assert!(extract_bearer_token(&headers_with_auth("Bearer    ")).is_none());
    }

    #[test]
    fn test_unauthorized_body() {
        let error = ApiError::unauthorized();
        assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({
                "error": "Unauthorized",
                "message": "Invalid or expired token. Please log in again."
            })
        );
    }

    #[test]
    fn test_invalid_credentials_body() {
        let error = ApiError::invalid_credentials();
        assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({"success": false, "error": "Invalid username or password"})
        );
    }

    #[test]
    fn test_validation_body() {
        let error = ApiError::validation(vec![FieldError::new("title", "Title is required")]);
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({
                "success": false,
                "error": "Validation error",
                "details": [{"field": "title", "message": "Title is required"}]
            })
        );
    }

    #[test]
    fn test_from_task_error() {
        let error = ApiError::from_task_error(
            "Failed to fetch task",
            TaskServiceError::NotFound("x".to_string()),
        );
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.error, "Task not found");

        let error = ApiError::from_task_error(
            "Failed to delete task",
            TaskServiceError::Internal(anyhow::anyhow!("disk full")),
        );
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.error, "Failed to delete task");
        assert_eq!(error.message.as_deref(), Some("disk full"));
    }

    #[test]
    fn test_route_not_found_body() {
        let error = ApiError::route_not_found();
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({
                "error": "Not Found",
                "message": "The requested resource was not found"
            })
        );
    }
}

#[cfg(test)]
mod gate_tests {
    use super::*;
    use crate::db::create_test_pool;
    use axum::{middleware as axum_middleware, routing::get, Router};
    use axum_test::TestServer;

    async fn whoami(subject: AuthenticatedSubject) -> String {
        format!("hello {}", subject.0)
    }

    async fn test_server() -> (TestServer, Arc<TokenCodec>) {
        let pool = create_test_pool().await.unwrap();
        let state = AppState::new(
            pool,
            TokenCodec::new("gate-test-secret").unwrap(),
            AdminCredentials::new("admin", "admin123").unwrap(),
        );
        let codec = state.token_codec.clone();
        let app = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth))
            .with_state(state);
        (TestServer::new(app).unwrap(), codec)
    }

    #[tokio::test]
    async fn test_gate_rejects_missing_header() {
        let (server, _) = test_server().await;
        let response = server.get("/whoami").await;
        response.assert_status_unauthorized();
        response.assert_json(&serde_json::json!({
            "error": "Unauthorized",
            "message": "Invalid or expired token. Please log in again."
        }));
    }

    #[tokio::test]
    async fn test_gate_rejects_foreign_token() {
        let (server, _) = test_server().await;
        let foreign = TokenCodec::new("another-secret").unwrap().issue("admin");
        let response = server
            .get("/whoami")
            .authorization_bearer(foreign.token)
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_gate_attaches_subject() {
        let (server, codec) = test_server().await;
        let issued = codec.issue("admin");
        let response = server
            .get("/whoami")
            .authorization_bearer(issued.token)
            .await;
        response.assert_status_ok();
        response.assert_text("hello admin");
    }

    #[tokio::test]
    async fn test_subject_extractor_without_gate() {
        let app = Router::new().route("/whoami", get(whoami));
        let server = TestServer::new(app).unwrap();
        server.get("/whoami").await.assert_status_unauthorized();
    }
}
