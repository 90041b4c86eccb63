//! Export API endpoints (behind the token gate)
//!
//! - GET /api/export/json     - Every task as a JSON attachment
//! - GET /api/export/markdown - Every task as a Markdown attachment

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use crate::api::middleware::{ApiError, AppState};
use crate::models::TaskFilter;
use crate::services::{export_filename, json_export, render_markdown};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/json", get(export_json))
        .route("/markdown", get(export_markdown))
}

fn attachment(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", filename)
}

async fn export_json(State(state): State<AppState>) -> Result<Response, ApiError> {
    let tasks = state
        .task_service
        .list(&TaskFilter::default())
        .await
        .map_err(|e| ApiError::from_task_error("Failed to export tasks", e))?;

    let now = Utc::now();
    let disposition = attachment(&export_filename(now, "json"));

    Ok((
        [(header::CONTENT_DISPOSITION, disposition)],
        Json(json_export(tasks, now)),
    )
        .into_response())
}

async fn export_markdown(State(state): State<AppState>) -> Result<Response, ApiError> {
    let tasks = state
        .task_service
        .list(&TaskFilter::default())
        .await
        .map_err(|e| ApiError::from_task_error("Failed to export tasks", e))?;

    let now = Utc::now();
    let disposition = attachment(&export_filename(now, "md"));

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        render_markdown(tasks, now),
    )
        .into_response())
}
