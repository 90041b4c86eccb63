//! Task API endpoints
//!
//! All routes are mounted under `/api/tasks` behind the token gate:
//! - GET    /api/tasks                    - List tasks (filterable)
//! - GET    /api/tasks/board              - Active tasks grouped by column
//! - GET    /api/tasks/{id}               - Get a task
//! - POST   /api/tasks                    - Create a task
//! - PUT    /api/tasks/{id}               - Partially update a task
//! - PATCH  /api/tasks/{id}/move          - Move a task to another column
//! - DELETE /api/tasks/{id}               - Delete a task
//! - POST   /api/tasks/archive-completed  - Archive everything in Done

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{
    BoardColumn, CreateTaskInput, MoveTaskInput, Task, TaskFilterParams, UpdateTaskInput,
};
use crate::services::parse_filter;

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub success: bool,
    pub data: Vec<Task>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub success: bool,
    pub data: Vec<BoardColumn>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub success: bool,
    pub data: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskResponse {
    fn new(data: Task, message: Option<String>) -> Self {
        Self {
            success: true,
            data,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    pub success: bool,
    pub count: u64,
    pub message: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/board", get(get_board))
        .route("/archive-completed", post(archive_completed))
        .route("/{id}", get(get_task).put(update_task).delete(delete_task))
        .route("/{id}/move", patch(move_task))
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskFilterParams>,
) -> Result<Json<TaskListResponse>, ApiError> {
    let filter = parse_filter(params).map_err(|e| ApiError::from_task_error("Failed to fetch tasks", e))?;
    let tasks = state
        .task_service
        .list(&filter)
        .await
        .map_err(|e| ApiError::from_task_error("Failed to fetch tasks", e))?;

    Ok(Json(TaskListResponse {
        success: true,
        count: tasks.len(),
        data: tasks,
    }))
}

async fn get_board(
    State(state): State<AppState>,
    Query(params): Query<TaskFilterParams>,
) -> Result<Json<BoardResponse>, ApiError> {
    let filter = parse_filter(params).map_err(|e| ApiError::from_task_error("Failed to fetch tasks", e))?;
    let columns = state
        .task_service
        .board(&filter)
        .await
        .map_err(|e| ApiError::from_task_error("Failed to fetch tasks", e))?;

    Ok(Json(BoardResponse {
        success: true,
        data: columns,
    }))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state
        .task_service
        .get(&id)
        .await
        .map_err(|e| ApiError::from_task_error("Failed to fetch task", e))?;

    Ok(Json(TaskResponse::new(task, None)))
}

async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload.map_err(ApiError::bad_body)?;
    let task = state
        .task_service
        .create(input)
        .await
        .map_err(|e| ApiError::from_task_error("Failed to create task", e))?;

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse::new(task, Some("Task created successfully".to_string()))),
    ))
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskInput>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let Json(input) = payload.map_err(ApiError::bad_body)?;
    let task = state
        .task_service
        .update(&id, input)
        .await
        .map_err(|e| ApiError::from_task_error("Failed to update task", e))?;

    Ok(Json(TaskResponse::new(task, Some("Task updated successfully".to_string()))))
}

async fn move_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MoveTaskInput>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let Json(input) = payload.map_err(ApiError::bad_body)?;
    let task = state
        .task_service
        .move_to(&id, input)
        .await
        .map_err(|e| ApiError::from_task_error("Failed to move task", e))?;

    let message = format!("Task moved to {}", task.status);
    Ok(Json(TaskResponse::new(task, Some(message))))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .task_service
        .delete(&id)
        .await
        .map_err(|e| ApiError::from_task_error("Failed to delete task", e))?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Task deleted successfully".to_string(),
    }))
}

async fn archive_completed(
    State(state): State<AppState>,
) -> Result<Json<ArchiveResponse>, ApiError> {
    let count = state
        .task_service
        .archive_completed()
        .await
        .map_err(|e| ApiError::from_task_error("Failed to archive tasks", e))?;

    Ok(Json(ArchiveResponse {
        success: true,
        count,
        message: format!("Archived {} completed task(s)", count),
    }))
}
