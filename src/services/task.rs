//! Task service
//!
//! Validation and board rules on top of [`TaskRepository`]. Inputs arrive as
//! loosely typed strings; every field is checked and all problems are
//! reported together as [`FieldError`]s.

use crate::db::repositories::TaskRepository;
use crate::models::{
    group_by_status, Assignee, BoardColumn, CreateTaskInput, MoveTaskInput, Task, TaskCategory,
    TaskFilter, TaskFilterParams, TaskStatus, UpdateTaskInput,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Validation error: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: CreateTaskInput) -> Result<Task, TaskServiceError> {
        let mut errors = Vec::new();

        let title = match input.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => Some(t.to_string()),
            _ => {
                errors.push(FieldError::new("title", "Title is required"));
                None
            }
        };
        let category = required::<TaskCategory>("category", "Category", input.category, &mut errors);
        let assignee = required::<Assignee>("assignee", "Assignee", input.assignee, &mut errors);
        let status = optional::<TaskStatus>("status", input.status, &mut errors);
        let priority = optional("priority", input.priority, &mut errors);
        let due_date = optional_due_date(input.due_date, &mut errors);

        let (Some(title), Some(category), Some(assignee)) = (title, category, assignee) else {
            return Err(TaskServiceError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(TaskServiceError::Validation(errors));
        }

        let mut task = Task::new(title, category, assignee);
        task.description = input.description.unwrap_or_default();
        task.status = status.unwrap_or_default();
        task.priority = priority.unwrap_or_default();
        task.due_date = due_date.flatten();
        task.archived = input.archived.unwrap_or(false);

        let task = self.repo.create(&task).await?;
        tracing::info!(task_id = %task.id, "Created task '{}'", task.title);
        Ok(task)
    }

    pub async fn get(&self, id: &str) -> Result<Task, TaskServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| TaskServiceError::NotFound(id.to_string()))
    }

    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = self.repo.list().await?;
        Ok(filter.apply(tasks))
    }

    /// Active tasks grouped into columns. Archived tasks never appear on the
    /// board, whatever the filter says.
    pub async fn board(&self, filter: &TaskFilter) -> Result<Vec<BoardColumn>, TaskServiceError> {
        let filter = TaskFilter {
            archived: Some(false),
            ..filter.clone()
        };
        let tasks = self.list(&filter).await?;
        Ok(group_by_status(tasks))
    }

    pub async fn update(&self, id: &str, input: UpdateTaskInput) -> Result<Task, TaskServiceError> {
        let mut errors = Vec::new();

        let title = match input.title.as_deref().map(str::trim) {
            Some("") => {
                errors.push(FieldError::new("title", "Title is required"));
                None
            }
            Some(t) => Some(t.to_string()),
            None => None,
        };
        let status = optional::<TaskStatus>("status", input.status, &mut errors);
        let priority = optional("priority", input.priority, &mut errors);
        let category = optional::<TaskCategory>("category", input.category, &mut errors);
        let assignee = optional::<Assignee>("assignee", input.assignee, &mut errors);
        let due_date = optional_due_date(input.due_date, &mut errors);

        if !errors.is_empty() {
            return Err(TaskServiceError::Validation(errors));
        }

        let mut task = self.get(id).await?;
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = input.description {
            task.description = description;
        }
        if let Some(status) = status {
            task.status = status;
        }
        if let Some(priority) = priority {
            task.priority = priority;
        }
        if let Some(category) = category {
            task.category = category;
        }
        if let Some(assignee) = assignee {
            task.assignee = assignee;
        }
        if let Some(due_date) = due_date {
            task.due_date = due_date;
        }
        if let Some(archived) = input.archived {
            task.archived = archived;
        }
        task.updated_at = Utc::now();

        Ok(self.repo.update(&task).await?)
    }

    pub async fn move_to(&self, id: &str, input: MoveTaskInput) -> Result<Task, TaskServiceError> {
        let mut errors = Vec::new();
        let status = required::<TaskStatus>("status", "Status", input.status, &mut errors);
        let Some(status) = status else {
            return Err(TaskServiceError::Validation(errors));
        };

        let mut task = self.get(id).await?;
        if task.status != status {
            tracing::info!(task_id = %task.id, "Moving task from {} to {}", task.status, status);
        }
        task.status = status;
        task.updated_at = Utc::now();

        Ok(self.repo.update(&task).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), TaskServiceError> {
        if !self.repo.delete(id).await? {
            return Err(TaskServiceError::NotFound(id.to_string()));
        }
        tracing::info!(task_id = %id, "Deleted task");
        Ok(())
    }

    /// Archive every active task in the done column
    pub async fn archive_completed(&self) -> Result<u64, TaskServiceError> {
        let count = self.repo.archive_done(Utc::now()).await?;
        tracing::info!("Archived {} completed task(s)", count);
        Ok(count)
    }
}

/// Turn raw filter strings into a typed filter, rejecting unknown values
pub fn parse_filter(params: TaskFilterParams) -> Result<TaskFilter, TaskServiceError> {
    let mut errors = Vec::new();

    let status = optional("status", params.status, &mut errors);
    let priority = optional("priority", params.priority, &mut errors);
    let category = optional("category", params.category, &mut errors);
    let assignee = optional("assignee", params.assignee, &mut errors);
    let archived = match params.archived.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some("true") => Some(true),
        Some("false") => Some(false),
        Some(other) => {
            errors.push(FieldError::new(
                "archived",
                format!("Invalid archived flag '{}': expected true or false", other),
            ));
            None
        }
    };

    if !errors.is_empty() {
        return Err(TaskServiceError::Validation(errors));
    }

    Ok(TaskFilter {
        status,
        priority,
        category,
        assignee,
        search: params.search.filter(|s| !s.trim().is_empty()),
        archived,
    })
}

/// Parse a due date given as RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC)
pub fn parse_due_date(value: &str) -> anyhow::Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        anyhow::anyhow!("Invalid due date '{}': expected YYYY-MM-DD or an RFC 3339 timestamp", value)
    })?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

fn required<T>(
    field: &str,
    label: &str,
    value: Option<String>,
    errors: &mut Vec<FieldError>,
) -> Option<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => {
            errors.push(FieldError::new(field, format!("{} is required", label)));
            None
        }
        Some(raw) => parse_into(field, raw, errors),
    }
}

fn optional<T>(field: &str, value: Option<String>, errors: &mut Vec<FieldError>) -> Option<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    let raw = value?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    parse_into(field, raw, errors)
}

fn parse_into<T>(field: &str, raw: &str, errors: &mut Vec<FieldError>) -> Option<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    match raw.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push(FieldError::new(field, e.to_string()));
            None
        }
    }
}

/// `None` leaves the due date alone, `Some(None)` clears it
fn optional_due_date(
    value: Option<String>,
    errors: &mut Vec<FieldError>,
) -> Option<Option<DateTime<Utc>>> {
    let raw = value?;
    if raw.trim().is_empty() {
        return Some(None);
    }
    match parse_due_date(&raw) {
        Ok(dt) => Some(Some(dt)),
        Err(e) => {
            errors.push(FieldError::new("dueDate", e.to_string()));
            None
        }
    }
}
