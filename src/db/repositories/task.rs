//! Task repository

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::{Task, TaskStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> Result<Task>;
    async fn get_by_id(&self, id: &str) -> Result<Option<Task>>;
    /// All tasks, archived included, oldest first
    async fn list(&self) -> Result<Vec<Task>>;
    async fn update(&self, task: &Task) -> Result<Task>;
    /// Returns false when no task had this id
    async fn delete(&self, id: &str) -> Result<bool>;
    /// Archive every unarchived task in the done column, returning how many changed
    async fn archive_done(&self, now: DateTime<Utc>) -> Result<u64>;
}

pub struct SqlxTaskRepository {
    pool: DynDatabasePool,
}

impl SqlxTaskRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TaskRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TaskRepository for SqlxTaskRepository {
    async fn create(&self, task: &Task) -> Result<Task> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(sqlite_pool(&self.pool)?, task).await,
            DatabaseDriver::Mysql => create_mysql(mysql_pool(&self.pool)?, task).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Task>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Task>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(sqlite_pool(&self.pool)?).await,
            DatabaseDriver::Mysql => list_mysql(mysql_pool(&self.pool)?).await,
        }
    }

    async fn update(&self, task: &Task) -> Result<Task> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(sqlite_pool(&self.pool)?, task).await,
            DatabaseDriver::Mysql => update_mysql(mysql_pool(&self.pool)?, task).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => delete_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn archive_done(&self, now: DateTime<Utc>) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => archive_done_sqlite(sqlite_pool(&self.pool)?, now).await,
            DatabaseDriver::Mysql => archive_done_mysql(mysql_pool(&self.pool)?, now).await,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, title, description, status, priority, category, assignee, due_date, created_at, updated_at, archived FROM tasks";

const INSERT_SQL: &str = "INSERT INTO tasks (id, title, description, status, priority, category, assignee, due_date, created_at, updated_at, archived) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const UPDATE_SQL: &str = "UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?, category = ?, assignee = ?, due_date = ?, updated_at = ?, archived = ? WHERE id = ?";

/// Columns stored as text that map onto model enums
struct RawEnums {
    status: String,
    priority: String,
    category: String,
    assignee: String,
}

#[allow(clippy::too_many_arguments)]
fn build_task(
    id: String,
    title: String,
    description: String,
    raw: RawEnums,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    archived: bool,
) -> Result<Task> {
    Ok(Task {
        status: raw
            .status
            .parse()
            .with_context(|| format!("Corrupt status on task {}", id))?,
        priority: raw
            .priority
            .parse()
            .with_context(|| format!("Corrupt priority on task {}", id))?,
        category: raw
            .category
            .parse()
            .with_context(|| format!("Corrupt category on task {}", id))?,
        assignee: raw
            .assignee
            .parse()
            .with_context(|| format!("Corrupt assignee on task {}", id))?,
        id,
        title,
        description,
        due_date,
        created_at,
        updated_at,
        archived,
    })
}

// SQLite implementations
async fn create_sqlite(pool: &SqlitePool, task: &Task) -> Result<Task> {
    sqlx::query(INSERT_SQL)
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.to_string())
        .bind(task.priority.to_string())
        .bind(task.category.to_string())
        .bind(task.assignee.to_string())
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.archived)
        .execute(pool)
        .await
        .context("Failed to create task")?;

    Ok(task.clone())
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Task>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get task")?;
    row.map(|r| row_to_task_sqlite(&r)).transpose()
}

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<Task>> {
    let rows = sqlx::query(&format!("{} ORDER BY created_at ASC, id ASC", SELECT_COLUMNS))
        .fetch_all(pool)
        .await
        .context("Failed to list tasks")?;
    rows.iter().map(row_to_task_sqlite).collect()
}

async fn update_sqlite(pool: &SqlitePool, task: &Task) -> Result<Task> {
    sqlx::query(UPDATE_SQL)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.to_string())
        .bind(task.priority.to_string())
        .bind(task.category.to_string())
        .bind(task.assignee.to_string())
        .bind(task.due_date)
        .bind(task.updated_at)
        .bind(task.archived)
        .bind(&task.id)
        .execute(pool)
        .await
        .context("Failed to update task")?;

    Ok(task.clone())
}

async fn delete_sqlite(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete task")?;
    Ok(result.rows_affected() > 0)
}

async fn archive_done_sqlite(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE tasks SET archived = ?, updated_at = ? WHERE status = ? AND archived = ?",
    )
    .bind(true)
    .bind(now)
    .bind(TaskStatus::Done.as_str())
    .bind(false)
    .execute(pool)
    .await
    .context("Failed to archive completed tasks")?;
    Ok(result.rows_affected())
}

fn row_to_task_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Task> {
    build_task(
        row.try_get("id")?,
        row.try_get("title")?,
        row.try_get("description")?,
        RawEnums {
            status: row.try_get("status")?,
            priority: row.try_get("priority")?,
            category: row.try_get("category")?,
            assignee: row.try_get("assignee")?,
        },
        row.try_get("due_date")?,
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
        row.try_get("archived")?,
    )
}

// MySQL implementations
async fn create_mysql(pool: &MySqlPool, task: &Task) -> Result<Task> {
    sqlx::query(INSERT_SQL)
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.to_string())
        .bind(task.priority.to_string())
        .bind(task.category.to_string())
        .bind(task.assignee.to_string())
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.archived)
        .execute(pool)
        .await
        .context("Failed to create task")?;

    Ok(task.clone())
}

async fn get_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Task>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get task")?;
    row.map(|r| row_to_task_mysql(&r)).transpose()
}

async fn list_mysql(pool: &MySqlPool) -> Result<Vec<Task>> {
    let rows = sqlx::query(&format!("{} ORDER BY created_at ASC, id ASC", SELECT_COLUMNS))
        .fetch_all(pool)
        .await
        .context("Failed to list tasks")?;
    rows.iter().map(row_to_task_mysql).collect()
}

async fn update_mysql(pool: &MySqlPool, task: &Task) -> Result<Task> {
    sqlx::query(UPDATE_SQL)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.to_string())
        .bind(task.priority.to_string())
        .bind(task.category.to_string())
        .bind(task.assignee.to_string())
        .bind(task.due_date)
        .bind(task.updated_at)
        .bind(task.archived)
        .bind(&task.id)
        .execute(pool)
        .await
        .context("Failed to update task")?;

    Ok(task.clone())
}

async fn delete_mysql(pool: &MySqlPool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete task")?;
    Ok(result.rows_affected() > 0)
}

async fn archive_done_mysql(pool: &MySqlPool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE tasks SET archived = ?, updated_at = ? WHERE status = ? AND archived = ?",
    )
    .bind(true)
    .bind(now)
    .bind(TaskStatus::Done.as_str())
    .bind(false)
    .execute(pool)
    .await
    .context("Failed to archive completed tasks")?;
    Ok(result.rows_affected())
}

fn row_to_task_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Task> {
    build_task(
        row.try_get("id")?,
        row.try_get("title")?,
        row.try_get("description")?,
        RawEnums {
            status: row.try_get("status")?,
            priority: row.try_get("priority")?,
            category: row.try_get("category")?,
            assignee: row.try_get("assignee")?,
        },
        row.try_get("due_date")?,
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
        row.try_get("archived")?,
    )
}
