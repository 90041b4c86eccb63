//! Task model for the Kanban board

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column a task sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Backlog,
    InProgress,
    Done,
    Blocked,
}

impl TaskStatus {
    /// All columns in board order
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Backlog,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Blocked => "blocked",
        }
    }

    /// Column heading shown on the board and in exports
    pub fn title(&self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
            Self::Blocked => "Blocked/Waiting",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Backlog => "📋",
            Self::InProgress => "🔄",
            Self::Done => "✅",
            Self::Blocked => "⏸️",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(Self::Backlog),
            "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "blocked" => Ok(Self::Blocked),
            _ => Err(anyhow::anyhow!(
                "Invalid status '{}': expected one of backlog, in-progress, done, blocked",
                s
            )),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(anyhow::anyhow!(
                "Invalid priority '{}': expected one of high, medium, low",
                s
            )),
        }
    }
}

/// Task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Marketing,
    Product,
    Research,
    Automation,
}

impl std::fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Marketing => write!(f, "marketing"),
            Self::Product => write!(f, "product"),
            Self::Research => write!(f, "research"),
            Self::Automation => write!(f, "automation"),
        }
    }
}

impl std::str::FromStr for TaskCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "marketing" => Ok(Self::Marketing),
            "product" => Ok(Self::Product),
            "research" => Ok(Self::Research),
            "automation" => Ok(Self::Automation),
            _ => Err(anyhow::anyhow!(
                "Invalid category '{}': expected one of marketing, product, research, automation",
                s
            )),
        }
    }
}

/// Person a task is assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assignee {
    Arun,
    Arc,
}

impl std::fmt::Display for Assignee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Arun => write!(f, "Arun"),
            Self::Arc => write!(f, "Arc"),
        }
    }
}

impl std::str::FromStr for Assignee {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Arun" => Ok(Self::Arun),
            "Arc" => Ok(Self::Arc),
            _ => Err(anyhow::anyhow!("Invalid assignee '{}': expected one of Arun, Arc", s)),
        }
    }
}

/// A card on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    pub assignee: Assignee,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived: bool,
}

impl Task {
    /// Create a new task with a fresh id and timestamps
    pub fn new(title: String, category: TaskCategory, assignee: Assignee) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            description: String::new(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            category,
            assignee,
            due_date: None,
            created_at: now,
            updated_at: now,
            archived: false,
        }
    }

    /// Whether the due date has passed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date.map(|due| due < now).unwrap_or(false)
    }
}

/// Input for creating a task.
///
/// Enum fields arrive as raw strings and are validated by the task service so
/// that every problem can be reported at once.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
    pub archived: Option<bool>,
}

/// Input for updating a task; absent fields are left untouched.
///
/// An empty `dueDate` clears the due date.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
    pub archived: Option<bool>,
}

/// Input for moving a task to another column
#[derive(Debug, Clone, Deserialize)]
pub struct MoveTaskInput {
    pub status: Option<String>,
}

/// Raw list filters as they arrive in a query string or on the command line
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilterParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub assignee: Option<String>,
    pub search: Option<String>,
    pub archived: Option<String>,
}

/// Criteria for narrowing down the task list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<TaskCategory>,
    pub assignee: Option<Assignee>,
    /// Case-insensitive substring of title or description
    pub search: Option<String>,
    pub archived: Option<bool>,
}

impl TaskFilter {
    /// Filter used by the board view: every active task
    pub fn board() -> Self {
        Self {
            archived: Some(false),
            ..Self::default()
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(archived) = self.archived {
            if task.archived != archived {
                return false;
            }
        }
        if self.status.map_or(false, |s| s != task.status) {
            return false;
        }
        if self.priority.map_or(false, |p| p != task.priority) {
            return false;
        }
        if self.category.map_or(false, |c| c != task.category) {
            return false;
        }
        if self.assignee.map_or(false, |a| a != task.assignee) {
            return false;
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            if !task.title.to_lowercase().contains(&needle)
                && !task.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, tasks: Vec<Task>) -> Vec<Task> {
        tasks.into_iter().filter(|t| self.matches(t)).collect()
    }
}

/// One column of the board view
#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
    pub id: TaskStatus,
    pub title: &'static str,
    pub icon: &'static str,
    pub tasks: Vec<Task>,
}

/// Group tasks into the four status columns, in board order.
///
/// Tasks keep their relative order within a column.
pub fn group_by_status(tasks: Vec<Task>) -> Vec<BoardColumn> {
    let mut columns: Vec<BoardColumn> = TaskStatus::ALL
        .iter()
        .map(|status| BoardColumn {
            id: *status,
            title: status.title(),
            icon: status.icon(),
            tasks: Vec::new(),
        })
        .collect();

    for task in tasks {
        if let Some(column) = columns.iter_mut().find(|c| c.id == task.status) {
            column.tasks.push(task);
        }
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(title: &str, status: TaskStatus) -> Task {
        let mut t = Task::new(title.to_string(), TaskCategory::Product, Assignee::Arun);
        t.status = status;
        t
    }

    #[test]
    fn test_status_serde_uses_kebab_case() {
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), "in-progress");
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("In Progress".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_assignee_is_case_sensitive() {
        assert_eq!("Arc".parse::<Assignee>().unwrap(), Assignee::Arc);
        assert!("arc".parse::<Assignee>().is_err());
        assert_eq!(serde_json::to_value(Assignee::Arun).unwrap(), "Arun");
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let t = task("Write launch post", TaskStatus::Backlog);
        let json = serde_json::to_value(&t).unwrap();

        assert_eq!(json["title"], "Write launch post");
        assert_eq!(json["status"], "backlog");
        assert_eq!(json["priority"], "medium");
        assert_eq!(json["category"], "product");
        assert_eq!(json["archived"], false);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("dueDate").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_new_task_defaults() {
        let t = Task::new("x".to_string(), TaskCategory::Research, Assignee::Arc);
        assert_eq!(t.status, TaskStatus::Backlog);
        assert_eq!(t.priority, TaskPriority::Medium);
        assert!(t.description.is_empty());
        assert!(!t.archived);
        assert!(uuid::Uuid::parse_str(&t.id).is_ok());
    }

    #[test]
    fn test_is_overdue() {
        let now = Utc::now();
        let mut t = task("x", TaskStatus::Backlog);
        assert!(!t.is_overdue(now));
        t.due_date = Some(now - chrono::Duration::days(1));
        assert!(t.is_overdue(now));
        t.due_date = Some(now + chrono::Duration::days(1));
        assert!(!t.is_overdue(now));
    }

    #[test]
    fn test_board_filter_hides_archived() {
        let mut archived = task("old", TaskStatus::Done);
        archived.archived = true;
        let active = task("new", TaskStatus::Done);

        let filter = TaskFilter::board();
        assert!(!filter.matches(&archived));
        assert!(filter.matches(&active));
        assert!(TaskFilter::default().matches(&archived));
    }

    #[test]
    fn test_search_matches_title_or_description() {
        let mut t = task("Record Demo Video", TaskStatus::Backlog);
        t.description = "Use the NEW microphone".to_string();

        let search = |s: &str| TaskFilter {
            search: Some(s.to_string()),
            ..TaskFilter::default()
        };

        assert!(search("demo").matches(&t));
        assert!(search("microphone").matches(&t));
        assert!(search("").matches(&t));
        assert!(!search("podcast").matches(&t));
    }

    #[test]
    fn test_filters_combine() {
        let mut t = task("x", TaskStatus::Blocked);
        t.priority = TaskPriority::High;

        let filter = TaskFilter {
            status: Some(TaskStatus::Blocked),
            priority: Some(TaskPriority::High),
            assignee: Some(Assignee::Arun),
            ..TaskFilter::default()
        };
        assert!(filter.matches(&t));

        let filter = TaskFilter {
            priority: Some(TaskPriority::High),
            category: Some(TaskCategory::Marketing),
            ..TaskFilter::default()
        };
        assert!(!filter.matches(&t));
    }

    #[test]
    fn test_group_by_status_keeps_board_order() {
        let tasks = vec![
            task("a", TaskStatus::Done),
            task("b", TaskStatus::Backlog),
            task("c", TaskStatus::Done),
        ];

        let columns = group_by_status(tasks);
        let ids: Vec<_> = columns.iter().map(|c| c.id).collect();
        assert_eq!(ids, TaskStatus::ALL.to_vec());

        assert_eq!(columns[0].tasks.len(), 1);
        assert_eq!(columns[1].tasks.len(), 0);
        let done: Vec<_> = columns[2].tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(done, vec!["a", "c"]);
        assert_eq!(columns[3].title, "Blocked/Waiting");
    }
}
