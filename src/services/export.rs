//! Task export rendering (JSON and Markdown)

use crate::models::{group_by_status, Task, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

const DATE_FORMAT: &str = "%B %-d, %Y";
const TIMESTAMP_FORMAT: &str = "%A, %B %-d, %Y at %-I:%M:%S %p UTC";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonExport {
    pub exported_at: DateTime<Utc>,
    pub task_count: usize,
    pub tasks: Vec<Task>,
}

pub fn json_export(tasks: Vec<Task>, now: DateTime<Utc>) -> JsonExport {
    JsonExport {
        exported_at: now,
        task_count: tasks.len(),
        tasks,
    }
}

/// Download name such as `taskboard-tasks-2025-03-01.md`
pub fn export_filename(now: DateTime<Utc>, extension: &str) -> String {
    format!("taskboard-tasks-{}.{}", now.format("%Y-%m-%d"), extension)
}

fn empty_column_placeholder(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Backlog => "*No tasks in backlog*",
        TaskStatus::InProgress => "*No tasks in progress*",
        TaskStatus::Done => "*No completed tasks*",
        TaskStatus::Blocked => "*No blocked tasks*",
    }
}

/// Render every task as a Markdown document, one section per board column
pub fn render_markdown(tasks: Vec<Task>, now: DateTime<Utc>) -> String {
    let total = tasks.len();
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "# Taskboard Tasks Export");
    let _ = writeln!(out);
    let _ = writeln!(out, "**Exported:** {}", now.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out, "**Total Tasks:** {}", total);
    let _ = writeln!(out);
    let _ = writeln!(out, "---");
    let _ = writeln!(out);

    for column in group_by_status(tasks) {
        let _ = writeln!(out, "## {} {}", column.icon, column.title);
        let _ = writeln!(out);
        if column.tasks.is_empty() {
            let _ = writeln!(out, "{}", empty_column_placeholder(column.id));
            let _ = writeln!(out);
            continue;
        }
        for task in &column.tasks {
            render_task(&mut out, task);
        }
    }

    out
}

fn render_task(out: &mut String, task: &Task) {
    let _ = writeln!(out, "### {}", task.title);
    let _ = writeln!(out);
    let _ = writeln!(out, "**Status:** {}", task.status);
    let _ = writeln!(out, "**Priority:** {}", task.priority);
    let _ = writeln!(out, "**Category:** {}", task.category);
    let _ = writeln!(out, "**Assignee:** {}", task.assignee);
    if let Some(due) = task.due_date {
        let _ = writeln!(out, "**Due Date:** {}", due.format(DATE_FORMAT));
    }
    let _ = writeln!(out, "**Created:** {}", task.created_at.format(DATE_FORMAT));
    if !task.description.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "**Description:**");
        let _ = writeln!(out, "{}", task.description);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "---");
    let _ = writeln!(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignee, TaskCategory};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 14, 5, 9).unwrap()
    }

    fn task(title: &str, status: TaskStatus) -> Task {
        let mut t = Task::new(title.to_string(), TaskCategory::Automation, Assignee::Arc);
        t.status = status;
        t.created_at = Utc.with_ymd_and_hms(2025, 2, 14, 9, 0, 0).unwrap();
        t
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename(fixed_now(), "json"), "taskboard-tasks-2025-03-01.json");
        assert_eq!(export_filename(fixed_now(), "md"), "taskboard-tasks-2025-03-01.md");
    }

    #[test]
    fn test_json_export_shape() {
        let export = json_export(vec![task("a", TaskStatus::Done)], fixed_now());
        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["taskCount"], 1);
        assert_eq!(json["exportedAt"], "2025-03-01T14:05:09Z");
        assert_eq!(json["tasks"][0]["title"], "a");
    }

    #[test]
    fn test_markdown_header() {
        let md = render_markdown(Vec::new(), fixed_now());
        assert!(md.starts_with("# Taskboard Tasks Export\n\n"));
        assert!(md.contains("**Exported:** Saturday, March 1, 2025 at 2:05:09 PM UTC"));
        assert!(md.contains("**Total Tasks:** 0"));
    }

    #[test]
    fn test_markdown_empty_columns_have_placeholders() {
        let md = render_markdown(Vec::new(), fixed_now());
        assert!(md.contains("## 📋 Backlog\n\n*No tasks in backlog*"));
        assert!(md.contains("## 🔄 In Progress\n\n*No tasks in progress*"));
        assert!(md.contains("## ✅ Done\n\n*No completed tasks*"));
        assert!(md.contains("## ⏸️ Blocked/Waiting\n\n*No blocked tasks*"));
    }

    #[test]
    fn test_markdown_task_block() {
        let mut t = task("Automate invoices", TaskStatus::InProgress);
        t.description = "Hook up the billing webhook".to_string();
        t.due_date = Some(Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap());

        let md = render_markdown(vec![t], fixed_now());
        let expected = "### Automate invoices\n\n\
                        **Status:** in-progress\n\
                        **Priority:** medium\n\
                        **Category:** automation\n\
                        **Assignee:** Arc\n\
                        **Due Date:** April 2, 2025\n\
                        **Created:** February 14, 2025\n\n\
                        **Description:**\n\
                        Hook up the billing webhook\n\n\
                        ---\n";
        assert!(md.contains(expected), "unexpected markdown:\n{}", md);
        assert!(!md.contains("*No tasks in progress*"));
    }

    #[test]
    fn test_markdown_skips_optional_lines() {
        let md = render_markdown(vec![task("Bare", TaskStatus::Backlog)], fixed_now());
        assert!(!md.contains("**Due Date:**"));
        assert!(!md.contains("**Description:**"));
    }

    #[test]
    fn test_markdown_sections_follow_board_order() {
        let md = render_markdown(
            vec![task("z", TaskStatus::Blocked), task("y", TaskStatus::Backlog)],
            fixed_now(),
        );
        let backlog = md.find("## 📋 Backlog").unwrap();
        let progress = md.find("## 🔄 In Progress").unwrap();
        let done = md.find("## ✅ Done").unwrap();
        let blocked = md.find("## ⏸️ Blocked/Waiting").unwrap();
        assert!(backlog < progress && progress < done && done < blocked);
    }
}
