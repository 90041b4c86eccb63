//! Data models
//!
//! Tasks and the request shapes used to create, change and filter them.

mod task;

pub use task::{
    group_by_status, Assignee, BoardColumn, CreateTaskInput, MoveTaskInput, Task, TaskCategory,
    TaskFilter, TaskFilterParams, TaskPriority, TaskStatus, UpdateTaskInput,
};
