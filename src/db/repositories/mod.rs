//! Database repositories

pub mod task;

pub use task::{SqlxTaskRepository, TaskRepository};
