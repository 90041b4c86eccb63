//! Command-line client for the task board
//!
//! Works directly against the configured database, so it can be used while
//! the server is down. `keygen` and `token` need no database at all.

use anyhow::{Context, Result};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use taskboard::{
    config::Config,
    db::{self, repositories::SqlxTaskRepository},
    models::{CreateTaskInput, MoveTaskInput, Task, TaskFilterParams, UpdateTaskInput},
    services::{parse_filter, TaskService, TaskServiceError, TokenCodec},
};

const DATE_FORMAT: &str = "%B %-d, %Y";
const TIMESTAMP_FORMAT: &str = "%B %-d, %Y %H:%M:%S UTC";

#[derive(Parser)]
#[command(name = "taskboard-cli", version, about = "Manage Kanban tasks from the command line")]
struct Cli {
    #[arg(long, env = "TASKBOARD_CONFIG", default_value = "config.yml", help = "Config file path")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Task(TaskCommand),
    /// Print a fresh random signing secret
    Keygen,
    /// Issue a session token for scripting against the API
    Token { username: String },
}

/// Commands that need the task database
#[derive(Subcommand)]
enum TaskCommand {
    /// List tasks, optionally filtered
    List {
        #[arg(short, long, help = "backlog, in-progress, done, blocked")]
        status: Option<String>,
        #[arg(short, long, help = "high, medium, low")]
        priority: Option<String>,
        #[arg(short, long, help = "marketing, product, research, automation")]
        category: Option<String>,
        #[arg(short, long, help = "Arun, Arc")]
        assignee: Option<String>,
    },
    /// Create a task
    Add {
        title: String,
        #[arg(short, long)]
        category: String,
        #[arg(short, long)]
        assignee: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(long, help = "Due date (YYYY-MM-DD)")]
        due: Option<String>,
    },
    /// Change fields of a task
    Update {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        assignee: Option<String>,
        #[arg(long, help = "Due date (YYYY-MM-DD); empty clears it")]
        due: Option<String>,
    },
    /// Move a task to another column
    Move { id: String, status: String },
    /// Delete a task
    Delete { id: String },
    /// Show every field of a task
    Show { id: String },
    /// Archive all tasks in the done column
    ArchiveCompleted,
}

#[tokio::main]
async fn main() {
    taskboard::init_tracing("taskboard=warn");

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Keygen => {
            println!("{}", generate_secret());
            Ok(())
        }
        Command::Token { username } => {
            let config = Config::load_with_env(&cli.config)?;
            let codec = TokenCodec::new(config.auth.secret()?).context("Invalid auth secret")?;
            println!("{}", codec.issue(&username).token);
            Ok(())
        }
        Command::Task(command) => {
            let config = Config::load_with_env(&cli.config)?;
            let pool = db::create_pool(&config.database).await?;
            db::migrations::run_migrations(&pool).await?;
            let service = TaskService::new(SqlxTaskRepository::boxed(pool.clone()));

            let result = run_task_command(&service, command).await;
            pool.close().await;
            result
        }
    }
}

async fn run_task_command(service: &TaskService, command: TaskCommand) -> Result<()> {
    match command {
        TaskCommand::List {
            status,
            priority,
            category,
            assignee,
        } => {
            let filter = parse_filter(TaskFilterParams {
                status,
                priority,
                category,
                assignee,
                ..TaskFilterParams::default()
            })
            .map_err(describe)?;
            let tasks = service.list(&filter).await.map_err(describe)?;

            println!("\nFound {} task(s):\n", tasks.len());
            for (index, task) in tasks.iter().enumerate() {
                print_summary(index + 1, task);
            }
        }
        TaskCommand::Add {
            title,
            category,
            assignee,
            description,
            priority,
            status,
            due,
        } => {
            let task = service
                .create(CreateTaskInput {
                    title: Some(title),
                    description,
                    status,
                    priority,
                    category: Some(category),
                    assignee: Some(assignee),
                    due_date: due,
                    archived: None,
                })
                .await
                .map_err(describe)?;
            println!("\nTask created successfully!");
            print_brief(&task);
        }
        TaskCommand::Update {
            id,
            title,
            description,
            status,
            priority,
            category,
            assignee,
            due,
        } => {
            let task = service
                .update(
                    &id,
                    UpdateTaskInput {
                        title,
                        description,
                        status,
                        priority,
                        category,
                        assignee,
                        due_date: due,
                        archived: None,
                    },
                )
                .await
                .map_err(describe)?;
            println!("\nTask updated successfully!");
            print_brief(&task);
        }
        TaskCommand::Move { id, status } => {
            let task = service
                .move_to(&id, MoveTaskInput { status: Some(status) })
                .await
                .map_err(describe)?;
            println!("\nTask moved to {}!", task.status);
            println!("ID: {}", task.id);
            println!("Title: {}\n", task.title);
        }
        TaskCommand::Delete { id } => {
            let task = service.get(&id).await.map_err(describe)?;
            service.delete(&id).await.map_err(describe)?;
            println!("\nTask deleted successfully!");
            println!("ID: {}", task.id);
            println!("Title: {}\n", task.title);
        }
        TaskCommand::Show { id } => {
            let task = service.get(&id).await.map_err(describe)?;
            print_details(&task);
        }
        TaskCommand::ArchiveCompleted => {
            let count = service.archive_completed().await.map_err(describe)?;
            println!("Archived {} completed task(s)", count);
        }
    }
    Ok(())
}

/// 32 random bytes, base64url without padding
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    data_encoding::BASE64URL_NOPAD.encode(&bytes)
}

fn describe(err: TaskServiceError) -> anyhow::Error {
    match err {
        TaskServiceError::NotFound(_) => anyhow::anyhow!("Task not found"),
        TaskServiceError::Validation(errors) => {
            let lines: Vec<String> = errors
                .iter()
                .map(|e| format!("  {}: {}", e.field, e.message))
                .collect();
            anyhow::anyhow!("Validation error\n{}", lines.join("\n"))
        }
        TaskServiceError::Internal(e) => e,
    }
}

fn print_summary(position: usize, task: &Task) {
    let short_id: String = task.id.chars().take(8).collect();
    println!("{}. [{}] {}", position, short_id, task.title);
    println!(
        "   Status: {} | Priority: {} | Category: {}",
        task.status, task.priority, task.category
    );
    println!("   Assignee: {}", task.assignee);
    if let Some(due) = task.due_date {
        println!("   Due: {}", due.format(DATE_FORMAT));
    }
    if !task.description.is_empty() {
        let preview: String = task.description.chars().take(100).collect();
        let ellipsis = if task.description.chars().count() > 100 { "..." } else { "" };
        println!("   Description: {}{}", preview, ellipsis);
    }
    println!();
}

fn print_brief(task: &Task) {
    println!("ID: {}", task.id);
    println!("Title: {}", task.title);
    println!("Status: {}", task.status);
    println!("Priority: {}", task.priority);
    println!("Category: {}", task.category);
    println!("Assignee: {}\n", task.assignee);
}

fn print_details(task: &Task) {
    println!("\nTask Details:");
    println!("================\n");
    println!("ID: {}", task.id);
    println!("Title: {}", task.title);
    if task.description.is_empty() {
        println!("Description: (no description)");
    } else {
        println!("Description: {}", task.description);
    }
    println!("Status: {}", task.status);
    println!("Priority: {}", task.priority);
    println!("Category: {}", task.category);
    println!("Assignee: {}", task.assignee);
    if let Some(due) = task.due_date {
        println!("Due Date: {}", due.format(DATE_FORMAT));
    }
    println!("Created: {}", task.created_at.format(TIMESTAMP_FORMAT));
    println!("Updated: {}", task.updated_at.format(TIMESTAMP_FORMAT));
    if task.archived {
        println!("Archived: yes");
    }
    println!();
}
