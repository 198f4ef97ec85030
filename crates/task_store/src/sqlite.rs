//! SQLite-backed task storage.

use std::{path::PathBuf, sync::OnceLock};

use async_trait::async_trait;
use entities::{Task, TaskStatus};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, Pool, Sqlite,
};

use crate::{traits::renormalize, BackendKind, TaskBackend, TaskStoreError, TaskStoreResult};

/// SQL schema definition
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    category TEXT,
    priority TEXT,
    dueDate TEXT,
    status TEXT
)
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, title, description, category, priority, dueDate, status FROM tasks";

/// Database row for Task
#[derive(Debug, FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: Option<String>,
    category: Option<String>,
    priority: Option<String>,
    #[sqlx(rename = "dueDate")]
    due_date: Option<String>,
    status: Option<String>,
}

impl TaskRow {
    fn into_task(self) -> Option<Task> {
        let Some(status) = self.status.as_deref().and_then(TaskStatus::parse) else {
            tracing::warn!(
                "Skipping task {} with unknown status {:?}",
                self.id,
                self.status
            );
            return None;
        };
        renormalize(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            priority: self.priority,
            due_date: self.due_date.unwrap_or_default(),
            status,
        })
    }
}

/// Task backend storing one row per task in a single SQLite table.
///
/// Each operation is a single statement, so every write is atomic on its own.
#[derive(Debug)]
pub struct SqliteTaskBackend {
    path: PathBuf,
    pool: OnceLock<Pool<Sqlite>>,
}

impl SqliteTaskBackend {
    /// Creates a backend for the database file at `path`. Nothing is opened
    /// until [`TaskBackend::initialize`] runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: OnceLock::new(),
        }
    }

    fn pool(&self) -> TaskStoreResult<&Pool<Sqlite>> {
        self.pool.get().ok_or_else(|| {
            TaskStoreError::BackendInit(format!("database {} is not open", self.path.display()))
        })
    }

    async fn open_pool(&self) -> TaskStoreResult<Pool<Sqlite>> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(pool)
    }
}

#[async_trait]
impl TaskBackend for SqliteTaskBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    async fn initialize(&self) -> TaskStoreResult<()> {
        if self.pool.get().is_none() {
            let pool = self.open_pool().await?;
            // A concurrent initialize may have won; its pool is kept
            let _ = self.pool.set(pool);
        }

        sqlx::query(SCHEMA_SQL).execute(self.pool()?).await?;

        tracing::info!("Opened task database at {}", self.path.display());
        Ok(())
    }

    async fn insert_task(&self, task: &Task) -> TaskStoreResult<()> {
        sqlx::query(
            "INSERT INTO tasks (id, title, description, category, priority, dueDate, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.category)
        .bind(&task.priority)
        .bind(&task.due_date)
        .bind(task.status.as_str())
        .execute(self.pool()?)
        .await?;

        Ok(())
    }

    async fn list_tasks(&self, status: TaskStatus) -> TaskStoreResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE status = ?"))
            .bind(status.as_str())
            .fetch_all(self.pool()?)
            .await?;

        Ok(rows.into_iter().filter_map(TaskRow::into_task).collect())
    }

    async fn get_task(&self, id: &str) -> TaskStoreResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool()?)
            .await?;

        Ok(row.and_then(TaskRow::into_task))
    }

    async fn update_task(&self, task: &Task) -> TaskStoreResult<()> {
        sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, category = ?, priority = ?, dueDate = \
             ?, status = ? WHERE id = ?",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.category)
        .bind(&task.priority)
        .bind(&task.due_date)
        .bind(task.status.as_str())
        .bind(&task.id)
        .execute(self.pool()?)
        .await?;

        Ok(())
    }

    async fn set_status(&self, id: &str, status: TaskStatus) -> TaskStoreResult<()> {
        sqlx::query("UPDATE tasks SET status = ? WHERE id = ? AND status IS NOT ?")
            .bind(status.as_str())
            .bind(id)
            .bind(TaskStatus::Deleted.as_str())
            .execute(self.pool()?)
            .await?;

        Ok(())
    }
}
