//! Storage backend trait.

use async_trait::async_trait;
use entities::{Task, TaskStatus};

use crate::{normalize_date, TaskStoreResult};

/// Which kind of storage a backend persists to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Embedded relational database.
    Relational,
    /// Serialized collection in a key-value slot.
    FlatStore,
}

/// Operations every task storage backend provides.
///
/// Backends receive tasks that are already validated and normalized; on the
/// way out they re-normalize each due date before returning it.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Returns the kind of storage behind this backend.
    fn kind(&self) -> BackendKind;

    /// Opens or seeds the underlying storage. Must be idempotent.
    async fn initialize(&self) -> TaskStoreResult<()>;

    /// Persists a new task.
    async fn insert_task(&self, task: &Task) -> TaskStoreResult<()>;

    /// Lists tasks whose status equals `status`.
    async fn list_tasks(&self, status: TaskStatus) -> TaskStoreResult<Vec<Task>>;

    /// Gets a task by ID regardless of status.
    async fn get_task(&self, id: &str) -> TaskStoreResult<Option<Task>>;

    /// Overwrites every field of the task with the same ID. Does nothing if
    /// no such task exists.
    async fn update_task(&self, task: &Task) -> TaskStoreResult<()>;

    /// Sets the status of a task. Does nothing if the task does not exist or
    /// is already deleted.
    async fn set_status(&self, id: &str, status: TaskStatus) -> TaskStoreResult<()>;
}

/// Re-normalizes the due date of a task read back from storage.
///
/// Returns `None` (and logs) if the stored date is no longer parseable.
pub(crate) fn renormalize(mut task: Task) -> Option<Task> {
    match normalize_date(&task.due_date) {
        Ok(due_date) => {
            task.due_date = due_date;
            Some(task)
        }
        Err(e) => {
            tracing::warn!("Skipping task {} with unreadable due date: {}", task.id, e);
            None
        }
    }
}
