//! Task access facade.
//!
//! [`TaskService`] is the only entry point the view layer uses. It starts the
//! backend's setup as soon as it is constructed and makes every operation wait
//! for that setup to finish before touching storage.

use std::{path::Path, sync::Arc};

use entities::{NewTask, Task, TaskStatus};
use tokio::sync::watch;

use crate::{
    normalize_date, select_backend, BackendKind, ConfigResult, HostPlatform, StoreConfig,
    TaskBackend, TaskStoreError, TaskStoreResult,
};

/// Progress of the one-shot backend setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// Setup has not been started.
    NotStarted,
    /// Setup is running.
    Initializing,
    /// Setup has finished, successfully or not.
    Ready,
}

/// Backend-agnostic task operations.
///
/// Writes report failures to the caller. Reads never fail: a storage error is
/// logged and shows up as an empty result.
pub struct TaskService {
    backend: Arc<dyn TaskBackend>,
    state: watch::Receiver<InitState>,
}

impl TaskService {
    /// Creates the service and starts initializing `backend` in the
    /// background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        let (tx, state) = watch::channel(InitState::NotStarted);
        tx.send_replace(InitState::Initializing);

        let init_backend = Arc::clone(&backend);
        tokio::spawn(async move {
            match init_backend.initialize().await {
                Ok(()) => tracing::info!("Task storage initialized"),
                // The service stays usable; operations hit a degraded backend
                Err(e) => tracing::error!("Error initializing storage: {}", e),
            }
            tx.send_replace(InitState::Ready);
        });

        Self { backend, state }
    }

    /// Selects the backend for the configured platform and creates the
    /// service over it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &StoreConfig) -> Self {
        let platform = HostPlatform::resolve(config.platform);
        Self::new(select_backend(platform, config))
    }

    /// Loads the config file at `path` and creates the service from it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(path: &Path) -> ConfigResult<Self> {
        let config = StoreConfig::load(path)?;
        Ok(Self::from_config(&config))
    }

    /// Returns the kind of storage in use.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Returns the current setup state.
    pub fn state(&self) -> InitState {
        *self.state.borrow()
    }

    /// Waits until backend setup has finished.
    pub async fn wait_for_initialization(&self) {
        let mut state = self.state.clone();
        if state.wait_for(|s| *s == InitState::Ready).await.is_err() {
            tracing::error!("Storage setup ended without signalling readiness");
        }
    }

    /// Creates an active task and returns the stored record.
    pub async fn add_task(&self, new: NewTask) -> TaskStoreResult<Task> {
        self.wait_for_initialization().await;

        validate_title(&new.title)?;
        let due_date = normalize_date(&new.due_date)?;
        let task = Task::create(new, due_date);

        if let Err(e) = self.backend.insert_task(&task).await {
            tracing::error!("Error adding task: {}", e);
            return Err(e);
        }

        tracing::debug!("Added task {}", task.id);
        Ok(task)
    }

    /// Lists tasks with the given status.
    pub async fn get_tasks(&self, status: TaskStatus) -> Vec<Task> {
        self.wait_for_initialization().await;

        match self.backend.list_tasks(status).await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!("Error getting {} tasks: {}", status, e);
                Vec::new()
            }
        }
    }

    /// Gets a task by ID regardless of its status.
    pub async fn get_task(&self, id: &str) -> Option<Task> {
        self.wait_for_initialization().await;

        match self.backend.get_task(id).await {
            Ok(task) => task,
            Err(e) => {
                tracing::error!("Error getting task {}: {}", id, e);
                None
            }
        }
    }

    /// Overwrites every field of an existing task. Unknown IDs are ignored.
    pub async fn update_task(&self, task: Task) -> TaskStoreResult<()> {
        self.wait_for_initialization().await;

        validate_title(&task.title)?;
        let due_date = normalize_date(&task.due_date)?;
        let task = Task { due_date, ..task };

        if let Err(e) = self.backend.update_task(&task).await {
            tracing::error!("Error updating task: {}", e);
            return Err(e);
        }

        tracing::debug!("Updated task {}", task.id);
        Ok(())
    }

    /// Marks a task as completed.
    pub async fn mark_as_completed(&self, id: &str) -> TaskStoreResult<()> {
        self.set_status(id, TaskStatus::Completed).await
    }

    /// Soft-deletes a task. The record stays listed under
    /// [`TaskStatus::Deleted`].
    pub async fn delete_task(&self, id: &str) -> TaskStoreResult<()> {
        self.set_status(id, TaskStatus::Deleted).await
    }

    async fn set_status(&self, id: &str, status: TaskStatus) -> TaskStoreResult<()> {
        self.wait_for_initialization().await;

        if let Err(e) = self.backend.set_status(id, status).await {
            tracing::error!("Error setting task {} to {}: {}", id, status, e);
            return Err(e);
        }

        tracing::debug!("Set task {} to {}", id, status);
        Ok(())
    }
}

fn validate_title(title: &str) -> TaskStoreResult<()> {
    if title.trim().is_empty() {
        return Err(TaskStoreError::validation("task title must not be empty"));
    }
    Ok(())
}
