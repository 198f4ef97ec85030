//! Task entity definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a Task.
///
/// Removal is a status, not a row deletion: a `Deleted` task is still stored
/// and can be listed under its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Open task, shown in the main list.
    #[default]
    Active,
    /// Finished by the user.
    Completed,
    /// Soft-deleted. Terminal.
    Deleted,
}

impl TaskStatus {
    /// Converts the status to a string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Deleted => "deleted",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted task.
///
/// Field names serialize to the stored column names, so the same shape is
/// used for SQL rows and for the flat JSON collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned at creation.
    pub id: String,
    /// Task title.
    pub title: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional category label.
    #[serde(default)]
    pub category: Option<String>,
    /// Optional priority label.
    #[serde(default)]
    pub priority: Option<String>,
    /// Due date as a normalized ISO-8601 UTC instant.
    #[serde(rename = "dueDate")]
    pub due_date: String,
    /// Current status.
    pub status: TaskStatus,
}

impl Task {
    /// Builds an active task from user input.
    ///
    /// `due_date` must already be normalized by the caller.
    pub fn create(new: NewTask, due_date: impl Into<String>) -> Self {
        Self {
            id: Self::generate_id(),
            title: new.title,
            description: new.description,
            category: new.category,
            priority: new.priority,
            due_date: due_date.into(),
            status: TaskStatus::Active,
        }
    }

    /// Generates a time-ordered identifier.
    ///
    /// UUIDv7 embeds a millisecond timestamp and a per-process counter, so ids
    /// sort by creation time and stay unique when several tasks are created
    /// within the same millisecond.
    pub fn generate_id() -> String {
        Uuid::now_v7().to_string()
    }
}

/// Task fields supplied by the user when creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Task title.
    pub title: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional category label.
    #[serde(default)]
    pub category: Option<String>,
    /// Optional priority label.
    #[serde(default)]
    pub priority: Option<String>,
    /// Due date in any accepted date format.
    #[serde(rename = "dueDate")]
    pub due_date: String,
}

impl NewTask {
    /// Creates task input with the required fields.
    pub fn new(title: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            due_date: due_date.into(),
            ..Default::default()
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }
}
