//! Task store error types.

use thiserror::Error;

/// Errors that can occur during task store operations.
#[derive(Debug, Error)]
pub enum TaskStoreError {
    /// Due date could not be parsed.
    #[error("Invalid date: {0:?}")]
    InvalidDate(String),

    /// Task input rejected before reaching storage.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backend setup failed.
    #[error("Backend initialization failed: {0}")]
    BackendInit(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Key-value storage I/O error.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TaskStoreError {
    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        Self::InvalidDate(input.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns true if the error came from the storage engine rather than
    /// from the caller's input.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::BackendInit(_) | Self::Database(_) | Self::Storage(_) | Self::Serialization(_)
        )
    }
}

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;
