//! Errors surfaced synchronously by repository operations.
//!
//! Background jobs never return these to anyone: the scheduler logs and
//! drops them at the job boundary.

use thiserror::Error;

use super::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Malformed create/update payload. Raised before any mutation.
    #[error("invalid payload: {0}")]
    Validation(String),

    /// Unknown task id within the resolved partition.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Attachment index beyond the task's attachment count.
    #[error("attachment index {index} out of range for task {task_id} ({len} attachments)")]
    IndexOutOfRange {
        task_id: TaskId,
        index: usize,
        len: usize,
    },
}

impl TaskError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
