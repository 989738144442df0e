use crate::models::{TaskId, TaskStatus};
use thiserror::Error;

/// Result type alias for snapshot loading
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Failures confined to the snapshot loader boundary
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("task {task_id} is not ready yet (status: {status})")]
    TaskNotReady { task_id: TaskId, status: TaskStatus },

    #[error("failed to fetch analytics for task {task_id}: {source:#}")]
    FetchFailed {
        task_id: TaskId,
        #[source]
        source: anyhow::Error,
    },

    #[error("malformed analytics for task {task_id}: {reason}")]
    Malformed { task_id: TaskId, reason: String },
}

impl LoadError {
    pub fn task_id(&self) -> TaskId {
        match self {
            LoadError::TaskNotReady { task_id, .. }
            | LoadError::FetchFailed { task_id, .. }
            | LoadError::Malformed { task_id, .. } => *task_id,
        }
    }

    /// Whether retrying the load later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            // A failed task never produces analytics
            LoadError::TaskNotReady { status, .. } => *status != TaskStatus::Failed,
            LoadError::FetchFailed { .. } => true,
            LoadError::Malformed { .. } => false,
        }
    }
}
