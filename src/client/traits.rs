use crate::models::{TaskId, TaskResponse};
use anyhow::Result;
use async_trait::async_trait;

/// Read-only access to the external Task/Analytics service
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Fetch task metadata, including its lifecycle status
    async fn get_task(&self, task_id: TaskId) -> Result<TaskResponse>;

    /// Fetch the raw analytics document for a completed task.
    ///
    /// Decoding is left to the loader so that a well-delivered but malformed
    /// document is distinguishable from a transport failure.
    async fn get_analytics(&self, task_id: TaskId) -> Result<serde_json::Value>;

    /// Name used in log output
    fn service_name(&self) -> &'static str;
}
