use crate::client::traits::TaskService;
use crate::models::{TaskId, TaskResponse, TaskStatus};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory task service, used for offline runs and tests
#[derive(Default)]
pub struct MemoryTaskService {
    tasks: HashMap<TaskId, TaskResponse>,
    analytics: HashMap<TaskId, serde_json::Value>,
    failures: HashMap<TaskId, String>,
    analytics_calls: AtomicUsize,
}

impl MemoryTaskService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task with the given status and no analytics
    pub fn with_task(mut self, task_id: TaskId, name: &str, status: TaskStatus) -> Self {
        self.tasks.insert(
            task_id,
            TaskResponse {
                id: task_id,
                name: name.to_string(),
                status,
                created_at: "2024-01-01T00:00:00".to_string(),
                completed_at: None,
            },
        );
        self
    }

    /// Register a completed task together with its analytics document
    pub fn with_completed(mut self, task_id: TaskId, name: &str, analytics: serde_json::Value) -> Self {
        self = self.with_task(task_id, name, TaskStatus::Completed);
        self.analytics.insert(task_id, analytics);
        self
    }

    /// Make analytics retrieval for a task fail with the given message
    pub fn with_failure(mut self, task_id: TaskId, message: &str) -> Self {
        self.failures.insert(task_id, message.to_string());
        self
    }

    /// Number of analytics requests served so far
    pub fn analytics_calls(&self) -> usize {
        self.analytics_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskService for MemoryTaskService {
    async fn get_task(&self, task_id: TaskId) -> Result<TaskResponse> {
        self.tasks
            .get(&task_id)
            .cloned()
            .ok_or_else(|| anyhow!("task {} not found", task_id))
    }

    async fn get_analytics(&self, task_id: TaskId) -> Result<serde_json::Value> {
        self.analytics_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.failures.get(&task_id) {
            return Err(anyhow!("{}", message));
        }

        self.analytics
            .get(&task_id)
            .cloned()
            .ok_or_else(|| anyhow!("no analytics stored for task {}", task_id))
    }

    fn service_name(&self) -> &'static str {
        "memory"
    }
}
