use crate::client::traits::TaskService;
use crate::client::types::ClientConfig;
use crate::models::{TaskId, TaskResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP implementation of the task service
pub struct HttpTaskService {
    client: Client,
    config: ClientConfig,
}

impl HttpTaskService {
    /// Create a client with settings taken from the environment
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::from_env())
    }

    /// Create a client with explicit settings
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        if !response.status().is_success() {
            warn!("{} returned status: {}", url, response.status());
            anyhow::bail!("{} returned status {}", url, response.status());
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Unexpected response from {}", url))
    }
}

#[async_trait]
impl TaskService for HttpTaskService {
    async fn get_task(&self, task_id: TaskId) -> Result<TaskResponse> {
        self.get_json(&self.config.task_url(task_id)).await
    }

    async fn get_analytics(&self, task_id: TaskId) -> Result<serde_json::Value> {
        self.get_json(&self.config.analytics_url(task_id)).await
    }

    fn service_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its base URL
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}", addr)
    }

    fn service_for(base_url: String) -> HttpTaskService {
        HttpTaskService::with_config(ClientConfig::default().with_base_url(base_url)).unwrap()
    }

    #[tokio::test]
    async fn test_get_task_decodes_json_body() {
        let base = serve_once(
            "200 OK",
            r#"{"id": 4, "name": "austin", "status": "completed", "created_at": "2024-01-01T00:00:00"}"#,
        )
        .await;

        let task = service_for(base).get_task(TaskId(4)).await.unwrap();
        assert_eq!(task.id, TaskId(4));
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_get_analytics_returns_raw_document() {
        let base = serve_once("200 OK", r#"{"count": 0, "analytics": {}}"#).await;

        let raw = service_for(base).get_analytics(TaskId(4)).await.unwrap();
        assert_eq!(raw["count"], 0);
    }

    #[tokio::test]
    async fn test_error_status_fails() {
        let base = serve_once("503 Service Unavailable", "{}").await;

        let err = service_for(base).get_task(TaskId(4)).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_non_json_body_fails() {
        let base = serve_once("200 OK", "not json").await;

        let err = service_for(base).get_task(TaskId(4)).await.unwrap_err();
        assert!(err.to_string().contains("Unexpected response"));
    }
}
