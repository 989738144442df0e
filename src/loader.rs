use crate::client::TaskService;
use crate::error::{LoadError, LoadResult};
use crate::models::{AggregateSnapshot, Aggregates, AnalyticsPayload, TaskId};
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

/// Fetches one immutable aggregate snapshot per task
pub struct SnapshotLoader<S> {
    service: S,
}

impl<S: TaskService> SnapshotLoader<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Load the analytics snapshot for a completed task.
    ///
    /// Fails with `TaskNotReady` before touching the analytics endpoint when
    /// the task has not completed. No retries are attempted here.
    pub async fn load(&self, task_id: TaskId) -> LoadResult<AggregateSnapshot> {
        info!("Loading analytics for task {} via {}", task_id, self.service.service_name());

        let task = self
            .service
            .get_task(task_id)
            .await
            .map_err(|source| LoadError::FetchFailed { task_id, source })?;

        if !task.status.is_ready() {
            warn!("Task {} is not completed (status: {})", task_id, task.status);
            return Err(LoadError::TaskNotReady {
                task_id,
                status: task.status,
            });
        }

        let raw = self
            .service
            .get_analytics(task_id)
            .await
            .map_err(|source| LoadError::FetchFailed { task_id, source })?;

        let snapshot = decode_snapshot(task_id, raw)?;
        info!(
            "Loaded task {}: {} listings, {} types, {} locations, {} months",
            task_id,
            snapshot.total_count,
            snapshot.analytics.avg_price_by_type.len(),
            snapshot.analytics.avg_price_by_location.len(),
            snapshot.analytics.listings_by_month.len()
        );

        Ok(snapshot)
    }
}

/// Decode and validate a raw analytics document into a snapshot
pub fn decode_snapshot(task_id: TaskId, raw: serde_json::Value) -> LoadResult<AggregateSnapshot> {
    let malformed = |reason: String| LoadError::Malformed { task_id, reason };

    let payload: AnalyticsPayload =
        serde_json::from_value(raw).map_err(|e| malformed(e.to_string()))?;

    if let Some(reported) = payload.task_id {
        if reported != task_id {
            return Err(malformed(format!("payload belongs to task {}", reported)));
        }
    }

    validate_aggregates(&payload.analytics).map_err(malformed)?;

    Ok(AggregateSnapshot {
        task_id,
        total_count: payload.count,
        analytics: payload.analytics,
        loaded_at: Utc::now(),
    })
}

fn validate_aggregates(analytics: &Aggregates) -> Result<(), String> {
    let prices = analytics
        .avg_price_by_type
        .iter()
        .map(|(k, v)| ("property type", k, v))
        .chain(
            analytics
                .avg_price_by_location
                .iter()
                .map(|(k, v)| ("location", k, v)),
        );

    for (kind, key, price) in prices {
        if !price.is_finite() || *price < 0.0 {
            return Err(format!("invalid average price {} for {} '{}'", price, kind, key));
        }
    }

    for month in analytics.listings_by_month.keys() {
        if !is_month_key(month) {
            return Err(format!("invalid month key '{}'", month));
        }
    }

    Ok(())
}

/// `YYYY-MM`, fixed width, naming a real calendar month
fn is_month_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
        && NaiveDate::parse_from_str(&format!("{}-01", key), "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryTaskService;
    use crate::models::{BedroomBucket, TaskStatus};
    use serde_json::json;

    fn analytics_doc() -> serde_json::Value {
        json!({
            "task_id": 1,
            "count": 16,
            "analytics": {
                "avg_price_by_type": {"House": 500.0, "Condo": 100.0},
                "avg_price_by_location": {"Austin": 320.0},
                "listings_by_month": {"2023-01": 6, "2023-06": 10},
                "bedroom_distribution": {"0": 5, "1": 8, "5+": 3}
            }
        })
    }

    #[tokio::test]
    async fn test_load_returns_snapshot_unchanged() {
        let service = MemoryTaskService::new().with_completed(TaskId(1), "austin", analytics_doc());
        let loader = SnapshotLoader::new(service);

        let snapshot = loader.load(TaskId(1)).await.unwrap();
        assert_eq!(snapshot.task_id, TaskId(1));
        assert_eq!(snapshot.total_count, 16);
        assert_eq!(snapshot.analytics.avg_price_by_type.len(), 2);
        assert_eq!(snapshot.analytics.listings_by_month.get("2023-06"), Some(&10));
        assert_eq!(
            snapshot.analytics.bedroom_distribution.get(&BedroomBucket::Exact(1)),
            Some(&8)
        );
    }

    #[tokio::test]
    async fn test_incomplete_task_is_not_ready() {
        let service = MemoryTaskService::new().with_task(TaskId(2), "slow", TaskStatus::InProgress);
        let loader = SnapshotLoader::new(service);

        match loader.load(TaskId(2)).await {
            Err(LoadError::TaskNotReady { task_id, status }) => {
                assert_eq!(task_id, TaskId(2));
                assert_eq!(status, TaskStatus::InProgress);
            }
            other => panic!("expected TaskNotReady, got {:?}", other),
        }
        assert_eq!(loader.service().analytics_calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_error_is_fetch_failed() {
        let service = MemoryTaskService::new()
            .with_completed(TaskId(3), "flaky", analytics_doc())
            .with_failure(TaskId(3), "connection reset");
        let loader = SnapshotLoader::new(service);

        let err = loader.load(TaskId(3)).await.unwrap_err();
        assert!(matches!(err, LoadError::FetchFailed { .. }));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_unknown_task_is_fetch_failed() {
        let loader = SnapshotLoader::new(MemoryTaskService::new());
        let err = loader.load(TaskId(99)).await.unwrap_err();
        assert!(matches!(err, LoadError::FetchFailed { task_id: TaskId(99), .. }));
    }

    #[test]
    fn test_negative_price_is_malformed() {
        let mut doc = analytics_doc();
        doc["analytics"]["avg_price_by_location"]["Austin"] = json!(-1.0);
        let err = decode_snapshot(TaskId(1), doc).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_bad_month_key_is_malformed() {
        for key in ["2023-1", "2023-13", "23-01-01", "2023/01", "+202-01", "-202-01", "2023-+1"] {
            let mut doc = analytics_doc();
            doc["analytics"]["listings_by_month"] = json!({ key: 1 });
            assert!(
                matches!(decode_snapshot(TaskId(1), doc), Err(LoadError::Malformed { .. })),
                "{} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_zero_padded_month_keys_are_accepted() {
        let mut doc = analytics_doc();
        doc["analytics"]["listings_by_month"] = json!({"0999-12": 1, "2024-02": 3});
        let snapshot = decode_snapshot(TaskId(1), doc).unwrap();
        assert_eq!(
            snapshot.analytics.listings_by_month.keys().collect::<Vec<_>>(),
            vec!["0999-12", "2024-02"]
        );
    }

    #[test]
    fn test_unknown_bedroom_bucket_is_malformed() {
        let mut doc = analytics_doc();
        doc["analytics"]["bedroom_distribution"] = json!({"7": 1});
        assert!(matches!(
            decode_snapshot(TaskId(1), doc),
            Err(LoadError::Malformed { .. })
        ));
    }

    #[test]
    fn test_missing_mapping_is_malformed() {
        let mut doc = analytics_doc();
        doc["analytics"]
            .as_object_mut()
            .unwrap()
            .remove("listings_by_month");
        assert!(matches!(
            decode_snapshot(TaskId(1), doc),
            Err(LoadError::Malformed { .. })
        ));
    }

    #[test]
    fn test_payload_for_other_task_is_malformed() {
        let err = decode_snapshot(TaskId(5), analytics_doc()).unwrap_err();
        assert!(err.to_string().contains("belongs to task 1"));
    }
}
