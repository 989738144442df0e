use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of a data-collection task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TaskId)
    }
}

/// Lifecycle status reported by the task service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Analytics exist only for completed tasks
    pub fn is_ready(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Task metadata as returned by `GET /tasks/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: TaskId,
    pub name: String,
    pub status: TaskStatus,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Bedroom-count bucket. `FivePlus` is the catch-all for five or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BedroomBucket {
    Exact(u8),
    FivePlus,
}

impl BedroomBucket {
    pub const FIVE_PLUS_LABEL: &'static str = "5+";

    /// Whether this bucket passes a minimum-bedrooms filter (0 means unrestricted)
    pub fn satisfies(&self, min_bedrooms: u8) -> bool {
        if min_bedrooms == 0 {
            return true;
        }
        match self {
            BedroomBucket::FivePlus => min_bedrooms <= 5,
            BedroomBucket::Exact(n) => *n >= min_bedrooms,
        }
    }
}

impl fmt::Display for BedroomBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BedroomBucket::Exact(n) => write!(f, "{}", n),
            BedroomBucket::FivePlus => f.write_str(Self::FIVE_PLUS_LABEL),
        }
    }
}

impl FromStr for BedroomBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::FIVE_PLUS_LABEL {
            return Ok(BedroomBucket::FivePlus);
        }
        match s.parse::<u8>() {
            Ok(n) if n <= 4 => Ok(BedroomBucket::Exact(n)),
            _ => Err(format!("invalid bedroom bucket '{}'", s)),
        }
    }
}

impl TryFrom<String> for BedroomBucket {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BedroomBucket> for String {
    fn from(bucket: BedroomBucket) -> Self {
        bucket.to_string()
    }
}

/// The four aggregate mappings shared by snapshots and filtered views.
///
/// Keys are kept in ordered maps so month keys iterate chronologically and
/// every derivation is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub avg_price_by_type: BTreeMap<String, f64>,
    pub avg_price_by_location: BTreeMap<String, f64>,
    pub listings_by_month: BTreeMap<String, u64>,
    pub bedroom_distribution: BTreeMap<BedroomBucket, u64>,
}

impl Aggregates {
    /// True when every mapping is empty
    pub fn is_empty(&self) -> bool {
        self.avg_price_by_type.is_empty()
            && self.avg_price_by_location.is_empty()
            && self.listings_by_month.is_empty()
            && self.bedroom_distribution.is_empty()
    }
}

/// Analytics payload as returned by `GET /tasks/{id}/analytics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsPayload {
    #[serde(default)]
    pub task_id: Option<TaskId>,
    pub count: u64,
    pub analytics: Aggregates,
}

/// One immutable load of a completed task's aggregates
#[derive(Debug, Clone, Serialize)]
pub struct AggregateSnapshot {
    pub task_id: TaskId,
    pub total_count: u64,
    pub analytics: Aggregates,
    pub loaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bedroom_bucket_parsing() {
        assert_eq!("0".parse::<BedroomBucket>(), Ok(BedroomBucket::Exact(0)));
        assert_eq!("4".parse::<BedroomBucket>(), Ok(BedroomBucket::Exact(4)));
        assert_eq!("5+".parse::<BedroomBucket>(), Ok(BedroomBucket::FivePlus));
        assert!("5".parse::<BedroomBucket>().is_err());
        assert!("-1".parse::<BedroomBucket>().is_err());
        assert!("studio".parse::<BedroomBucket>().is_err());
    }

    #[test]
    fn test_bedroom_buckets_order_with_sentinel_last() {
        let mut buckets = vec![
            BedroomBucket::FivePlus,
            BedroomBucket::Exact(3),
            BedroomBucket::Exact(0),
        ];
        buckets.sort();
        assert_eq!(
            buckets,
            vec![
                BedroomBucket::Exact(0),
                BedroomBucket::Exact(3),
                BedroomBucket::FivePlus
            ]
        );
    }

    #[test]
    fn test_bucket_satisfies_min_bedrooms() {
        assert!(BedroomBucket::Exact(0).satisfies(0));
        assert!(!BedroomBucket::Exact(1).satisfies(2));
        assert!(BedroomBucket::Exact(3).satisfies(3));
        assert!(BedroomBucket::FivePlus.satisfies(5));
        assert!(!BedroomBucket::Exact(4).satisfies(5));
    }

    #[test]
    fn test_payload_decodes_string_bucket_keys() {
        let raw = r#"{
            "task_id": 7,
            "count": 16,
            "analytics": {
                "avg_price_by_type": {"House": 450000.0},
                "avg_price_by_location": {"Austin": 390000.5},
                "listings_by_month": {"2023-01": 4},
                "bedroom_distribution": {"0": 5, "1": 8, "5+": 3}
            }
        }"#;
        let payload: AnalyticsPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.task_id, Some(TaskId(7)));
        assert_eq!(payload.count, 16);
        assert_eq!(
            payload.analytics.bedroom_distribution.get(&BedroomBucket::FivePlus),
            Some(&3)
        );
    }

    #[test]
    fn test_negative_count_is_rejected_by_decoding() {
        let raw = r#"{
            "count": 1,
            "analytics": {
                "avg_price_by_type": {},
                "avg_price_by_location": {},
                "listings_by_month": {"2023-01": -4},
                "bedroom_distribution": {}
            }
        }"#;
        assert!(serde_json::from_str::<AnalyticsPayload>(raw).is_err());
    }

    #[test]
    fn test_unrecognised_status_is_unknown() {
        let raw = r#"{"id": 3, "name": "n", "status": "archived", "created_at": "2024-01-01T00:00:00"}"#;
        let task: TaskResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(task.status, TaskStatus::Unknown);
        assert!(!task.status.is_ready());
    }
}
