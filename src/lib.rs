//! Filtering and aggregation views over the analytics of a completed
//! property-listing task.
//!
//! [`loader::SnapshotLoader`] fetches one immutable snapshot from the task
//! service; [`engine`] derives filtered views from it; [`session`] ties the
//! two together for a consumer that switches between tasks.

pub mod client;
pub mod engine;
pub mod error;
pub mod loader;
pub mod models;
pub mod session;

pub use client::{ClientConfig, HttpTaskService, MemoryTaskService, TaskService};
pub use engine::{apply, initialize_defaults, reset, set_criterion, CriterionUpdate, FilterCriteria, FilteredView};
pub use error::LoadError;
pub use loader::SnapshotLoader;
pub use models::{AggregateSnapshot, Aggregates, BedroomBucket, TaskId, TaskStatus};
pub use session::{AnalyticsSession, LoadOutcome};
