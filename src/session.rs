use crate::client::TaskService;
use crate::engine::{self, CriterionUpdate, FilterCriteria, FilterOptions, FilteredView};
use crate::error::LoadResult;
use crate::loader::SnapshotLoader;
use crate::models::{AggregateSnapshot, TaskId};
use tracing::{debug, info, warn};

/// Identifies one in-flight load. Results carrying a superseded ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub task_id: TaskId,
    generation: u64,
}

/// What happened to a completed load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The snapshot replaced the current one and defaults were applied
    Applied,
    /// The load was superseded or abandoned; nothing changed
    Stale,
    /// The load failed; any previously loaded snapshot is still in place
    Failed(String),
}

/// A loaded snapshot with its current criteria and derived view
#[derive(Debug, Clone)]
pub struct LoadedView {
    pub snapshot: AggregateSnapshot,
    pub options: FilterOptions,
    pub criteria: FilterCriteria,
    pub view: FilteredView,
}

impl LoadedView {
    fn new(snapshot: AggregateSnapshot) -> Self {
        let criteria = engine::initialize_defaults(&snapshot);
        let view = engine::apply(&snapshot, &criteria);
        Self {
            options: FilterOptions::from_snapshot(&snapshot),
            snapshot,
            criteria,
            view,
        }
    }

    /// Replace criteria and view together
    fn replace_criteria(&mut self, criteria: FilterCriteria) {
        self.view = engine::apply(&self.snapshot, &criteria);
        self.criteria = criteria;
    }
}

/// State of one analytics view across task selections
#[derive(Debug, Default)]
pub struct AnalyticsSession {
    generation: u64,
    pending: Option<LoadTicket>,
    current: Option<LoadedView>,
    last_error: Option<String>,
}

impl AnalyticsSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a snapshot has been loaded
    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&LoadedView> {
        self.current.as_ref()
    }

    pub fn snapshot(&self) -> Option<&AggregateSnapshot> {
        self.current.as_ref().map(|c| &c.snapshot)
    }

    pub fn criteria(&self) -> Option<&FilterCriteria> {
        self.current.as_ref().map(|c| &c.criteria)
    }

    pub fn view(&self) -> Option<&FilteredView> {
        self.current.as_ref().map(|c| &c.view)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn pending(&self) -> Option<LoadTicket> {
        self.pending
    }

    /// Start a load for a task, superseding any load still in flight
    pub fn begin_load(&mut self, task_id: TaskId) -> LoadTicket {
        self.generation += 1;
        let ticket = LoadTicket {
            task_id,
            generation: self.generation,
        };
        if let Some(previous) = self.pending.replace(ticket) {
            debug!("Load for task {} superseded by task {}", previous.task_id, task_id);
        }
        ticket
    }

    /// Drop the pending load, if any; its result will be discarded
    pub fn abandon(&mut self) {
        if let Some(ticket) = self.pending.take() {
            debug!("Abandoned load for task {}", ticket.task_id);
        }
    }

    /// Apply the result of a load started with `begin_load`
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: LoadResult<AggregateSnapshot>,
    ) -> LoadOutcome {
        if self.pending != Some(ticket) {
            warn!("Discarding stale load result for task {}", ticket.task_id);
            return LoadOutcome::Stale;
        }
        self.pending = None;

        match result {
            Ok(snapshot) if snapshot.task_id != ticket.task_id => {
                let message = format!(
                    "received snapshot for task {} while loading task {}",
                    snapshot.task_id, ticket.task_id
                );
                warn!("{}", message);
                self.last_error = Some(message.clone());
                LoadOutcome::Failed(message)
            }
            Ok(snapshot) => {
                info!("Applying snapshot for task {}", snapshot.task_id);
                self.current = Some(LoadedView::new(snapshot));
                self.last_error = None;
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!("Load failed: {}", e);
                let message = e.to_string();
                self.last_error = Some(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Begin, fetch and complete a load in one step
    pub async fn load<S: TaskService>(
        &mut self,
        loader: &SnapshotLoader<S>,
        task_id: TaskId,
    ) -> LoadOutcome {
        let ticket = self.begin_load(task_id);
        let result = loader.load(task_id).await;
        self.complete_load(ticket, result)
    }

    /// Change one criterion and rederive the view. No-op until a snapshot is loaded.
    pub fn update(&mut self, update: CriterionUpdate) -> Option<&FilteredView> {
        let current = self.current.as_mut()?;
        let criteria = engine::set_criterion(&current.criteria, update);
        current.replace_criteria(criteria);
        Some(&current.view)
    }

    /// Restore default criteria for the loaded snapshot
    pub fn reset(&mut self) -> Option<&FilteredView> {
        let current = self.current.as_mut()?;
        let criteria = engine::reset(&current.snapshot);
        current.replace_criteria(criteria);
        Some(&current.view)
    }
}
