use crate::{registry::NodeRegistry, store::RunStore, WorkflowExecutor};
use maticore::{EventBus, ExecutionEvent, FlowError, RunId, RunState, StoreError, Workflow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Tokens of an in-flight run.
#[derive(Clone)]
struct ActiveRun {
    /// Set to request cancellation.
    cancel: CancellationToken,
    /// Set once the run is terminal and has left the active map.
    done: CancellationToken,
}

type ActiveRuns = Arc<Mutex<HashMap<RunId, ActiveRun>>>;

/// Removes the run from the active map and signals `done` when dropped, so
/// the tokens are released however the run ends.
struct ActiveRunGuard {
    runs: ActiveRuns,
    run_id: RunId,
    run: ActiveRun,
}

impl Drop for ActiveRunGuard {
    fn drop(&mut self) {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.run_id);
        self.run.done.cancel();
    }
}

/// Main runtime for executing workflows
///
/// Cheap to clone; clones share the registry, store, event bus and the set
/// of active runs.
#[derive(Clone)]
pub struct FlowRuntime {
    registry: Arc<NodeRegistry>,
    store: Arc<dyn RunStore>,
    executor: WorkflowExecutor,
    event_bus: Arc<EventBus>,
    active: ActiveRuns,
}

impl FlowRuntime {
    pub fn new(registry: Arc<NodeRegistry>, store: Arc<dyn RunStore>, config: RuntimeConfig) -> Self {
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));
        let executor = WorkflowExecutor::new(registry.clone(), store.clone(), event_bus.clone());

        Self {
            registry,
            store,
            executor,
            event_bus,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Execute a queued run in place, returning once it is terminal
    ///
    /// Fails up front if the run is already active or its record cannot be
    /// loaded; every other outcome is in the returned state.
    pub async fn start(&self, workflow: &Workflow, run_id: RunId) -> Result<RunState, FlowError> {
        let guard = self.activate(run_id)?;
        let cancel = guard.run.cancel.clone();
        let result = self.executor.execute(workflow, run_id, cancel).await;
        drop(guard);
        result
    }

    /// Execute a queued run on a background task
    ///
    /// The run is registered as active before this returns, so a `cancel`
    /// issued right after is never lost.
    pub fn spawn(
        &self,
        workflow: Workflow,
        run_id: RunId,
    ) -> Result<JoinHandle<Result<RunState, FlowError>>, FlowError> {
        let guard = self.activate(run_id)?;
        let executor = self.executor.clone();

        Ok(tokio::spawn(async move {
            let cancel = guard.run.cancel.clone();
            let result = executor.execute(&workflow, run_id, cancel).await;
            drop(guard);
            result
        }))
    }

    /// Request cancellation and wait until the run is terminal
    ///
    /// Returns `false` without doing anything when no such run is active
    /// (unknown, or already finished). Repeated calls are harmless.
    pub async fn cancel(&self, run_id: RunId) -> bool {
        let run = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&run_id)
            .cloned();

        match run {
            Some(run) => {
                tracing::info!("Cancellation requested for run {}", run_id);
                run.cancel.cancel();
                run.done.cancelled().await;
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, run_id: RunId) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&run_id)
    }

    /// Latest committed snapshot of a run.
    pub fn run_state(&self, run_id: RunId) -> Result<RunState, FlowError> {
        self.store.load(run_id).map_err(|e| match e {
            StoreError::RunNotFound(id) => FlowError::UnknownRun(id),
            other => FlowError::Store(other),
        })
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    fn activate(&self, run_id: RunId) -> Result<ActiveRunGuard, FlowError> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.contains_key(&run_id) {
            return Err(FlowError::RunAlreadyActive(run_id));
        }

        let run = ActiveRun {
            cancel: CancellationToken::new(),
            done: CancellationToken::new(),
        };
        active.insert(run_id, run.clone());

        Ok(ActiveRunGuard {
            runs: self.active.clone(),
            run_id,
            run,
        })
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Capacity of the broadcast channel behind the event bus.
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 1000,
        }
    }
}
