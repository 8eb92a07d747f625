use maticore::{RunId, RunState, StoreError};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

/// Where the orchestrator reads a run from and writes every state change to
///
/// Calls are synchronous: the orchestrator's bookkeeping never suspends, so
/// implementations backed by slow storage should buffer internally.
pub trait RunStore: Send + Sync {
    fn load(&self, run_id: RunId) -> Result<RunState, StoreError>;

    /// Persist a full snapshot of the run.
    fn commit(&self, state: &RunState) -> Result<(), StoreError>;
}

/// Run records kept in process memory
///
/// Rejects commits to runs that already reached a terminal status.
#[derive(Default)]
pub struct InMemoryRunStore {
    runs: RwLock<HashMap<RunId, RunState>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a `queued` record under a fresh id.
    pub fn create_run(&self) -> RunState {
        self.create_run_with_id(Uuid::new_v4())
    }

    /// Create (or reset) a `queued` record under `run_id`.
    pub fn create_run_with_id(&self, run_id: RunId) -> RunState {
        let state = RunState::new(run_id);
        self.runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(run_id, state.clone());
        state
    }

    /// Snapshot of every run record.
    pub fn runs(&self) -> Vec<RunState> {
        self.runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

impl RunStore for InMemoryRunStore {
    fn load(&self, run_id: RunId) -> Result<RunState, StoreError> {
        self.runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&run_id)
            .cloned()
            .ok_or(StoreError::RunNotFound(run_id))
    }

    fn commit(&self, state: &RunState) -> Result<(), StoreError> {
        let mut runs = self.runs.write().unwrap_or_else(PoisonError::into_inner);
        match runs.get(&state.run_id) {
            None => Err(StoreError::RunNotFound(state.run_id)),
            Some(existing) if existing.is_terminal() => Err(StoreError::RunFinalized(state.run_id)),
            Some(_) => {
                runs.insert(state.run_id, state.clone());
                Ok(())
            }
        }
    }
}
