//! Process-wide table of live workflow states.
//!
//! The registry is an explicitly constructed, injected store — never a
//! language-level static — so lifetime and test isolation stay controllable.
//! It is the component consulted by the status, pause, and resume entry
//! points; mutations to a given workflow's state happen under that workflow's
//! own mutex, so concurrent status queries never observe partial updates.
//!
//! Retention: completed workflows stay registered for the process lifetime.
//! Hosts that poll results and want to reclaim memory call [`WorkflowRegistry::remove`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use drafter_types::{WorkflowError, WorkflowOverview, WorkflowState, WorkflowStatus};

/// Concurrency-safe map of workflow id to live state.
#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    workflows: RwLock<HashMap<String, Arc<Mutex<WorkflowState>>>>,
}

impl WorkflowRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly created state, returning the shared cell the
    /// coordinator drives. The workflow is visible to concurrent status
    /// queries from this point on.
    pub(crate) fn insert(&self, state: WorkflowState) -> Arc<Mutex<WorkflowState>> {
        let id = state.id.clone();
        let cell = Arc::new(Mutex::new(state));
        self.workflows.write().insert(id, Arc::clone(&cell));
        cell
    }

    /// Shared cell for a live workflow, if registered.
    pub(crate) fn get(&self, workflow_id: &str) -> Option<Arc<Mutex<WorkflowState>>> {
        self.workflows.read().get(workflow_id).cloned()
    }

    /// Point-in-time copy of a workflow's full state.
    pub fn snapshot(&self, workflow_id: &str) -> Result<WorkflowState, WorkflowError> {
        let cell = self
            .get(workflow_id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(workflow_id.to_string()))?;
        let state = cell.lock();
        Ok(state.clone())
    }

    /// Lightweight rows for every registered workflow, in no particular order.
    pub fn overviews(&self) -> Vec<WorkflowOverview> {
        let workflows = self.workflows.read();
        workflows
            .values()
            .map(|cell| WorkflowOverview::from(&*cell.lock()))
            .collect()
    }

    /// Sets the pause flag and status together. Observed cooperatively at the
    /// next phase boundary; a task already in flight is not interrupted.
    /// Pausing a terminal workflow is a no-op.
    pub fn pause(&self, workflow_id: &str) -> Result<(), WorkflowError> {
        let cell = self
            .get(workflow_id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(workflow_id.to_string()))?;
        let mut state = cell.lock();
        if !state.status.is_terminal() {
            state.is_paused = true;
            state.status = WorkflowStatus::Paused;
            debug!(workflow = %workflow_id, "pause requested");
        }
        Ok(())
    }

    /// Clears the pause flag and returns the workflow to `Running`. A no-op
    /// when the workflow is not paused.
    pub fn resume(&self, workflow_id: &str) -> Result<(), WorkflowError> {
        let cell = self
            .get(workflow_id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(workflow_id.to_string()))?;
        let mut state = cell.lock();
        if state.is_paused {
            state.is_paused = false;
            state.status = WorkflowStatus::Running;
            debug!(workflow = %workflow_id, "resume requested");
        }
        Ok(())
    }

    /// Drops a workflow from the registry, returning its final state.
    pub fn remove(&self, workflow_id: &str) -> Result<WorkflowState, WorkflowError> {
        let cell = self
            .workflows
            .write()
            .remove(workflow_id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(workflow_id.to_string()))?;
        let state = cell.lock();
        Ok(state.clone())
    }

    /// Number of registered workflows.
    pub fn len(&self) -> usize {
        self.workflows.read().len()
    }

    /// True when no workflow is registered.
    pub fn is_empty(&self) -> bool {
        self.workflows.read().is_empty()
    }
}
