//! Runtime workflow state and the summaries exposed by the control surface.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;

/// Forward-only workflow lifecycle states.
///
/// `Paused` is re-enterable into `Running` via resume; the two completed
/// variants are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Phases are being executed and no pause has been requested.
    Running,
    /// A pause was observed; remaining phases are left unexecuted until resume.
    Paused,
    /// Every phase finished and no task failed.
    CompletedSuccessfully,
    /// Every phase finished but at least one task failed.
    CompletedWithErrors,
}

impl WorkflowStatus {
    /// True for the two completed variants.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::CompletedSuccessfully | Self::CompletedWithErrors)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::CompletedSuccessfully => "Completed successfully",
            Self::CompletedWithErrors => "Completed with errors",
        };
        f.write_str(text)
    }
}

/// Audit record of an autonomous choice attributed to a task's execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowDecision {
    /// Task the decision is attributed to.
    pub task: String,
    /// What was decided.
    pub decision: String,
    /// Why it was decided (usually the template's decision hint).
    pub reason: String,
    /// When the decision was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Mutable state of one running or completed workflow.
///
/// The task lists and decision log are append-only and preserve execution
/// order. `context` is the carry-forward store written by successful tasks and
/// read by later tasks in the same workflow; last write wins, nothing is
/// removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Opaque unique identifier, generated at creation.
    pub id: String,
    /// Workflow classification used to select a template.
    pub workflow_type: String,
    /// Project classification used for template specialization.
    pub project_type: String,
    /// Governing building code recorded for downstream operations.
    pub building_code: String,
    /// Creation timestamp.
    pub start_time: DateTime<Utc>,
    /// Name of the phase currently (or most recently) executing.
    pub current_phase: String,
    /// Index of the next template phase to execute; lets a paused run resume
    /// from the first unexecuted phase.
    pub next_phase_index: usize,
    /// Descriptions of tasks that completed, in execution order.
    pub completed_tasks: Vec<String>,
    /// Descriptions plus error text of tasks that failed, in execution order.
    pub failed_tasks: Vec<String>,
    /// Ordered audit trail of autonomous decisions.
    pub decisions: Vec<WorkflowDecision>,
    /// Carry-forward key-value store (for example, `lastSheetId`).
    pub context: JsonMap<String, JsonValue>,
    /// Cooperative pause flag, observed at phase boundaries only.
    pub is_paused: bool,
    /// Current lifecycle status.
    pub status: WorkflowStatus,
}

impl WorkflowState {
    /// Creates a fresh `Running` state with empty task and decision lists and
    /// a context seeded with the project classification.
    pub fn new(
        id: impl Into<String>,
        workflow_type: impl Into<String>,
        project_type: impl Into<String>,
        building_code: impl Into<String>,
        custom_parameters: JsonMap<String, JsonValue>,
    ) -> Self {
        let project_type = project_type.into();
        let building_code = building_code.into();

        let mut context = JsonMap::new();
        context.insert("projectType".into(), JsonValue::String(project_type.clone()));
        context.insert("buildingCode".into(), JsonValue::String(building_code.clone()));
        for (key, value) in custom_parameters {
            context.insert(key, value);
        }

        Self {
            id: id.into(),
            workflow_type: workflow_type.into(),
            project_type,
            building_code,
            start_time: Utc::now(),
            current_phase: String::new(),
            next_phase_index: 0,
            completed_tasks: Vec::new(),
            failed_tasks: Vec::new(),
            decisions: Vec::new(),
            context,
            is_paused: false,
            status: WorkflowStatus::Running,
        }
    }

    /// Appends a decision record stamped with the current time.
    pub fn record_decision(
        &mut self,
        task: impl Into<String>,
        decision: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.decisions.push(WorkflowDecision {
            task: task.into(),
            decision: decision.into(),
            reason: reason.into(),
            timestamp: Utc::now(),
        });
    }

    /// Wall-clock time since the workflow was created.
    pub fn runtime(&self) -> chrono::Duration {
        Utc::now() - self.start_time
    }
}

/// Lightweight listing row returned when status is queried without an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOverview {
    /// Workflow identifier.
    pub id: String,
    /// Workflow classification.
    pub workflow_type: String,
    /// Current lifecycle status.
    pub status: WorkflowStatus,
    /// Phase currently (or most recently) executing.
    pub current_phase: String,
    /// Number of completed tasks so far.
    pub completed_count: usize,
    /// Number of failed tasks so far.
    pub failed_count: usize,
    /// Seconds since the workflow was created.
    pub runtime_secs: i64,
}

impl From<&WorkflowState> for WorkflowOverview {
    fn from(state: &WorkflowState) -> Self {
        Self {
            id: state.id.clone(),
            workflow_type: state.workflow_type.clone(),
            status: state.status,
            current_phase: state.current_phase.clone(),
            completed_count: state.completed_tasks.len(),
            failed_count: state.failed_tasks.len(),
            runtime_secs: state.runtime().num_seconds(),
        }
    }
}

/// Per-phase task counts recorded under the phase name in a run summary.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseSummary {
    /// Tasks that completed in this phase.
    pub completed: usize,
    /// Tasks that failed in this phase.
    pub failed: usize,
}

/// Rollup returned by create-and-run and by re-invoking phase progression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Identifier of the workflow this summary describes.
    pub workflow_id: String,
    /// Status at the end of this run invocation.
    pub status: WorkflowStatus,
    /// Per-phase task counts for the phases executed by this invocation,
    /// keyed by phase name in execution order.
    pub phases: IndexMap<String, PhaseSummary>,
    /// Total completed task count across the workflow so far.
    pub completed: usize,
    /// Total failed task count across the workflow so far.
    pub failed: usize,
    /// Total number of recorded decisions so far.
    pub decision_count: usize,
    /// Milliseconds since the workflow was created.
    pub elapsed_ms: u64,
}
