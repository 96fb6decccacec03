//! Workflow coordinator: owns the full lifecycle of a workflow from creation
//! to terminal status.
//!
//! Creation validates the request and resolves a template *before* any state
//! is registered, so a failed template lookup never leaves a half-registered
//! `Running` workflow behind. Execution is synchronous within the calling
//! thread: phases run strictly sequentially, and the cooperative pause flag is
//! observed at phase boundaries only.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, info};
use uuid::Uuid;

use drafter_registry::{OperationRegistry, TemplateStore};
use drafter_types::{
    PhaseSummary, RunSummary, WorkflowError, WorkflowOverview, WorkflowState, WorkflowStatus,
    WorkflowTemplate,
};

use crate::phase::run_phase;
use crate::registry::WorkflowRegistry;

/// Parameters for creating and running a workflow.
#[derive(Debug, Clone, Default)]
pub struct CreateWorkflowRequest {
    /// Workflow classification; selects the template. Required.
    pub workflow_type: String,
    /// Project classification; selects a template specialization when one
    /// exists. May be empty.
    pub project_type: String,
    /// Governing building code, seeded into the workflow context.
    pub building_code: String,
    /// Caller-supplied values seeded into the workflow context.
    pub custom_parameters: JsonMap<String, JsonValue>,
}

impl CreateWorkflowRequest {
    /// A request with the given workflow type and everything else empty.
    pub fn new(workflow_type: impl Into<String>) -> Self {
        Self {
            workflow_type: workflow_type.into(),
            ..Self::default()
        }
    }
}

/// Drives workflows phase by phase against the operation catalog and exposes
/// the status/pause/resume control surface.
pub struct WorkflowCoordinator {
    templates: TemplateStore,
    operations: OperationRegistry,
    workflows: Arc<WorkflowRegistry>,
}

impl WorkflowCoordinator {
    /// Creates a coordinator with a fresh workflow registry.
    pub fn new(templates: TemplateStore, operations: OperationRegistry) -> Self {
        Self::with_workflow_registry(templates, operations, Arc::new(WorkflowRegistry::new()))
    }

    /// Creates a coordinator sharing an externally owned workflow registry,
    /// for hosts that serve status queries from elsewhere.
    pub fn with_workflow_registry(
        templates: TemplateStore,
        operations: OperationRegistry,
        workflows: Arc<WorkflowRegistry>,
    ) -> Self {
        Self {
            templates,
            operations,
            workflows,
        }
    }

    /// The shared workflow registry.
    pub fn workflows(&self) -> &Arc<WorkflowRegistry> {
        &self.workflows
    }

    /// The operation catalog this coordinator dispatches against.
    pub fn operations(&self) -> &OperationRegistry {
        &self.operations
    }

    /// Creates a workflow and drives it until every phase completes or a
    /// pause is observed.
    ///
    /// Returns the run rollup; the workflow id inside it keys all subsequent
    /// control operations. Template resolution happens before registration,
    /// so on `TemplateNotFound`/`TemplateParse` the registry is untouched.
    pub fn create_and_run(
        &self,
        request: CreateWorkflowRequest,
    ) -> Result<RunSummary, WorkflowError> {
        if request.workflow_type.trim().is_empty() {
            return Err(WorkflowError::MissingWorkflowType);
        }

        let template = self
            .templates
            .resolve(&request.workflow_type, &request.project_type)?;

        let workflow_id = Uuid::new_v4().to_string();
        info!(
            workflow = %workflow_id,
            workflow_type = %request.workflow_type,
            project_type = %request.project_type,
            template = %template.name,
            "starting workflow"
        );

        let state = WorkflowState::new(
            &workflow_id,
            &request.workflow_type,
            &request.project_type,
            &request.building_code,
            request.custom_parameters,
        );
        let cell = self.workflows.insert(state);

        Ok(self.drive(&workflow_id, &cell, &template))
    }

    /// Re-invokes phase progression for an existing workflow, picking up at
    /// the first unexecuted phase. This is the companion to [`Self::resume`]:
    /// resume clears the pause flag, `run_pending` executes what remains.
    /// On a terminal workflow it re-reports the rollup without executing
    /// anything.
    pub fn run_pending(&self, workflow_id: &str) -> Result<RunSummary, WorkflowError> {
        let cell = self
            .workflows
            .get(workflow_id)
            .ok_or_else(|| WorkflowError::WorkflowNotFound(workflow_id.to_string()))?;

        let (workflow_type, project_type) = {
            let state = cell.lock();
            (state.workflow_type.clone(), state.project_type.clone())
        };
        let template = self.templates.resolve(&workflow_type, &project_type)?;

        Ok(self.drive(workflow_id, &cell, &template))
    }

    /// Point-in-time snapshot of one workflow's full state.
    pub fn status(&self, workflow_id: &str) -> Result<WorkflowState, WorkflowError> {
        self.workflows.snapshot(workflow_id)
    }

    /// Lightweight rows for every live workflow.
    pub fn status_all(&self) -> Vec<WorkflowOverview> {
        self.workflows.overviews()
    }

    /// Requests a cooperative pause; see [`WorkflowRegistry::pause`].
    pub fn pause(&self, workflow_id: &str) -> Result<(), WorkflowError> {
        self.workflows.pause(workflow_id)
    }

    /// Clears a pause; see [`WorkflowRegistry::resume`].
    pub fn resume(&self, workflow_id: &str) -> Result<(), WorkflowError> {
        self.workflows.resume(workflow_id)
    }

    /// Executes phases from the state's cursor until the template is
    /// exhausted or a pause is observed, then settles the status and builds
    /// the rollup.
    fn drive(
        &self,
        workflow_id: &str,
        cell: &Arc<Mutex<WorkflowState>>,
        template: &WorkflowTemplate,
    ) -> RunSummary {
        let mut phases_run: IndexMap<String, PhaseSummary> = IndexMap::new();

        loop {
            // Phase boundary: the only suspension point.
            let phase_index = {
                let mut state = cell.lock();
                if state.is_paused || state.next_phase_index >= template.phases.len() {
                    break;
                }
                let index = state.next_phase_index;
                state.current_phase = template.phases[index].name.clone();
                index
            };

            let phase = &template.phases[phase_index];
            debug!(
                workflow = %workflow_id,
                phase = %phase.name,
                tasks = phase.tasks.len(),
                "executing phase"
            );

            let summary = run_phase(phase, cell, &self.operations);

            let mut state = cell.lock();
            state.next_phase_index = phase_index + 1;
            phases_run.insert(phase.name.clone(), summary);
        }

        let mut state = cell.lock();
        if state.is_paused {
            state.status = WorkflowStatus::Paused;
        } else if state.next_phase_index >= template.phases.len() {
            state.status = if state.failed_tasks.is_empty() {
                WorkflowStatus::CompletedSuccessfully
            } else {
                WorkflowStatus::CompletedWithErrors
            };
        }

        info!(
            workflow = %workflow_id,
            status = %state.status,
            completed = state.completed_tasks.len(),
            failed = state.failed_tasks.len(),
            decisions = state.decisions.len(),
            "workflow run finished"
        );

        RunSummary {
            workflow_id: state.id.clone(),
            status: state.status,
            phases: phases_run,
            completed: state.completed_tasks.len(),
            failed: state.failed_tasks.len(),
            decision_count: state.decisions.len(),
            elapsed_ms: state.runtime().num_milliseconds().max(0) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drafter_registry::EchoOperation;
    use drafter_types::{PhaseDefinition, TaskDefinition};

    fn template(workflow_type: &str, phases: Vec<PhaseDefinition>) -> WorkflowTemplate {
        WorkflowTemplate {
            workflow_type: workflow_type.into(),
            name: workflow_type.into(),
            description: String::new(),
            project_types: Vec::new(),
            estimated_time: None,
            phases,
        }
    }

    fn dispatched(id: &str, method: &str) -> TaskDefinition {
        TaskDefinition {
            id: id.into(),
            description: format!("{id} description"),
            method: method.into(),
            parameters: indexmap::IndexMap::new(),
            autonomous_decision: None,
        }
    }

    fn store_with(template: WorkflowTemplate) -> TemplateStore {
        let mut store = TemplateStore::new();
        store.insert(template);
        store
    }

    #[test]
    fn empty_workflow_type_is_rejected_before_registration() {
        let coordinator =
            WorkflowCoordinator::new(TemplateStore::new(), OperationRegistry::new());

        let error = coordinator
            .create_and_run(CreateWorkflowRequest::new("  "))
            .unwrap_err();

        assert_eq!(error, WorkflowError::MissingWorkflowType);
        assert!(coordinator.workflows().is_empty());
    }

    #[test]
    fn unresolved_template_leaves_registry_untouched() {
        let coordinator =
            WorkflowCoordinator::new(TemplateStore::new(), OperationRegistry::new());

        let error = coordinator
            .create_and_run(CreateWorkflowRequest::new("construction_documents"))
            .unwrap_err();

        assert!(matches!(error, WorkflowError::TemplateNotFound { .. }));
        assert!(coordinator.workflows().is_empty());
    }

    #[test]
    fn clean_run_completes_successfully() {
        let mut operations = OperationRegistry::new();
        operations.register("createSheet", EchoOperation::new("createSheet"));

        let store = store_with(template(
            "permit_set",
            vec![PhaseDefinition {
                name: "Sheets".into(),
                tasks: vec![dispatched("t1", "createSheet")],
            }],
        ));

        let coordinator = WorkflowCoordinator::new(store, operations);
        let summary = coordinator
            .create_and_run(CreateWorkflowRequest::new("permit_set"))
            .expect("run");

        assert_eq!(summary.status, WorkflowStatus::CompletedSuccessfully);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.phases["Sheets"].completed, 1);

        let state = coordinator.status(&summary.workflow_id).expect("status");
        assert_eq!(state.status, WorkflowStatus::CompletedSuccessfully);
        assert!(!state.is_paused);
    }

    #[test]
    fn failed_task_yields_completed_with_errors() {
        let store = store_with(template(
            "permit_set",
            vec![PhaseDefinition {
                name: "Sheets".into(),
                tasks: vec![
                    dispatched("t1", "custom"),
                    dispatched("t2", "doesNotExist"),
                ],
            }],
        ));

        let coordinator = WorkflowCoordinator::new(store, OperationRegistry::new());
        let summary = coordinator
            .create_and_run(CreateWorkflowRequest::new("permit_set"))
            .expect("run");

        assert_eq!(summary.status, WorkflowStatus::CompletedWithErrors);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn run_pending_on_completed_workflow_re_reports_rollup() {
        let store = store_with(template(
            "permit_set",
            vec![PhaseDefinition {
                name: "Sheets".into(),
                tasks: vec![dispatched("t1", "custom")],
            }],
        ));

        let coordinator = WorkflowCoordinator::new(store, OperationRegistry::new());
        let first = coordinator
            .create_and_run(CreateWorkflowRequest::new("permit_set"))
            .expect("run");
        let second = coordinator.run_pending(&first.workflow_id).expect("re-run");

        assert_eq!(second.status, first.status);
        assert_eq!(second.completed, first.completed);
        assert!(second.phases.is_empty());
    }

    #[test]
    fn control_operations_on_unknown_id_fail() {
        let coordinator =
            WorkflowCoordinator::new(TemplateStore::new(), OperationRegistry::new());

        assert!(coordinator.status("missing").is_err());
        assert!(coordinator.pause("missing").is_err());
        assert!(coordinator.resume("missing").is_err());
        assert!(coordinator.run_pending("missing").is_err());
        assert!(coordinator.status_all().is_empty());
    }
}
