//! Task execution: dispatches one task definition against the operation
//! catalog and folds its effect into the workflow state.
//!
//! A task resolves to exactly one of two outcomes: recorded success
//! (optionally with a decision) or recorded failure (with an error string).
//! There is no skip outcome, and no failure here ever unwinds the phase loop.

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, warn};

use drafter_registry::OperationRegistry;
use drafter_types::{TaskDefinition, WorkflowState};

/// Parameter names eligible for implicit context injection, paired with the
/// context key holding the most recent value. A task that does not set one of
/// these parameters explicitly consumes the output of the last task that
/// produced it.
pub const INJECTED_PARAMETERS: &[(&str, &str)] = &[
    ("scheduleId", "lastScheduleId"),
    ("sheetId", "lastSheetId"),
    ("viewId", "lastViewId"),
];

/// Decision text recorded for undispatched custom tasks.
pub const CUSTOM_TASK_DECISION: &str = "Custom task - marked for future implementation";

/// Reason recorded when a custom task carries no decision hint.
pub const DEFAULT_DECISION_REASON: &str = "No decision hint provided";

/// An autonomous decision attributed to a task, recorded into the audit trail
/// when the outcome is folded into the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionNote {
    /// What was decided.
    pub decision: String,
    /// Why (the template's hint, or the defined default).
    pub reason: String,
}

/// Effect of executing one task, not yet applied to the workflow state.
///
/// Keeping dispatch separate from state mutation lets the phase executor run
/// the (potentially long) operation outside the state lock and then apply the
/// whole effect as one coherent step.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// Whether the task succeeded.
    pub success: bool,
    /// Decision to append to the audit trail, if any.
    pub decision: Option<DecisionNote>,
    /// Error text when the task failed.
    pub error: Option<String>,
    /// Well-known output fields to write into the workflow context.
    pub context_updates: JsonMap<String, JsonValue>,
}

impl TaskOutcome {
    fn succeeded() -> Self {
        Self {
            success: true,
            decision: None,
            error: None,
            context_updates: JsonMap::new(),
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            decision: None,
            error: Some(error.into()),
            context_updates: JsonMap::new(),
        }
    }
}

/// Executes one task definition against the operation catalog.
///
/// `context` is a snapshot of the workflow's carry-forward store taken at the
/// task boundary; it feeds parameter injection but is not mutated here.
pub fn execute_task(
    task: &TaskDefinition,
    context: &JsonMap<String, JsonValue>,
    operations: &OperationRegistry,
) -> TaskOutcome {
    // Custom tasks are deliberate placeholders: never dispatched, always
    // successful, always audited.
    if task.is_custom() {
        debug!(task = %task.id, "custom task recorded without dispatch");
        let mut outcome = TaskOutcome::succeeded();
        outcome.decision = Some(DecisionNote {
            decision: CUSTOM_TASK_DECISION.to_string(),
            reason: task
                .autonomous_decision
                .clone()
                .unwrap_or_else(|| DEFAULT_DECISION_REASON.to_string()),
        });
        return outcome;
    }

    let parameters = effective_parameters(task, context);

    let Some(operation) = operations.get(&task.method) else {
        warn!(task = %task.id, method = %task.method, "no operation registered for method");
        return TaskOutcome::failed(format!(
            "Method '{}' not implemented in workflow routing",
            task.method
        ));
    };

    debug!(task = %task.id, method = %task.method, parameter_count = parameters.len(), "dispatching operation");

    let result = match operation.invoke(&parameters) {
        Ok(result) => result,
        // A fault during dispatch is a task failure, never a phase abort.
        Err(fault) => return TaskOutcome::failed(fault.to_string()),
    };

    if !result.success {
        let error = result
            .error
            .unwrap_or_else(|| "operation reported failure".to_string());
        return TaskOutcome::failed(error);
    }

    let mut outcome = TaskOutcome::succeeded();
    for (field, context_key) in INJECTED_PARAMETERS {
        if let Some(value) = result.field(field) {
            outcome
                .context_updates
                .insert((*context_key).to_string(), value.clone());
        }
    }
    if let Some(hint) = &task.autonomous_decision {
        outcome.decision = Some(DecisionNote {
            decision: format!("Executed {} successfully", task.method),
            reason: hint.clone(),
        });
    }

    outcome
}

/// Folds a task outcome into the workflow state as one coherent step: task
/// lists, decision log, and context updates move together so a concurrent
/// status query never observes a partial update.
pub fn apply_outcome(state: &mut WorkflowState, task: &TaskDefinition, outcome: &TaskOutcome) {
    if outcome.success {
        state.completed_tasks.push(task.display_name().to_string());
        for (key, value) in &outcome.context_updates {
            state.context.insert(key.clone(), value.clone());
        }
    } else {
        let error = outcome.error.as_deref().unwrap_or("unknown error");
        state
            .failed_tasks
            .push(format!("{}: {}", task.display_name(), error));
    }

    if let Some(note) = &outcome.decision {
        state.record_decision(&task.id, &note.decision, &note.reason);
    }
}

/// The task's own parameters plus injected context values for the well-known
/// names the task left unset. Explicit parameters always win.
fn effective_parameters(
    task: &TaskDefinition,
    context: &JsonMap<String, JsonValue>,
) -> JsonMap<String, JsonValue> {
    let mut parameters = JsonMap::new();
    for (key, value) in &task.parameters {
        parameters.insert(key.clone(), value.clone());
    }

    for (parameter, context_key) in INJECTED_PARAMETERS {
        if parameters.contains_key(*parameter) {
            continue;
        }
        if let Some(value) = context.get(*context_key) {
            debug!(task = %task.id, parameter, "injecting context value");
            parameters.insert((*parameter).to_string(), value.clone());
        }
    }

    parameters
}

#[cfg(test)]
mod tests {
    use super::*;
    use drafter_types::OperationResult;
    use indexmap::IndexMap;
    use serde_json::json;

    fn task(method: &str) -> TaskDefinition {
        TaskDefinition {
            id: "t1".into(),
            description: "test task".into(),
            method: method.into(),
            parameters: IndexMap::new(),
            autonomous_decision: None,
        }
    }

    fn registry_with_echo(name: &str) -> OperationRegistry {
        let mut operations = OperationRegistry::new();
        operations.register(name, drafter_registry::EchoOperation::new(name));
        operations
    }

    #[test]
    fn custom_task_succeeds_with_placeholder_decision() {
        let mut custom = task("custom");
        custom.autonomous_decision = Some("pick default title block".into());

        let outcome = execute_task(&custom, &JsonMap::new(), &OperationRegistry::new());

        assert!(outcome.success);
        let note = outcome.decision.expect("decision recorded");
        assert_eq!(note.decision, CUSTOM_TASK_DECISION);
        assert_eq!(note.reason, "pick default title block");
    }

    #[test]
    fn custom_task_without_hint_uses_default_reason() {
        let outcome = execute_task(&task(""), &JsonMap::new(), &OperationRegistry::new());
        assert!(outcome.success);
        assert_eq!(
            outcome.decision.expect("decision").reason,
            DEFAULT_DECISION_REASON
        );
    }

    #[test]
    fn unknown_method_fails_with_routing_error() {
        let outcome = execute_task(
            &task("doesNotExist"),
            &JsonMap::new(),
            &OperationRegistry::new(),
        );
        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Method 'doesNotExist' not implemented in workflow routing")
        );
    }

    #[test]
    fn dispatch_is_case_insensitive() {
        let operations = registry_with_echo("createSheet");
        let outcome = execute_task(&task("CREATESHEET"), &JsonMap::new(), &operations);
        assert!(outcome.success);
    }

    #[test]
    fn context_values_inject_when_parameter_unset() {
        let mut operations = OperationRegistry::new();
        operations.register("placeViews", |params: &JsonMap<String, JsonValue>| {
            // Surface the parameters so the test can assert on injection.
            Ok(OperationResult::ok().with("received", JsonValue::Object(params.clone())))
        });

        let mut context = JsonMap::new();
        context.insert("lastSheetId".into(), json!(42));

        let outcome = execute_task(&task("placeViews"), &context, &operations);
        assert!(outcome.success);
        // The echo payload is opaque data, not a well-known field, so nothing
        // lands in context updates; injection is verified through effective
        // parameters below.
        let parameters = effective_parameters(&task("placeViews"), &context);
        assert_eq!(parameters.get("sheetId"), Some(&json!(42)));
    }

    #[test]
    fn explicit_parameter_overrides_injected_value() {
        let mut explicit = task("placeViews");
        explicit.parameters.insert("sheetId".into(), json!(9));

        let mut context = JsonMap::new();
        context.insert("lastSheetId".into(), json!(42));

        let parameters = effective_parameters(&explicit, &context);
        assert_eq!(parameters.get("sheetId"), Some(&json!(9)));
    }

    #[test]
    fn well_known_outputs_become_context_updates() {
        let mut operations = OperationRegistry::new();
        operations.register("createSheet", |_: &JsonMap<String, JsonValue>| {
            Ok(OperationResult::ok().with("sheetId", 7).with("viewId", 3))
        });

        let outcome = execute_task(&task("createSheet"), &JsonMap::new(), &operations);
        assert!(outcome.success);
        assert_eq!(outcome.context_updates.get("lastSheetId"), Some(&json!(7)));
        assert_eq!(outcome.context_updates.get("lastViewId"), Some(&json!(3)));
        assert!(!outcome.context_updates.contains_key("lastScheduleId"));
    }

    #[test]
    fn operation_fault_is_a_task_failure() {
        let mut operations = OperationRegistry::new();
        operations.register("runGapAnalysis", |_: &JsonMap<String, JsonValue>| {
            anyhow::bail!("geometry cache unavailable")
        });

        let outcome = execute_task(&task("runGapAnalysis"), &JsonMap::new(), &operations);
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("geometry cache unavailable"));
    }

    #[test]
    fn reported_failure_carries_operation_error() {
        let mut operations = OperationRegistry::new();
        operations.register("createSheet", |_: &JsonMap<String, JsonValue>| {
            Ok(OperationResult::fail("sheet number already in use"))
        });

        let outcome = execute_task(&task("createSheet"), &JsonMap::new(), &operations);
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("sheet number already in use"));
    }

    #[test]
    fn successful_dispatch_with_hint_records_decision() {
        let operations = registry_with_echo("createSheet");
        let mut hinted = task("createSheet");
        hinted.autonomous_decision = Some("number cover sheet A-000".into());

        let outcome = execute_task(&hinted, &JsonMap::new(), &operations);
        let note = outcome.decision.expect("decision");
        assert_eq!(note.decision, "Executed createSheet successfully");
        assert_eq!(note.reason, "number cover sheet A-000");
    }

    #[test]
    fn apply_outcome_moves_everything_together() {
        let mut state = WorkflowState::new("wf", "t", "", "", JsonMap::new());
        let mut operations = OperationRegistry::new();
        operations.register("createSheet", |_: &JsonMap<String, JsonValue>| {
            Ok(OperationResult::ok().with("sheetId", 7))
        });
        let mut hinted = task("createSheet");
        hinted.autonomous_decision = Some("hint".into());

        let outcome = execute_task(&hinted, &JsonMap::new(), &operations);
        apply_outcome(&mut state, &hinted, &outcome);

        assert_eq!(state.completed_tasks, vec!["test task"]);
        assert!(state.failed_tasks.is_empty());
        assert_eq!(state.context.get("lastSheetId"), Some(&json!(7)));
        assert_eq!(state.decisions.len(), 1);
        assert_eq!(state.decisions[0].task, "t1");
    }

    #[test]
    fn apply_outcome_records_failure_with_error_text() {
        let mut state = WorkflowState::new("wf", "t", "", "", JsonMap::new());
        let failing = task("doesNotExist");

        let outcome = execute_task(&failing, &JsonMap::new(), &OperationRegistry::new());
        apply_outcome(&mut state, &failing, &outcome);

        assert!(state.completed_tasks.is_empty());
        assert_eq!(state.failed_tasks.len(), 1);
        assert!(state.failed_tasks[0].contains("doesNotExist"));
    }
}
