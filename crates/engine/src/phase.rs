//! Phase execution: drives one phase's task list sequentially and aggregates
//! per-phase counts.
//!
//! Pause is cooperative and phase-granular: the coordinator checks the pause
//! flag at phase boundaries, so once a phase starts its tasks run to
//! completion. A phase with zero tasks is valid and contributes zero to both
//! counts.

use parking_lot::Mutex;
use tracing::debug;

use drafter_registry::OperationRegistry;
use drafter_types::{PhaseDefinition, PhaseSummary, WorkflowState};

use crate::task::{apply_outcome, execute_task};

/// Executes every task of `phase` in declared order.
///
/// The state lock is held only at task boundaries: the context snapshot is
/// taken under the lock, the operation runs outside it, and the outcome is
/// folded back in as one coherent step.
pub(crate) fn run_phase(
    phase: &PhaseDefinition,
    state_cell: &Mutex<WorkflowState>,
    operations: &OperationRegistry,
) -> PhaseSummary {
    let mut summary = PhaseSummary::default();

    for task in &phase.tasks {
        let context = state_cell.lock().context.clone();
        let outcome = execute_task(task, &context, operations);

        if outcome.success {
            summary.completed += 1;
        } else {
            summary.failed += 1;
        }

        let mut state = state_cell.lock();
        apply_outcome(&mut state, task, &outcome);
    }

    debug!(
        phase = %phase.name,
        completed = summary.completed,
        failed = summary.failed,
        "phase finished"
    );

    summary
}
