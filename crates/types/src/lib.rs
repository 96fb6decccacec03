//! Shared type definitions for the Drafter workflow engine.
//!
//! The models here are consumed by the registry (template catalog, operation
//! dispatch), the engine (coordinator, phase and task executors), and the CLI.
//! Template documents intentionally preserve authoring order (via `IndexMap`)
//! so phases and tasks execute in exactly the sequence their author declared.

pub mod errors;
pub mod operation;
pub mod state;
pub mod template;

pub use errors::WorkflowError;
pub use operation::OperationResult;
pub use state::{
    PhaseSummary, RunSummary, WorkflowDecision, WorkflowOverview, WorkflowState, WorkflowStatus,
};
pub use template::{PhaseDefinition, TaskDefinition, TemplateSummary, WorkflowTemplate};
