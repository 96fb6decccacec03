//! # Drafter Engine
//!
//! Template-driven workflow execution for construction-document production.
//! The engine loads a declarative phase/task template, executes each task
//! against the operation catalog, threads well-known result fields forward as
//! implicit context for later tasks, records every autonomous decision, and
//! supports pausing, resuming, and inspecting live runs.
//!
//! ## Execution model
//!
//! A workflow runs synchronously within the thread that created it: phases in
//! declared order, tasks within a phase in declared order, no concurrency
//! between tasks of the same workflow. Task failures are recorded and the run
//! continues; only a failed template resolution aborts a run, and it does so
//! before any state is registered. Pause is cooperative and observed at phase
//! boundaries.
//!
//! Multiple workflows may be live at once; the [`WorkflowRegistry`] is the
//! only shared mutable state and serves concurrent status queries while runs
//! execute on other threads.
//!
//! ## Usage
//!
//! ```rust
//! use drafter_engine::{CreateWorkflowRequest, WorkflowCoordinator};
//! use drafter_registry::{EchoOperation, OperationRegistry, TemplateStore};
//!
//! let templates = TemplateStore::from_embedded()?;
//! let mut operations = OperationRegistry::new();
//! for name in [
//!     "getProjectInfo",
//!     "createSheet",
//!     "createSheetSet",
//!     "applySheetNumbering",
//!     "placeViews",
//!     "createSchedule",
//!     "runGapAnalysis",
//! ] {
//!     operations.register(name, EchoOperation::new(name));
//! }
//!
//! let coordinator = WorkflowCoordinator::new(templates, operations);
//! let summary = coordinator.create_and_run(CreateWorkflowRequest::new("construction_documents"))?;
//! assert_eq!(summary.failed, 0);
//! # Ok::<(), drafter_types::WorkflowError>(())
//! ```

pub mod coordinator;
pub mod phase;
pub mod registry;
pub mod task;

pub use coordinator::{CreateWorkflowRequest, WorkflowCoordinator};
pub use registry::WorkflowRegistry;
pub use task::{
    CUSTOM_TASK_DECISION, DEFAULT_DECISION_REASON, DecisionNote, INJECTED_PARAMETERS, TaskOutcome,
    apply_outcome, execute_task,
};
