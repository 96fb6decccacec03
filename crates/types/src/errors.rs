//! Error taxonomy for the workflow control surface.
//!
//! Only start-time conditions and control-operation lookups surface here.
//! Per-task failures are recorded into `WorkflowState::failed_tasks` and never
//! unwind a run.

use thiserror::Error;

/// Failures surfaced by the workflow coordinator and template store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// A workflow was requested without a workflow type.
    #[error("workflow type must not be empty")]
    MissingWorkflowType,

    /// Neither the specific nor the generic template key resolved.
    #[error("no template found for workflow type '{workflow_type}' and project type '{project_type}'")]
    TemplateNotFound {
        /// Requested workflow type.
        workflow_type: String,
        /// Requested project type (may be empty).
        project_type: String,
    },

    /// A template document failed the structural parse.
    #[error("template '{source_name}' could not be parsed: {message}")]
    TemplateParse {
        /// File name or embedded-document name of the offending template.
        source_name: String,
        /// Parser error text.
        message: String,
    },

    /// A control operation referenced a workflow id that is not registered.
    #[error("unknown workflow id '{0}'")]
    WorkflowNotFound(String),
}
