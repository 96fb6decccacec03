//! Declarative workflow template schema.
//!
//! Templates are externally authored documents describing an ordered list of
//! phases, each with an ordered list of tasks. The engine performs no semantic
//! validation beyond the structural parse; a task's `method` is resolved
//! against the operation registry only when the task actually executes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A fully authored workflow template, keyed by `workflow_type` and resolved
/// with an optional project-type specialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowTemplate {
    /// Canonical identifier used for lookups (for example, `construction_documents`).
    #[serde(rename = "workflowType", default)]
    pub workflow_type: String,
    /// Human-readable title for listings.
    #[serde(default)]
    pub name: String,
    /// Descriptive copy surfaced next to the title.
    #[serde(default)]
    pub description: String,
    /// Project types this template specializes for; empty means generic.
    #[serde(rename = "projectTypes", default)]
    pub project_types: Vec<String>,
    /// Rough authoring estimate surfaced in listings (for example, `45m`).
    #[serde(rename = "estimatedTime", default)]
    pub estimated_time: Option<String>,
    /// Ordered phases executed sequentially.
    #[serde(default)]
    pub phases: Vec<PhaseDefinition>,
}

impl WorkflowTemplate {
    /// Total number of tasks across all phases.
    pub fn task_count(&self) -> usize {
        self.phases.iter().map(|phase| phase.tasks.len()).sum()
    }
}

/// A named, ordered group of tasks; the unit of pause granularity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseDefinition {
    /// Phase name recorded into `WorkflowState::current_phase` while executing.
    pub name: String,
    /// Ordered tasks executed sequentially within the phase.
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

/// One declarative unit of work mapping to zero (custom) or one (dispatched)
/// operation invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDefinition {
    /// Unique task identifier within the template.
    pub id: String,
    /// Human-readable description recorded into the completed/failed lists.
    #[serde(default)]
    pub description: String,
    /// Operation name to dispatch, or `custom`/empty for the placeholder path.
    #[serde(default)]
    pub method: String,
    /// Named parameters passed to the operation, preserving author order.
    #[serde(default = "default_parameter_map")]
    pub parameters: IndexMap<String, JsonValue>,
    /// Free-text hint describing the autonomous choice this task embodies.
    #[serde(rename = "autonomous_decision", default)]
    pub autonomous_decision: Option<String>,
}

impl TaskDefinition {
    /// True when the task is a placeholder that must not be dispatched.
    pub fn is_custom(&self) -> bool {
        self.method.is_empty() || self.method.eq_ignore_ascii_case("custom")
    }

    /// Human-readable name recorded into task lists; falls back to the id
    /// when no description was authored.
    pub fn display_name(&self) -> &str {
        if self.description.is_empty() {
            &self.id
        } else {
            &self.description
        }
    }
}

/// Lightweight listing row for the template resolution surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateSummary {
    /// Canonical workflow type of the underlying template.
    pub workflow_type: String,
    /// Human-readable title.
    pub name: String,
    /// Descriptive copy.
    pub description: String,
    /// Project types the template specializes for.
    pub project_types: Vec<String>,
    /// Number of phases in the template.
    pub phase_count: usize,
}

impl From<&WorkflowTemplate> for TemplateSummary {
    fn from(template: &WorkflowTemplate) -> Self {
        Self {
            workflow_type: template.workflow_type.clone(),
            name: template.name.clone(),
            description: template.description.clone(),
            project_types: template.project_types.clone(),
            phase_count: template.phases.len(),
        }
    }
}

fn default_parameter_map() -> IndexMap<String, JsonValue> {
    IndexMap::new()
}
