//! Workflow template store.
//!
//! Templates are externally authored declarative documents (JSON or YAML).
//! The store performs a structural parse only and resolves a
//! `(workflow_type, project_type)` pair by trying the specific key
//! `{workflow_type}_{project_type}` before falling back to `{workflow_type}`
//! alone. Drafter ships a small embedded catalog and can also load a
//! directory of documents supplied by the host.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use drafter_types::{TemplateSummary, WorkflowError, WorkflowTemplate};

/// Embedded template documents shipped with the repository.
const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    (
        "construction_documents.json",
        include_str!("../../../templates/construction_documents.json"),
    ),
    (
        "construction_documents_residential.json",
        include_str!("../../../templates/construction_documents_residential.json"),
    ),
    (
        "permit_set.json",
        include_str!("../../../templates/permit_set.json"),
    ),
];

/// Parses a single template document from text.
///
/// Accepts YAML or JSON (YAML is a superset). Parse failures surface as
/// [`WorkflowError::TemplateParse`], which the coordinator treats the same as
/// a missing template: the workflow cannot start.
pub fn parse_template_str(source_name: &str, text: &str) -> Result<WorkflowTemplate, WorkflowError> {
    serde_yaml::from_str(text).map_err(|error| WorkflowError::TemplateParse {
        source_name: source_name.to_string(),
        message: error.to_string(),
    })
}

/// Catalog of workflow templates keyed by their resolution keys.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: IndexMap<String, Arc<WorkflowTemplate>>,
}

impl TemplateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store populated with the embedded template catalog.
    pub fn from_embedded() -> Result<Self, WorkflowError> {
        let mut store = Self::new();
        for (source_name, text) in EMBEDDED_TEMPLATES {
            let template = parse_template_str(source_name, text)?;
            store.insert(template);
        }
        Ok(store)
    }

    /// Loads every `.json`/`.yaml`/`.yml` document in `dir` into a new store.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        let dir = dir.as_ref();
        let mut store = Self::new();

        let entries = fs::read_dir(dir).map_err(|error| WorkflowError::TemplateParse {
            source_name: dir.display().to_string(),
            message: error.to_string(),
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            let is_template = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext, "json" | "yaml" | "yml"));
            if !is_template {
                continue;
            }

            let source_name = path.display().to_string();
            let text = fs::read_to_string(&path).map_err(|error| WorkflowError::TemplateParse {
                source_name: source_name.clone(),
                message: error.to_string(),
            })?;
            let template = parse_template_str(&source_name, &text)?;
            store.insert(template);
        }

        Ok(store)
    }

    /// Registers a template under its resolution keys.
    ///
    /// A template declaring project types registers under
    /// `{workflow_type}_{project_type}` for each of them; a template with no
    /// declared project types registers under the bare `{workflow_type}` and
    /// serves as the generic fallback. A later registration under the same
    /// key replaces the earlier one.
    pub fn insert(&mut self, template: WorkflowTemplate) {
        let template = Arc::new(template);
        let workflow_type = template.workflow_type.to_lowercase();

        if template.project_types.is_empty() {
            debug!(key = %workflow_type, "registering generic template");
            self.templates.insert(workflow_type, template);
            return;
        }

        for project_type in &template.project_types {
            let key = format!("{}_{}", workflow_type, project_type.to_lowercase());
            debug!(key = %key, "registering project-specific template");
            self.templates.insert(key, Arc::clone(&template));
        }
    }

    /// Resolves a template: exact `{workflow_type}_{project_type}` key first,
    /// then `{workflow_type}` alone.
    pub fn resolve(
        &self,
        workflow_type: &str,
        project_type: &str,
    ) -> Result<Arc<WorkflowTemplate>, WorkflowError> {
        let generic_key = workflow_type.to_lowercase();

        if !project_type.is_empty() {
            let specific_key = format!("{}_{}", generic_key, project_type.to_lowercase());
            if let Some(template) = self.templates.get(&specific_key) {
                debug!(key = %specific_key, "resolved project-specific template");
                return Ok(Arc::clone(template));
            }
        }

        if let Some(template) = self.templates.get(&generic_key) {
            debug!(key = %generic_key, "resolved generic template");
            return Ok(Arc::clone(template));
        }

        Err(WorkflowError::TemplateNotFound {
            workflow_type: workflow_type.to_string(),
            project_type: project_type.to_string(),
        })
    }

    /// Summaries of every distinct template, in registration order.
    pub fn list(&self) -> Vec<TemplateSummary> {
        let mut seen: Vec<*const WorkflowTemplate> = Vec::new();
        let mut summaries = Vec::new();

        for template in self.templates.values() {
            let ptr = Arc::as_ptr(template);
            if seen.contains(&ptr) {
                continue;
            }
            seen.push(ptr);
            summaries.push(TemplateSummary::from(template.as_ref()));
        }

        summaries
    }

    /// Number of registered resolution keys.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when no template is registered.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
