//! # Drafter Registry
//!
//! Catalogs consumed by the workflow engine:
//!
//! - **`operations`** — the name-keyed table of document-mutating operations.
//!   The host application registers each operation once at startup; the engine
//!   only depends on the table's case-insensitive lookup contract.
//! - **`templates`** — the declarative workflow template store, resolving a
//!   `(workflow_type, project_type)` pair to a template with fallback from the
//!   project-specific key to the generic one.

pub mod operations;
pub mod templates;

pub use operations::{EchoOperation, Operation, OperationRegistry};
pub use templates::{TemplateStore, parse_template_str};
