//! Name-keyed operation catalog.
//!
//! Every leaf capability the engine can invoke — CAD queries and mutations,
//! geometry analyses, numbering-scheme heuristics — is registered here under a
//! name and consumed through the uniform [`Operation`] contract. The engine is
//! agnostic to what each operation does; it inspects only the returned
//! [`OperationResult`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;

use drafter_types::OperationResult;

/// Executes a single named operation.
///
/// Implementations receive the task's effective parameter bag (explicit
/// template parameters plus injected context values) and return a structured
/// result. Returning `Err` is treated by the engine exactly like a result with
/// `success: false`: the task fails, the run continues.
pub trait Operation: Send + Sync {
    /// Invoke the operation with the given named parameters.
    fn invoke(&self, parameters: &JsonMap<String, JsonValue>) -> Result<OperationResult>;
}

impl<F> Operation for F
where
    F: Fn(&JsonMap<String, JsonValue>) -> Result<OperationResult> + Send + Sync,
{
    fn invoke(&self, parameters: &JsonMap<String, JsonValue>) -> Result<OperationResult> {
        self(parameters)
    }
}

/// Registration-time table mapping a lower-cased operation name to its
/// implementation.
///
/// Built once at startup by each operation-providing module registering
/// itself; lookups are case-insensitive so template authors are free to write
/// `createSheet` or `createsheet`.
#[derive(Default, Clone)]
pub struct OperationRegistry {
    table: HashMap<String, Arc<dyn Operation>>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation under `name`. A later registration under the
    /// same name (case-insensitive) replaces the earlier one.
    pub fn register(&mut self, name: &str, operation: impl Operation + 'static) {
        debug!(operation = %name, "registering operation");
        self.table.insert(name.to_lowercase(), Arc::new(operation));
    }

    /// Looks up an operation by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Operation>> {
        self.table.get(&name.to_lowercase()).cloned()
    }

    /// True when an operation is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(&name.to_lowercase())
    }

    /// Registered operation names (lower-cased), sorted for stable listings.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.names())
            .finish()
    }
}

/// An operation that succeeds with a synthetic payload echoing its name and
/// parameters. Lets workflows run end to end without a CAD document attached;
/// used by the CLI dry surface and by tests.
pub struct EchoOperation {
    name: String,
}

impl EchoOperation {
    /// Creates an echo operation reporting the given name in its payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Operation for EchoOperation {
    fn invoke(&self, parameters: &JsonMap<String, JsonValue>) -> Result<OperationResult> {
        let result = OperationResult::ok()
            .with("operation", self.name.clone())
            .with("parameters", JsonValue::Object(parameters.clone()));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut registry = OperationRegistry::new();
        registry.register("createSheet", EchoOperation::new("createSheet"));

        assert!(registry.contains("createsheet"));
        assert!(registry.contains("CREATESHEET"));
        assert!(registry.get("CreateSheet").is_some());
        assert!(registry.get("deleteSheet").is_none());
    }

    #[test]
    fn closures_register_directly() {
        let mut registry = OperationRegistry::new();
        registry.register("getSheets", |_: &JsonMap<String, JsonValue>| {
            Ok(OperationResult::ok().with("sheetId", 7))
        });

        let operation = registry.get("getsheets").expect("registered");
        let result = operation.invoke(&JsonMap::new()).expect("invoke");
        assert!(result.success);
        assert_eq!(result.field("sheetId"), Some(&json!(7)));
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut registry = OperationRegistry::new();
        registry.register("op", |_: &JsonMap<String, JsonValue>| {
            Ok(OperationResult::fail("old"))
        });
        registry.register("OP", |_: &JsonMap<String, JsonValue>| Ok(OperationResult::ok()));

        assert_eq!(registry.len(), 1);
        let result = registry.get("op").expect("present").invoke(&JsonMap::new()).expect("invoke");
        assert!(result.success);
    }

    #[test]
    fn echo_operation_reflects_parameters() {
        let operation = EchoOperation::new("placeViews");
        let mut parameters = JsonMap::new();
        parameters.insert("viewType".into(), json!("FloorPlan"));

        let result = operation.invoke(&parameters).expect("invoke");
        assert!(result.success);
        assert_eq!(result.field("operation"), Some(&json!("placeViews")));
        assert_eq!(
            result.field("parameters"),
            Some(&json!({"viewType": "FloorPlan"}))
        );
    }

    #[test]
    fn names_are_sorted_and_lowercased() {
        let mut registry = OperationRegistry::new();
        registry.register("tagDoors", EchoOperation::new("tagDoors"));
        registry.register("createSheet", EchoOperation::new("createSheet"));

        assert_eq!(registry.names(), vec!["createsheet", "tagdoors"]);
    }
}
