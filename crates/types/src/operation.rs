//! The uniform result payload every leaf operation returns.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Structured outcome of one operation invocation.
///
/// The engine inspects only `success`, `error`, and the well-known output
/// fields (`scheduleId`, `sheetId`, `viewId`); everything else in `data` is
/// opaque and carried through for the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationResult {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error text when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Named output fields produced by the operation.
    #[serde(flatten)]
    pub data: JsonMap<String, JsonValue>,
}

impl OperationResult {
    /// A successful result with no output fields.
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: JsonMap::new(),
        }
    }

    /// A failed result carrying the given error text.
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: JsonMap::new(),
        }
    }

    /// Adds a named output field; builder-style for operation implementations.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Reads a named output field.
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.data.get(name)
    }
}
