use serde::{Deserialize, Serialize};

use crate::error::AdminResult;

/// Outcome of one operation: the JSON body every endpoint returns.
///
/// Child logs are appended in order into a parent's trail, never reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub success: bool,
    pub message: String,
    pub logs: Vec<String>,
}

impl TaskResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            logs: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            logs: Vec::new(),
        }
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    /// Append another result's log lines after this one's.
    pub fn extend_logs(&mut self, other: &TaskResult) {
        self.logs.extend(other.logs.iter().cloned());
    }

    /// Run `body` against a fresh result and fold its outcome into it.
    ///
    /// `Ok(message)` marks success; an error marks failure with the error text as
    /// message. Lines logged before the error are kept.
    pub fn capture<F>(operation: &str, body: F) -> Self
    where
        F: FnOnce(&mut TaskResult) -> AdminResult<String>,
    {
        let mut result = Self::new();
        match body(&mut result) {
            Ok(message) => {
                result.success = true;
                result.message = message;
            }
            Err(e) => {
                tracing::error!(operation, error = %e, "operation failed");
                result.success = false;
                result.message = e.to_string();
            }
        }
        result
    }
}
