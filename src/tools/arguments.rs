//! Typed access to tool call arguments.

use crate::error::ToolError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    tool: String,
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(tool: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            tool: tool.into(),
            value,
        }
    }

    fn missing(&self, kind: &str, key: &str) -> ToolError {
        ToolError::invalid(&self.tool, format!("missing {kind} argument: {key}"))
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, ToolError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| self.missing("string", key))
    }

    /// Get an integer argument.
    pub fn get_i64(&self, key: &str) -> Result<i64, ToolError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| self.missing("integer", key))
    }

}
