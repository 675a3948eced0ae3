//! Validate tool call arguments against a tool schema before execution.

use super::types::ToolSchema;

/// Validate tool arguments against a [`ToolSchema`].
///
/// Arguments must be a JSON object holding every required parameter, no
/// undeclared keys, and values of the declared types. Returns `Err(message)`
/// describing the first violation found.
pub fn validate_arguments(args: &serde_json::Value, schema: &ToolSchema) -> Result<(), String> {
    let obj = args
        .as_object()
        .ok_or_else(|| format!("expected object arguments, got {}", json_type_name(args)))?;

    for param in schema.params.iter().filter(|p| p.required) {
        if !obj.contains_key(&param.name) {
            return Err(format!("missing required field '{}'", param.name));
        }
    }

    for (key, value) in obj {
        let param = schema
            .param(key)
            .ok_or_else(|| format!("unexpected field '{key}'"))?;
        if !param.value_type.matches(value) {
            return Err(format!(
                "field '{}' expected type '{}', got {}",
                key,
                param.value_type,
                json_type_name(value)
            ));
        }
    }

    Ok(())
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
