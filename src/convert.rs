//! Argument extraction helpers for tool calls.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};

/// Serialize a tool result into the JSON returned to the client.
pub fn to_json<T: Serialize>(value: &T) -> Result<JsonValue> {
    serde_json::to_value(value).map_err(|e| McpError::Internal(e.to_string()))
}

/// Helper to get a required string argument from JSON arguments.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| McpError::MissingArg(name.to_string()))
}

/// Helper to get a project id, given either as an integer or a numeric string.
pub fn get_project_id(args: &Map<String, JsonValue>, name: &str) -> Result<u64> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Err(McpError::MissingArg(name.to_string())),
        Some(JsonValue::Number(n)) => n.as_u64().ok_or_else(|| invalid(name, "Expected a positive integer")),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| invalid(name, "Expected a positive integer")),
        Some(_) => Err(invalid(name, "Expected a positive integer")),
    }
}

/// Helper to get a required, non-empty array of strings.
pub fn get_string_array_arg(args: &Map<String, JsonValue>, name: &str) -> Result<Vec<String>> {
    let arr = args
        .get(name)
        .and_then(|v| v.as_array())
        .ok_or_else(|| McpError::MissingArg(name.to_string()))?;

    if arr.is_empty() {
        return Err(invalid(name, "Expected at least one entry"));
    }
    arr.iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| invalid(name, "Expected array of strings"))
        })
        .collect()
}

/// Helper to get an optional boolean argument.
pub fn get_optional_bool(args: &Map<String, JsonValue>, name: &str) -> Option<bool> {
    args.get(name).and_then(|v| v.as_bool())
}

/// Helper to get an optional similarity threshold in `[0, 1]`.
pub fn get_optional_threshold(args: &Map<String, JsonValue>, name: &str) -> Result<Option<f64>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => match v.as_f64() {
            Some(t) if (0.0..=1.0).contains(&t) => Ok(Some(t)),
            _ => Err(invalid(name, "Expected a number between 0.0 and 1.0")),
        },
    }
}

fn invalid(name: &str, reason: &str) -> McpError {
    McpError::InvalidArg {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
