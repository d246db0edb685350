//! Helpers for reading configuration attributes

use std::collections::HashMap;
use std::time::Duration;

use isvpc_core::provider::{ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, Value};

/// Timeout applied when `timeouts` does not name the operation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

pub fn required_str<'a>(attrs: &'a HashMap<String, Value>, key: &str) -> ProviderResult<&'a str> {
    match attrs.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(Value::ResourceRef(binding, attr)) => Err(ProviderError::validation(format!(
            "'{}' references ${{{}.{}}} which is not resolved yet",
            key, binding, attr
        ))),
        Some(_) => Err(ProviderError::validation(format!(
            "'{}' must be a string",
            key
        ))),
        None => Err(ProviderError::validation(format!(
            "missing required attribute '{}'",
            key
        ))),
    }
}

pub fn optional_str(attrs: &HashMap<String, Value>, key: &str) -> Option<String> {
    attrs.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn optional_bool(attrs: &HashMap<String, Value>, key: &str) -> Option<bool> {
    attrs.get(key).and_then(Value::as_bool)
}

pub fn optional_int(attrs: &HashMap<String, Value>, key: &str) -> Option<i64> {
    attrs.get(key).and_then(Value::as_int)
}

/// Strings of a list attribute; non-string items are skipped
pub fn string_list(attrs: &HashMap<String, Value>, key: &str) -> Vec<String> {
    match attrs.get(key) {
        Some(Value::List(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Timeout for `operation` (`create`, `update`, `delete`) from the `timeouts`
/// map, e.g. `{"create": "20m"}`
pub fn operation_timeout(
    attrs: &HashMap<String, Value>,
    operation: &str,
) -> ProviderResult<Duration> {
    let Some(Value::Map(timeouts)) = attrs.get("timeouts") else {
        return Ok(DEFAULT_TIMEOUT);
    };
    match timeouts.get(operation).and_then(Value::as_str) {
        Some(text) => humantime::parse_duration(text).map_err(|e| {
            ProviderError::validation(format!(
                "invalid {} timeout '{}': {}",
                operation, text, e
            ))
        }),
        None => Ok(DEFAULT_TIMEOUT),
    }
}

/// Copy configured attributes the API never returns into read state
pub fn keep_config(attrs: &mut HashMap<String, Value>, resource: &Resource, keys: &[&str]) {
    for key in keys {
        if let Some(value) = resource.attributes.get(*key) {
            attrs.entry(key.to_string()).or_insert_with(|| value.clone());
        }
    }
}

/// Escape `/` so a CIDR fits in one path segment
pub fn encode_path_segment(segment: &str) -> String {
    segment.replace('/', "%2F")
}
