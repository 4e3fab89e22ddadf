//! Typed accessors over the free-form JSON payload callers send with an
//! ingestion request. Required keys are adapter specific, so lookups return
//! `ProviderError::InvalidInput` when a present key has the wrong shape.

use super::providers::ProviderError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build from any JSON value; only objects are accepted
    pub fn from_value(value: Value) -> Result<Self, ProviderError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(ProviderError::InvalidInput(format!(
                "payload must be a JSON object, got {other}"
            ))),
        }
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// String value; numbers are stringified since upstream ids are often numeric
    pub fn get_str(&self, key: &str) -> Result<Option<String>, ProviderError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(wrong_type(key, "a string", other)),
        }
    }

    pub fn get_str_or(&self, key: &str, default: &str) -> Result<String, ProviderError> {
        Ok(self.get_str(key)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn get_f64(&self, key: &str) -> Result<Option<f64>, ProviderError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => coerce_f64(value)
                .map(Some)
                .ok_or_else(|| wrong_type(key, "a number", value)),
        }
    }

    pub fn require_f64(&self, key: &str) -> Result<f64, ProviderError> {
        self.get_f64(key)?
            .ok_or_else(|| ProviderError::InvalidInput(format!("Missing '{key}' in payload")))
    }

    /// Non-negative integer, accepting numeric strings
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>, ProviderError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value_as_usize(value)
                .map(Some)
                .ok_or_else(|| wrong_type(key, "a non-negative integer", value)),
        }
    }

    pub fn get_usize_or(&self, key: &str, default: usize) -> Result<usize, ProviderError> {
        Ok(self.get_usize(key)?.unwrap_or(default))
    }

    /// List of strings; a single comma-separated string is also accepted
    pub fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>, ProviderError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(ToString::to_string)
                    .collect(),
            )),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(wrong_type(key, "a list of strings", other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(wrong_type(key, "a list of strings", other)),
        }
    }

    /// Nested mapping, e.g. provider query `params`
    pub fn get_object(&self, key: &str) -> Result<Option<Map<String, Value>>, ProviderError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map.clone())),
            Some(other) => Err(wrong_type(key, "an object", other)),
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Flatten a parameter mapping into query pairs. Strings go through unquoted,
/// other scalars are stringified and nested values are sent as JSON text.
#[must_use]
pub fn to_query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), scalar_to_string(value)))
        .collect()
}

#[must_use]
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Number or numeric string as `f64`
#[must_use]
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn value_as_usize(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
}

fn wrong_type(key: &str, expected: &str, got: &Value) -> ProviderError {
    ProviderError::InvalidInput(format!("'{key}' must be {expected}, got {got}"))
}
