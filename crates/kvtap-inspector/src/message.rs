//! Display messages and preview formatting

use std::borrow::Cow;

use kvtap_storage::{ListenerError, StoredValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::InspectorConfig;

/// Message handed to a display sink, one per reported mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMessage {
    /// Constant display name (e.g. `"MMKV"`)
    pub name: String,
    /// Structured payload: `{"key", "value"}` for writes, `{"key"}` for deletes
    pub value: Value,
    /// One-line human readable summary
    pub preview: String,
}

impl DisplayMessage {
    /// Build the message for a write of `value` under `key`
    ///
    /// Fails only if the value cannot be serialized.
    pub fn write(config: &InspectorConfig, key: &str, value: &StoredValue) -> Result<Self, ListenerError> {
        let serialized = serde_json::to_string(value)?;
        let shown = truncate_preview(&serialized, config.preview_limit, &config.ellipsis);
        Ok(Self {
            name: config.name.clone(),
            value: json!({ "key": key, "value": value }),
            preview: format!("Set \"{key}\" to {shown}"),
        })
    }

    /// Build the message for a delete of `key`
    pub fn delete(config: &InspectorConfig, key: &str) -> Self {
        Self {
            name: config.name.clone(),
            value: json!({ "key": key }),
            preview: format!("Deleting \"{key}\""),
        }
    }
}

/// Shorten `serialized` to `limit` characters plus `ellipsis`
///
/// Values of at most `limit` characters are returned unchanged. Characters
/// are Unicode scalar values, so a multi-byte character is never split.
pub fn truncate_preview<'a>(serialized: &'a str, limit: usize, ellipsis: &str) -> Cow<'a, str> {
    match serialized.char_indices().nth(limit) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &serialized[..cut], ellipsis)),
        None => Cow::Borrowed(serialized),
    }
}
