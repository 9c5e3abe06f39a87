//! Configuration types for the mutation inspector

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::InspectorError;

/// Display name used when none is configured
pub const DEFAULT_NAME: &str = "MMKV";

/// Serialized values longer than this many characters are truncated
pub const DEFAULT_PREVIEW_LIMIT: usize = 50;

/// Marker appended to truncated previews
pub const DEFAULT_ELLIPSIS: &str = "...";

/// Main inspector configuration
///
/// Every field has a default, so a TOML file only needs the fields it
/// changes:
///
/// ```toml
/// ignore = ["session_token", "secret"]
/// preview_limit = 80
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Name attached to every display message
    pub name: String,

    /// Keys that are never reported
    pub ignore: HashSet<String>,

    /// Maximum preview length before truncation, in characters
    pub preview_limit: usize,

    /// Marker appended to truncated previews
    pub ellipsis: String,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            ignore: HashSet::new(),
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            ellipsis: DEFAULT_ELLIPSIS.to_string(),
        }
    }
}

impl InspectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add keys to the ignore-set
    pub fn with_ignore<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the preview limit
    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }

    /// Whether mutations of `key` are suppressed
    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignore.contains(key)
    }

    /// Parse a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self, InspectorError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InspectorError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| InspectorError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, InspectorError> {
        toml::to_string(self).map_err(|e| InspectorError::config(e.to_string()))
    }

    fn validate(&self) -> Result<(), InspectorError> {
        if self.preview_limit == 0 {
            return Err(InspectorError::config("preview_limit must be at least 1"));
        }
        if self.name.is_empty() {
            return Err(InspectorError::config("name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InspectorConfig::default();
        assert_eq!(config.name, "MMKV");
        assert_eq!(config.preview_limit, 50);
        assert_eq!(config.ellipsis, "...");
        assert!(config.ignore.is_empty());
    }

    #[test]
    fn test_builder_methods() {
        let config = InspectorConfig::new()
            .with_ignore(["secret", "token"])
            .with_name("Storage")
            .with_preview_limit(10);
        assert!(config.is_ignored("secret"));
        assert!(config.is_ignored("token"));
        assert!(!config.is_ignored("count"));
        assert_eq!(config.name, "Storage");
        assert_eq!(config.preview_limit, 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = InspectorConfig::from_toml_str(r#"ignore = ["secret"]"#).unwrap();
        assert!(config.is_ignored("secret"));
        assert_eq!(config.name, DEFAULT_NAME);
        assert_eq!(config.preview_limit, DEFAULT_PREVIEW_LIMIT);
    }

    #[test]
    fn test_zero_preview_limit_rejected() {
        let err = InspectorConfig::from_toml_str("preview_limit = 0").unwrap_err();
        assert!(matches!(err, InspectorError::Config(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = InspectorConfig::from_toml_str("ignore = [").unwrap_err();
        assert!(matches!(err, InspectorError::Config(_)));
    }

    #[test]
    fn test_toml_output_parses_back() {
        let config = InspectorConfig::new().with_ignore(["a"]).with_preview_limit(12);
        let rendered = config.to_toml_string().unwrap();
        assert_eq!(InspectorConfig::from_toml_str(&rendered).unwrap(), config);
    }
}
