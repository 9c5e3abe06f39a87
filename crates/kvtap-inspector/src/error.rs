//! Error types for kvtap-inspector

use std::path::PathBuf;

use kvtap_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while attaching the inspector to an engine
#[derive(Debug, Error)]
pub enum InspectorError {
    /// The engine failed to register a listener
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The configuration could not be parsed
    #[error("Invalid config: {0}")]
    Config(String),

    /// The configuration file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InspectorError {
    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<toml::de::Error> for InspectorError {
    fn from(err: toml::de::Error) -> Self {
        InspectorError::Config(err.to_string())
    }
}
