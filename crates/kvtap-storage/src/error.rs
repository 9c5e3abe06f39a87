//! Error types for kvtap-storage
//!
//! This module defines the error types used throughout the storage crate.

use thiserror::Error;

/// Errors that can occur in storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// The engine refused to register a listener
    #[error("Registration failed: {0}")]
    Registration(String),

    /// A mutation listener failed while handling a notification
    #[error("Listener failed: {0}")]
    Listener(#[from] ListenerError),

    /// Error during serialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Requested item was not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl StorageError {
    /// Create a new Registration error
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration(message.into())
    }

    /// Create a new Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a new NotFound error
    pub fn not_found(item: impl Into<String>) -> Self {
        Self::NotFound(item.into())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Errors returned by mutation listeners
///
/// A listener error stops dispatch of the current notification and is
/// handed back to whoever performed the mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    /// The mutated value could not be serialized
    #[error("failed to serialize value: {0}")]
    Serialization(String),

    /// The listener refused the mutation
    #[error("listener rejected mutation: {0}")]
    Rejected(String),
}

impl ListenerError {
    /// Create a new Rejected error
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

impl From<serde_json::Error> for ListenerError {
    fn from(err: serde_json::Error) -> Self {
        ListenerError::Serialization(err.to_string())
    }
}
