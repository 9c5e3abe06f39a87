//! Storage mutation inspector for kvtap
//!
//! Watches a storage engine's writes and deletes and forwards a short,
//! human readable preview of each one to a developer console.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use kvtap_inspector::{attach, ChannelSink, InspectorConfig};
//! use kvtap_storage::InMemoryStore;
//!
//! let store = Arc::new(InMemoryStore::new());
//! let (sink, mut rx) = ChannelSink::channel();
//!
//! let handle = attach(
//!     store.clone(),
//!     InspectorConfig::default().with_ignore(["secret"]),
//!     Arc::new(sink),
//! );
//! handle.on_connect().unwrap();
//!
//! store.set_number("secret", 42).unwrap();
//! store.set_number("count", 42).unwrap();
//!
//! let message = rx.try_recv().unwrap();
//! assert_eq!(message.preview, "Set \"count\" to 42");
//! assert!(rx.try_recv().is_err());
//!
//! handle.on_disconnect();
//! ```
//!
//! # Sinks
//!
//! - [`TracingSink`]: logs each message through `tracing`
//! - [`ChannelSink`]: hands messages to a tokio task
//! - [`JsonlSink`]: writes `display` command lines to any writer
//! - [`FnSink`]: wraps a closure

pub mod config;
pub mod error;
pub mod logger;
pub mod message;
pub mod sink;

pub use config::{DEFAULT_ELLIPSIS, DEFAULT_NAME, DEFAULT_PREVIEW_LIMIT, InspectorConfig};
pub use error::InspectorError;
pub use logger::{ConnectionHandle, MutationLogger, attach};
pub use message::{DisplayMessage, truncate_preview};
pub use sink::{ChannelSink, DisplaySink, FnSink, JsonlSink, TracingSink};
