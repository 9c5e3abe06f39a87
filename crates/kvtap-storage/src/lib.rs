//! # kvtap Storage
//!
//! Storage engine abstractions for kvtap.
//!
//! An engine reports every write and delete to listeners registered per
//! value category. This crate defines that notification contract and ships
//! an in-memory engine that implements it.
//!
//! ## Features
//!
//! - **TransactionRegistry trait**: Register mutation listeners with an engine
//! - **Registration**: Owned handle that removes a listener when released or dropped
//! - **ListenerRegistry**: Re-entrancy safe listener table for engine implementors
//! - **InMemoryStore**: DashMap-backed engine for testing and local development
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use kvtap_storage::{InMemoryStore, MutationEvent, MutationKind, TransactionRegistry, ValueKind};
//!
//! let store = InMemoryStore::new();
//! let registration = store
//!     .register(
//!         ValueKind::Number,
//!         MutationKind::Write,
//!         Arc::new(|event: &MutationEvent<'_>| {
//!             println!("wrote {}", event.key());
//!             Ok(())
//!         }),
//!     )
//!     .unwrap();
//!
//! store.set_number("count", 42).unwrap();
//!
//! // Dropping the registration removes the listener
//! drop(registration);
//! assert_eq!(store.listener_count(), 0);
//! ```

pub mod error;
pub mod kind;
pub mod memory;
pub mod registry;
pub mod value;

// Re-exports
pub use error::{ListenerError, StorageError};
pub use kind::{MutationKind, ValueKind};
pub use memory::InMemoryStore;
pub use registry::{
    ListenerId, ListenerRegistry, MutationCallback, MutationEvent, Registration,
    TransactionRegistry,
};
pub use value::StoredValue;
