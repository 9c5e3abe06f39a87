//! Mutation listener registration
//!
//! Engines expose the [`TransactionRegistry`] trait. Listeners are keyed by
//! `(ValueKind, MutationKind)`; a registration may hand back a
//! [`Registration`] that removes the listener again when released or
//! dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{ListenerError, StorageError};
use crate::kind::{MutationKind, ValueKind};
use crate::value::StoredValue;

/// A single mutation delivered to listeners
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MutationEvent<'a> {
    Write { key: &'a str, value: &'a StoredValue },
    Delete { key: &'a str },
}

impl<'a> MutationEvent<'a> {
    pub fn key(&self) -> &'a str {
        match self {
            MutationEvent::Write { key, .. } | MutationEvent::Delete { key } => key,
        }
    }

    pub fn mutation(&self) -> MutationKind {
        match self {
            MutationEvent::Write { .. } => MutationKind::Write,
            MutationEvent::Delete { .. } => MutationKind::Delete,
        }
    }
}

/// Callback invoked for every matching mutation
pub type MutationCallback =
    Arc<dyn Fn(&MutationEvent<'_>) -> Result<(), ListenerError> + Send + Sync>;

/// Storage engine notification interface
///
/// Implemented by any engine that can report writes and deletes. Engines
/// that cannot remove listeners return `Ok(None)`.
pub trait TransactionRegistry: Send + Sync {
    fn register(
        &self,
        kind: ValueKind,
        mutation: MutationKind,
        callback: MutationCallback,
    ) -> Result<Option<Registration>, StorageError>;
}

impl<T: TransactionRegistry + ?Sized> TransactionRegistry for Arc<T> {
    fn register(
        &self,
        kind: ValueKind,
        mutation: MutationKind,
        callback: MutationCallback,
    ) -> Result<Option<Registration>, StorageError> {
        (**self).register(kind, mutation, callback)
    }
}

/// Owned deregistration handle
///
/// Releasing runs the deregistration exactly once. A handle that is dropped
/// without being released is released on drop.
pub struct Registration {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Registration {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Remove the listener from its engine
    pub fn release(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("released", &self.release.is_none())
            .finish()
    }
}

/// Identifier of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

type ListenerSlot = (ValueKind, MutationKind);

/// Listener table shared by an engine and its registrations
///
/// Dispatch works on a snapshot of the matching callbacks, so a callback may
/// register, deregister or mutate the engine while it runs.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<HashMap<ListenerSlot, Vec<(ListenerId, MutationCallback)>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener and return its id
    pub fn add(
        &self,
        kind: ValueKind,
        mutation: MutationKind,
        callback: MutationCallback,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .write()
            .entry((kind, mutation))
            .or_default()
            .push((id, callback));
        trace!(%id, %kind, %mutation, "Listener added");
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        for slot in listeners.values_mut() {
            if let Some(pos) = slot.iter().position(|(existing, _)| *existing == id) {
                slot.remove(pos);
                trace!(%id, "Listener removed");
                return true;
            }
        }
        false
    }

    /// Total number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of listeners registered for one slot
    pub fn count_for(&self, kind: ValueKind, mutation: MutationKind) -> usize {
        self.listeners
            .read()
            .get(&(kind, mutation))
            .map_or(0, Vec::len)
    }

    /// Remove every listener
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// Deliver an event to the listeners registered for `kind`
    ///
    /// Returns the number of callbacks invoked. The first callback error
    /// stops dispatch.
    pub fn notify(&self, kind: ValueKind, event: &MutationEvent<'_>) -> Result<usize, ListenerError> {
        let snapshot: Vec<MutationCallback> = self
            .listeners
            .read()
            .get(&(kind, event.mutation()))
            .map(|slot| slot.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();

        for callback in &snapshot {
            callback(event)?;
        }
        Ok(snapshot.len())
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_callback(counter: &Arc<AtomicUsize>) -> MutationCallback {
        let counter = Arc::clone(counter);
        Arc::new(move |_event: &MutationEvent<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn test_notify_matches_slot() {
        let registry = ListenerRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry.add(ValueKind::Number, MutationKind::Write, counting_callback(&counter));

        let value = StoredValue::from(1i64);
        let write = MutationEvent::Write { key: "k", value: &value };

        assert_eq!(registry.notify(ValueKind::Number, &write).unwrap(), 1);
        assert_eq!(registry.notify(ValueKind::String, &write).unwrap(), 0);
        assert_eq!(
            registry
                .notify(ValueKind::Number, &MutationEvent::Delete { key: "k" })
                .unwrap(),
            0
        );
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_listener() {
        let registry = ListenerRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let id = registry.add(ValueKind::String, MutationKind::Delete, counting_callback(&counter));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_listener_error_stops_dispatch() {
        let registry = ListenerRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry.add(
            ValueKind::Boolean,
            MutationKind::Write,
            Arc::new(|_: &MutationEvent<'_>| Err(ListenerError::rejected("nope"))),
        );
        registry.add(ValueKind::Boolean, MutationKind::Write, counting_callback(&counter));

        let value = StoredValue::from(true);
        let result = registry.notify(ValueKind::Boolean, &MutationEvent::Write { key: "b", value: &value });
        assert_eq!(result, Err(ListenerError::rejected("nope")));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registration_releases_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registration = {
            let calls = Arc::clone(&calls);
            Registration::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };
        registration.release();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registration_releases_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let calls = Arc::clone(&calls);
            let _registration = Registration::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_can_register_during_dispatch() {
        let registry = Arc::new(ListenerRegistry::new());
        let inner = Arc::clone(&registry);
        registry.add(
            ValueKind::String,
            MutationKind::Write,
            Arc::new(move |_: &MutationEvent<'_>| {
                inner.add(ValueKind::String, MutationKind::Write, Arc::new(|_: &MutationEvent<'_>| Ok(())));
                Ok(())
            }),
        );

        let value = StoredValue::from("v");
        let invoked = registry
            .notify(ValueKind::String, &MutationEvent::Write { key: "k", value: &value })
            .unwrap();
        assert_eq!(invoked, 1);
        assert_eq!(registry.count_for(ValueKind::String, MutationKind::Write), 2);
    }
}
