//! In-memory storage engine
//!
//! This module provides an in-memory key-value engine that reports every
//! write and delete to registered listeners, suitable for testing and
//! local development.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde_json::{Map, Number, Value};
use tracing::{debug, trace};

use crate::error::StorageError;
use crate::kind::{MutationKind, ValueKind};
use crate::registry::{
    ListenerRegistry, MutationCallback, MutationEvent, Registration, TransactionRegistry,
};
use crate::value::StoredValue;

/// In-memory implementation of a notifying key-value engine
///
/// Uses `DashMap` for concurrent access to entries. Listeners run
/// synchronously inside the mutating call, after the entry map has been
/// updated and with no entry lock held.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: DashMap<String, StoredValue>,
    listeners: Arc<ListenerRegistry>,
}

impl InMemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value and notify write listeners for its kind
    ///
    /// The value stays written even if a listener fails; the listener
    /// error is returned to the caller.
    pub fn set(&self, key: impl Into<String>, value: impl Into<StoredValue>) -> Result<(), StorageError> {
        let key = key.into();
        let value = value.into();
        let kind = value.kind();
        trace!(key = %key, %kind, "Writing value");

        self.entries.insert(key.clone(), value.clone());

        let event = MutationEvent::Write {
            key: &key,
            value: &value,
        };
        self.listeners.notify(kind, &event)?;
        Ok(())
    }

    pub fn set_string(&self, key: impl Into<String>, value: impl Into<String>) -> Result<(), StorageError> {
        self.set(key, StoredValue::String(value.into()))
    }

    pub fn set_number(&self, key: impl Into<String>, value: impl Into<Number>) -> Result<(), StorageError> {
        self.set(key, StoredValue::Number(value.into()))
    }

    /// Store a floating point number
    ///
    /// Fails for NaN and infinities, which have no JSON representation.
    pub fn set_f64(&self, key: impl Into<String>, value: f64) -> Result<(), StorageError> {
        let number = Number::from_f64(value)
            .ok_or_else(|| StorageError::serialization(format!("{value} is not a finite number")))?;
        self.set(key, StoredValue::Number(number))
    }

    pub fn set_object(&self, key: impl Into<String>, value: Map<String, Value>) -> Result<(), StorageError> {
        self.set(key, StoredValue::Object(value))
    }

    pub fn set_array(&self, key: impl Into<String>, value: Vec<Value>) -> Result<(), StorageError> {
        self.set(key, StoredValue::Array(value))
    }

    pub fn set_bool(&self, key: impl Into<String>, value: bool) -> Result<(), StorageError> {
        self.set(key, StoredValue::Boolean(value))
    }

    /// Get a copy of the value stored under `key`
    pub fn get(&self, key: &str) -> Option<StoredValue> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Get the value stored under `key`, or `NotFound`
    pub fn require(&self, key: &str) -> Result<StoredValue, StorageError> {
        self.get(key).ok_or_else(|| StorageError::not_found(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a key and notify delete listeners for the removed value's kind
    ///
    /// Returns the removed value. Removing a missing key is a no-op and
    /// notifies nobody.
    pub fn remove(&self, key: &str) -> Result<Option<StoredValue>, StorageError> {
        let Some((key, value)) = self.entries.remove(key) else {
            trace!(key = %key, "Remove of missing key ignored");
            return Ok(None);
        };
        trace!(key = %key, kind = %value.kind(), "Removing value");

        self.listeners
            .notify(value.kind(), &MutationEvent::Delete { key: &key })?;
        Ok(Some(value))
    }

    /// Remove every entry without notifying listeners
    pub fn clear_store(&self) {
        self.entries.clear();
        debug!("Store cleared");
    }

    /// All keys currently stored
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of registered listeners across all slots
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of listeners for one slot
    pub fn listener_count_for(&self, kind: ValueKind, mutation: MutationKind) -> usize {
        self.listeners.count_for(kind, mutation)
    }
}

impl TransactionRegistry for InMemoryStore {
    fn register(
        &self,
        kind: ValueKind,
        mutation: MutationKind,
        callback: MutationCallback,
    ) -> Result<Option<Registration>, StorageError> {
        let id = self.listeners.add(kind, mutation, callback);
        let registry: Weak<ListenerRegistry> = Arc::downgrade(&self.listeners);

        Ok(Some(Registration::new(move || {
            // The store may already be gone, taking its listeners with it.
            if let Some(registry) = registry.upgrade() {
                registry.remove(id);
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ListenerError;
    use parking_lot::Mutex;
    use serde_json::json;

    type Seen = Arc<Mutex<Vec<(String, Option<StoredValue>)>>>;

    fn recorder(seen: &Seen) -> MutationCallback {
        let seen = Arc::clone(seen);
        Arc::new(move |event: &MutationEvent<'_>| {
            let entry = match event {
                MutationEvent::Write { key, value } => (key.to_string(), Some((*value).clone())),
                MutationEvent::Delete { key } => (key.to_string(), None),
            };
            seen.lock().push(entry);
            Ok(())
        })
    }

    #[test]
    fn test_set_and_get() {
        let store = InMemoryStore::new();
        store.set_string("name", "kvtap").unwrap();
        store.set_number("count", 3).unwrap();
        store.set_bool("flag", true).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("name"), Some(StoredValue::from("kvtap")));
        assert_eq!(store.get("count").map(|v| v.kind()), Some(ValueKind::Number));
        assert_eq!(store.keys(), vec!["count", "flag", "name"]);
    }

    #[test]
    fn test_require_missing_key() {
        let store = InMemoryStore::new();
        assert!(matches!(store.require("nope"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_set_f64_rejects_nan() {
        let store = InMemoryStore::new();
        assert!(matches!(store.set_f64("x", f64::NAN), Err(StorageError::Serialization(_))));
        assert!(store.is_empty());
        store.set_f64("x", 1.5).unwrap();
        assert_eq!(store.get("x"), Some(StoredValue::Number(Number::from_f64(1.5).unwrap())));
    }

    #[test]
    fn test_write_notifies_only_matching_kind() {
        let store = InMemoryStore::new();
        let seen: Seen = Arc::default();
        let _reg = store
            .register(ValueKind::String, MutationKind::Write, recorder(&seen))
            .unwrap();

        store.set_string("a", "x").unwrap();
        store.set_number("b", 1).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "a");
    }

    #[test]
    fn test_remove_notifies_with_removed_kind() {
        let store = InMemoryStore::new();
        let seen: Seen = Arc::default();
        let _reg = store
            .register(ValueKind::Array, MutationKind::Delete, recorder(&seen))
            .unwrap();

        store.set_array("list", vec![json!(1)]).unwrap();
        store.set_string("text", "t").unwrap();
        assert!(store.remove("text").unwrap().is_some());
        assert!(store.remove("list").unwrap().is_some());
        assert!(store.remove("list").unwrap().is_none());

        let seen = seen.lock();
        assert_eq!(seen.as_slice(), &[("list".to_string(), None)]);
    }

    #[test]
    fn test_dropping_registration_removes_listener() {
        let store = InMemoryStore::new();
        let seen: Seen = Arc::default();
        let reg = store
            .register(ValueKind::Boolean, MutationKind::Write, recorder(&seen))
            .unwrap()
            .expect("in-memory store returns a registration");
        assert_eq!(store.listener_count(), 1);

        drop(reg);
        assert_eq!(store.listener_count(), 0);

        store.set_bool("flag", false).unwrap();
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_listener_error_propagates_after_write() {
        let store = InMemoryStore::new();
        let _reg = store
            .register(
                ValueKind::Object,
                MutationKind::Write,
                Arc::new(|_: &MutationEvent<'_>| Err(ListenerError::rejected("read only"))),
            )
            .unwrap();

        let mut map = Map::new();
        map.insert("a".into(), json!(1));
        let err = store.set_object("obj", map).unwrap_err();
        assert!(matches!(err, StorageError::Listener(_)));
        assert!(store.contains("obj"));
    }

    #[test]
    fn test_registration_outliving_store() {
        let store = InMemoryStore::new();
        let reg = store
            .register(ValueKind::String, MutationKind::Write, Arc::new(|_: &MutationEvent<'_>| Ok(())))
            .unwrap();
        drop(store);
        drop(reg);
    }
}
