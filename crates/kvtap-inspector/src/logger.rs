//! The mutation logger
//!
//! [`MutationLogger`] binds an engine to an [`InspectorConfig`]. Attaching
//! it to a [`DisplaySink`] yields a [`ConnectionHandle`] whose
//! `on_connect` / `on_disconnect` register and release the engine
//! listeners.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kvtap_storage::{
    ListenerError, MutationCallback, MutationEvent, MutationKind, Registration,
    TransactionRegistry, ValueKind,
};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::InspectorConfig;
use crate::error::InspectorError;
use crate::message::DisplayMessage;
use crate::sink::DisplaySink;

/// Storage inspector plugin, ready to be attached to a display sink
#[derive(Clone)]
pub struct MutationLogger {
    storage: Arc<dyn TransactionRegistry>,
    config: Arc<InspectorConfig>,
}

impl MutationLogger {
    pub fn new(storage: Arc<dyn TransactionRegistry>, config: InspectorConfig) -> Self {
        Self {
            storage,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    /// Bind to a display sink. Nothing is registered until `on_connect`.
    pub fn attach(&self, sink: Arc<dyn DisplaySink>) -> ConnectionHandle {
        ConnectionHandle {
            storage: Arc::clone(&self.storage),
            config: Arc::clone(&self.config),
            sink,
            session: Mutex::new(None),
        }
    }
}

/// Shorthand for `MutationLogger::new(storage, config).attach(sink)`
pub fn attach(
    storage: Arc<dyn TransactionRegistry>,
    config: InspectorConfig,
    sink: Arc<dyn DisplaySink>,
) -> ConnectionHandle {
    MutationLogger::new(storage, config).attach(sink)
}

/// Filters, formats and forwards events for one connected session
struct Forwarder {
    config: Arc<InspectorConfig>,
    sink: Arc<dyn DisplaySink>,
    active: AtomicBool,
}

impl Forwarder {
    fn handle(&self, event: &MutationEvent<'_>) -> Result<(), ListenerError> {
        // A dispatch snapshot taken before disconnect can still reach us.
        if !self.active.load(Ordering::Acquire) {
            return Ok(());
        }

        let key = event.key();
        if self.config.is_ignored(key) {
            trace!(key, "Ignoring mutation of ignored key");
            return Ok(());
        }

        let message = match event {
            MutationEvent::Write { key, value } => DisplayMessage::write(&self.config, key, value)?,
            MutationEvent::Delete { key } => DisplayMessage::delete(&self.config, key),
        };
        self.sink.display(message);
        Ok(())
    }
}

struct Session {
    forwarder: Arc<Forwarder>,
    registrations: Vec<Registration>,
}

impl Session {
    fn close(self) -> usize {
        self.forwarder.active.store(false, Ordering::Release);
        let released = self.registrations.len();
        for registration in self.registrations {
            registration.release();
        }
        released
    }
}

/// A logger attached to a sink
///
/// Lifecycle: unregistered, registered after [`on_connect`], unregistered
/// again after [`on_disconnect`]. Dropping the handle disconnects it.
///
/// [`on_connect`]: ConnectionHandle::on_connect
/// [`on_disconnect`]: ConnectionHandle::on_disconnect
pub struct ConnectionHandle {
    storage: Arc<dyn TransactionRegistry>,
    config: Arc<InspectorConfig>,
    sink: Arc<dyn DisplaySink>,
    session: Mutex<Option<Session>>,
}

impl ConnectionHandle {
    /// Register write and delete listeners for every value kind
    ///
    /// Already connected handles are left as they are. If the engine fails
    /// part way, the listeners registered so far are released and the
    /// error is returned.
    pub fn on_connect(&self) -> Result<(), InspectorError> {
        let mut session = self.session.lock();
        if session.is_some() {
            debug!(name = %self.config.name, "Already connected");
            return Ok(());
        }

        let forwarder = Arc::new(Forwarder {
            config: Arc::clone(&self.config),
            sink: Arc::clone(&self.sink),
            active: AtomicBool::new(true),
        });

        let mut registrations = Vec::with_capacity(ValueKind::ALL.len() * MutationKind::ALL.len());
        for mutation in MutationKind::ALL {
            for kind in ValueKind::ALL {
                let target = Arc::clone(&forwarder);
                let callback: MutationCallback =
                    Arc::new(move |event: &MutationEvent<'_>| target.handle(event));

                match self.storage.register(kind, mutation, callback) {
                    Ok(Some(registration)) => registrations.push(registration),
                    Ok(None) => {}
                    Err(err) => {
                        Session {
                            forwarder,
                            registrations,
                        }
                        .close();
                        return Err(err.into());
                    }
                }
            }
        }

        debug!(
            name = %self.config.name,
            registrations = registrations.len(),
            "Inspector connected"
        );
        *session = Some(Session {
            forwarder,
            registrations,
        });
        Ok(())
    }

    /// Release every registration taken by `on_connect`
    ///
    /// Each registration is released exactly once. Calling this while
    /// disconnected does nothing.
    pub fn on_disconnect(&self) {
        let Some(session) = self.session.lock().take() else {
            return;
        };
        // Released outside the lock; an engine may dispatch into us meanwhile.
        let released = session.close();
        debug!(name = %self.config.name, released, "Inspector disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Number of deregistration handles currently held
    pub fn registration_count(&self) -> usize {
        self.session
            .lock()
            .as_ref()
            .map_or(0, |session| session.registrations.len())
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.on_disconnect();
    }
}
