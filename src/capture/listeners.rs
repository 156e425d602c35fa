//! Registry of callbacks notified for every new entry
//!
//! Registration and removal replace the listener list wholesale; fan-out
//! iterates a snapshot of the list taken before the first callback runs, so
//! a callback may register or remove listeners (itself included) without
//! affecting delivery of the current entry.

use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use tracing::warn;
use uuid::Uuid;

use super::entry::LogEntry;

/// Callback invoked with each newly captured entry
pub type Listener = Arc<dyn Fn(&LogEntry) + Send + Sync>;

/// Opaque handle identifying a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

thread_local! {
    // Set while this thread reports a listener panic; the report itself may
    // be captured and fanned out again.
    static REPORTING: Cell<bool> = const { Cell::new(false) };
}

/// Copy-on-write set of listeners
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Arc<Vec<(ListenerId, Listener)>>>,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback
    pub fn add(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(Uuid::new_v4());
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let mut next = Vec::with_capacity(listeners.len() + 1);
        next.extend(listeners.iter().cloned());
        next.push((id, listener));
        *listeners = Arc::new(next);
        id
    }

    /// Remove a callback; returns false if it was not registered
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        if !listeners.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        let next: Vec<_> = listeners
            .iter()
            .filter(|(existing, _)| *existing != id)
            .cloned()
            .collect();
        *listeners = Arc::new(next);
        true
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Check if no listener is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Arc<Vec<(ListenerId, Listener)>> {
        Arc::clone(&self.listeners.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Invoke every listener registered at call time with `entry`
    ///
    /// Must be called without holding any capture lock. A panicking listener
    /// is isolated: the remaining listeners still run and the panic never
    /// reaches the caller.
    pub fn notify(&self, entry: &LogEntry) {
        let listeners = self.snapshot();
        for (id, listener) in listeners.iter() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener(entry)));
            if let Err(payload) = result {
                report_panic(*id, payload.as_ref());
            }
        }
    }
}

fn report_panic(id: ListenerId, payload: &(dyn std::any::Any + Send)) {
    if REPORTING.with(|r| r.replace(true)) {
        return;
    }
    let reason = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    warn!(listener = %id, "Log listener panicked: {}", reason);
    REPORTING.with(|r| r.set(false));
}
