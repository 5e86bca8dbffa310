//! Shared namespace of pending script callbacks
//!
//! The script-callback transport hands every query a uniquely named global
//! callback, then waits for the remote script to invoke it. This module is
//! that shared namespace: a concurrency-safe map from callback discriminator
//! to the completion handle the owning query awaits. A registration is
//! created before the script goes out and consumed on the first terminal
//! transition, so no entry outlives its query and concurrent queries never
//! collide.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

use super::script::LoadError;

/// What a pending callback resolves to
#[derive(Debug)]
pub enum ScriptOutcome {
    /// The script invoked the callback with this payload
    Invoked(Value),
    /// The script could not be loaded at all
    LoadFailed(LoadError),
}

/// Concurrency-safe registry of callbacks awaited by in-flight queries
pub struct CallbackNamespace {
    /// Monotonic discriminator source; never reused within a process
    next_id: AtomicU64,
    /// Pending completions by discriminator
    pending: Mutex<HashMap<u64, oneshot::Sender<ScriptOutcome>>>,
}

impl CallbackNamespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Register a fresh callback
    ///
    /// Returns the discriminator and the handle the owning query awaits.
    pub fn register(&self) -> (u64, oneshot::Receiver<ScriptOutcome>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);
        (id, rx)
    }

    /// Deliver `outcome` to the query owning `id`, consuming the registration
    ///
    /// Returns false when the query already reached a terminal state and the
    /// registration is gone.
    pub fn dispatch(&self, id: u64, outcome: ScriptOutcome) -> bool {
        let sender = self.pending.lock().unwrap().remove(&id);
        match sender {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Drop a registration without delivering anything; idempotent
    pub fn unregister(&self, id: u64) -> bool {
        self.pending.lock().unwrap().remove(&id).is_some()
    }

    /// Check whether `id` is still awaited
    pub fn contains(&self, id: u64) -> bool {
        self.pending.lock().unwrap().contains_key(&id)
    }

    /// Number of callbacks still awaited
    pub fn len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Check if no callbacks are pending
    pub fn is_empty(&self) -> bool {
        self.pending.lock().unwrap().is_empty()
    }
}

impl Default for CallbackNamespace {
    fn default() -> Self {
        Self::new()
    }
}

/// Script-visible name for callback `id`
///
/// Valid as an identifier in the scripting environments engines target, and
/// unique across concurrently pending queries.
pub fn callback_name(id: u64) -> String {
    format!("aerostart_cb_{}", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_dispatch() {
        let namespace = CallbackNamespace::new();
        let (id, rx) = namespace.register();
        assert!(namespace.contains(id));

        assert!(namespace.dispatch(id, ScriptOutcome::Invoked(json!(["a"]))));
        assert!(!namespace.contains(id));

        match rx.await.unwrap() {
            ScriptOutcome::Invoked(payload) => assert_eq!(payload, json!(["a"])),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_discriminators_are_unique() {
        let namespace = CallbackNamespace::new();
        let (a, _rx_a) = namespace.register();
        let (b, _rx_b) = namespace.register();
        assert_ne!(a, b);
        assert_ne!(callback_name(a), callback_name(b));
        assert_eq!(namespace.len(), 2);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let namespace = CallbackNamespace::new();
        let (id, _rx) = namespace.register();
        assert!(namespace.unregister(id));
        assert!(!namespace.unregister(id));
        assert!(!namespace.dispatch(id, ScriptOutcome::Invoked(json!(null))));
    }

    #[test]
    fn test_callback_name_is_identifier_safe() {
        let name = callback_name(42);
        assert_eq!(name, "aerostart_cb_42");
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }
}
