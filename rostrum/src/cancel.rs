//! Cancellation registry — process-wide stop flags keyed by session id.
//!
//! The registry is the only state shared between a running debate and the
//! outside world. A stop request writes a flag here; the orchestrator polls
//! it at round starts and pacing ticks. Entries are per-session and must be
//! cleared when the run ends for any reason, so a stale flag never bleeds
//! into a future run that reuses the same identifier.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Shared reference to a [`CancellationRegistry`].
pub type SharedCancellationRegistry = Arc<CancellationRegistry>;

/// Map from session id to a cancellation flag.
///
/// An absent entry means "not cancelled". `request` is idempotent and
/// `is_requested` is a pure lookup; the orchestrator only needs to observe
/// a flag within one pacing tick of it being set, so a plain mutex-guarded
/// set is sufficient.
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    requested: Mutex<HashSet<String>>,
}

impl CancellationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared reference to this registry.
    pub fn shared(self) -> SharedCancellationRegistry {
        Arc::new(self)
    }

    /// Mark a session as cancelled. Idempotent.
    pub fn request(&self, session_id: &str) {
        let mut requested = self.guard();
        if requested.insert(session_id.to_string()) {
            debug!(session_id, "Cancellation requested");
        }
    }

    /// Whether cancellation has been requested for a session.
    pub fn is_requested(&self, session_id: &str) -> bool {
        self.guard().contains(session_id)
    }

    /// Remove a session's entry. Safe to call for unknown ids.
    pub fn clear(&self, session_id: &str) {
        if self.guard().remove(session_id) {
            debug!(session_id, "Cancellation flag cleared");
        }
    }

    // The flags are plain booleans, so a set left behind by a panicked
    // holder is still coherent — recover it instead of propagating poison.
    fn guard(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.requested
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_entry_is_not_cancelled() {
        let registry = CancellationRegistry::new();
        assert!(!registry.is_requested("session-1"));
    }

    #[test]
    fn test_request_then_lookup() {
        let registry = CancellationRegistry::new();
        registry.request("session-1");
        assert!(registry.is_requested("session-1"));
        assert!(!registry.is_requested("session-2"));
    }

    #[test]
    fn test_request_is_idempotent() {
        let registry = CancellationRegistry::new();
        registry.request("session-1");
        registry.request("session-1");
        assert!(registry.is_requested("session-1"));

        registry.clear("session-1");
        assert!(!registry.is_requested("session-1"));
    }

    #[test]
    fn test_clear_unknown_id_is_noop() {
        let registry = CancellationRegistry::new();
        registry.clear("never-started");
        assert!(!registry.is_requested("never-started"));
    }

    #[test]
    fn test_clear_allows_id_reuse() {
        let registry = CancellationRegistry::new();
        registry.request("conn-7");
        registry.clear("conn-7");
        // A future run under the same id starts uncancelled.
        assert!(!registry.is_requested("conn-7"));
    }

    #[test]
    fn test_shared_across_threads() {
        let registry = CancellationRegistry::new().shared();
        let writer = Arc::clone(&registry);
        let handle = std::thread::spawn(move || writer.request("session-x"));
        handle.join().unwrap();
        assert!(registry.is_requested("session-x"));
    }
}
