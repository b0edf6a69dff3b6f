//! # Cross-Crate Ports
//!
//! Traits that let the shell components reach each other (and the browser
//! primitives they sit on) without depending on concrete crates.
//!
//! - `SessionReader`: read-only access to the process-wide session
//! - `InstanceDisposer`: tear down every mounted sandbox (logout path)
//! - `HostNavigator`: the host router
//! - `TokenStore`: the session-scoped key-value slot holding the token

use crate::entities::SessionSnapshot;
use crate::errors::NavigationError;
use crate::routing::RouteLocation;
use parking_lot::{Mutex, RwLock};

/// Read-only access to the session. Only the credential synchronizer
/// mutates it; everyone else reads snapshots.
pub trait SessionReader: Send + Sync {
    /// Synchronous snapshot of the current session.
    fn snapshot(&self) -> SessionSnapshot;

    /// Whether a token is present.
    fn has_session(&self) -> bool {
        self.snapshot().is_logged_in()
    }
}

/// Disposes every mounted sandbox regardless of keep-alive policy.
pub trait InstanceDisposer: Send + Sync {
    /// Returns the number of instances disposed.
    fn dispose_all(&self) -> usize;
}

/// The host navigator (browser history / router).
pub trait HostNavigator: Send + Sync {
    /// Current location.
    fn current(&self) -> RouteLocation;

    /// Push a new history entry.
    fn push(&self, location: RouteLocation) -> Result<(), NavigationError>;

    /// Current path without query.
    fn current_path(&self) -> String {
        self.current().path
    }
}

/// Key-value slot for the credential token, scoped to the browsing session.
pub trait TokenStore: Send + Sync {
    /// Stored token, if any.
    fn load(&self) -> Option<String>;
    /// Overwrite the stored token.
    fn save(&self, token: &str);
    /// Remove the stored token.
    fn clear(&self);
}

// =============================================================================
// In-Memory Implementations
// =============================================================================

/// Token slot held in process memory.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token (boot with an existing session).
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.slot.read().clone()
    }

    fn save(&self, token: &str) {
        *self.slot.write() = Some(token.to_string());
    }

    fn clear(&self) {
        *self.slot.write() = None;
    }
}

/// History-stack navigator. Every successful `push` is one navigation event.
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<RouteLocation>>,
}

impl MemoryNavigator {
    /// Navigator positioned at `initial`.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![RouteLocation::parse(&initial.into())]),
        }
    }

    /// Every location visited, oldest first (including the initial one).
    pub fn history(&self) -> Vec<RouteLocation> {
        self.history.lock().clone()
    }

    /// Number of pushes performed since creation.
    pub fn push_count(&self) -> usize {
        self.history.lock().len().saturating_sub(1)
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HostNavigator for MemoryNavigator {
    fn current(&self) -> RouteLocation {
        self.history.lock().last().cloned().unwrap_or_default()
    }

    fn push(&self, location: RouteLocation) -> Result<(), NavigationError> {
        if location.path.is_empty() {
            return Err(NavigationError::InvalidLocation(location.to_url()));
        }
        self.history.lock().push(location);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_token_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert!(store.load().is_none());
        store.save("abc");
        assert_eq!(store.load().as_deref(), Some("abc"));
        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_navigator_counts_pushes() {
        let nav = MemoryNavigator::new("/home");
        assert_eq!(nav.current_path(), "/home");
        assert_eq!(nav.push_count(), 0);

        nav.push(RouteLocation::new("/order-system/list")).unwrap();
        assert_eq!(nav.current_path(), "/order-system/list");
        assert_eq!(nav.push_count(), 1);
    }

    #[test]
    fn test_navigator_rejects_empty_path() {
        let nav = MemoryNavigator::default();
        let bad = RouteLocation {
            path: String::new(),
            query: Default::default(),
        };
        assert!(nav.push(bad).is_err());
    }
}
