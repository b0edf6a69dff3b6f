//! # Lifecycle Configuration

use serde::{Deserialize, Serialize};

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Force the reduced-isolation sandbox strategy for every sub-app.
    pub degrade: bool,
    /// Load sandboxes ahead of navigation once a session exists.
    pub preload_enabled: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            degrade: false,
            preload_enabled: true,
        }
    }
}

impl LifecycleConfig {
    /// Config for tests: no preloading, so tests drive every load.
    pub fn for_testing() -> Self {
        Self {
            degrade: false,
            preload_enabled: false,
        }
    }

    /// Apply what the host environment can actually isolate.
    #[must_use]
    pub fn with_capabilities(mut self, caps: IsolationCapabilities) -> Self {
        self.degrade = caps.resolve_degrade(self.degrade);
        self
    }
}

/// Isolation primitives available in the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolationCapabilities {
    /// Execution-context proxying.
    pub proxy: bool,
    /// Encapsulated custom elements.
    pub custom_elements: bool,
}

impl Default for IsolationCapabilities {
    fn default() -> Self {
        Self::full()
    }
}

impl IsolationCapabilities {
    /// Everything available.
    #[must_use]
    pub fn full() -> Self {
        Self {
            proxy: true,
            custom_elements: true,
        }
    }

    /// Degrade when asked to, or when a primitive is missing.
    #[must_use]
    pub fn resolve_degrade(self, requested: bool) -> bool {
        requested || !self.proxy || !self.custom_elements
    }
}
