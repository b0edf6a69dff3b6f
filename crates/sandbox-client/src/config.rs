//! # Bridge Configuration

use serde::{Deserialize, Serialize};
use shared_bus::DEFAULT_REQUEST_TIMEOUT_MS;
use std::time::Duration;

/// Sandbox bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// How long `request_auth_info` waits for the host.
    pub request_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl BridgeConfig {
    /// Short timeout for tests.
    pub fn for_testing() -> Self {
        Self {
            request_timeout_ms: 100,
        }
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
