//! # Credential Configuration
//!
//! Token lifetime assumptions driving the refresh timer.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Credential synchronizer configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Assumed lifetime of an issued token, in seconds.
    pub token_lifetime_secs: u64,

    /// Refresh this many seconds before the token expires.
    pub refresh_margin_secs: u64,

    /// Arm the refresh timer on login and on successful verification.
    pub auto_refresh: bool,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            token_lifetime_secs: 60 * 60,
            refresh_margin_secs: 5 * 60,
            auto_refresh: true,
        }
    }
}

impl CredentialConfig {
    /// Create a config for testing (one-minute tokens).
    pub fn for_testing() -> Self {
        Self {
            token_lifetime_secs: 60,
            refresh_margin_secs: 5,
            auto_refresh: true,
        }
    }

    /// Delay between arming the timer and refreshing.
    #[must_use]
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_secs(
            self.token_lifetime_secs
                .saturating_sub(self.refresh_margin_secs),
        )
    }
}
