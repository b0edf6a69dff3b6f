//! # Guard Configuration
//!
//! Well-known routes and the boot-time verification policy.

use crate::domain::GuardError;
use serde::{Deserialize, Serialize};

/// What to do when verifying a stored token fails for a reason other than
/// 401 (a 401 always ends the session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyFailurePolicy {
    /// Drop the session and send the user to login.
    #[default]
    FailClosed,
    /// Keep the token (the backend may just be down) and continue as
    /// authenticated without a resolved profile.
    FailOpen,
}

/// Auth guard configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Login route.
    pub login_path: String,
    /// Landing route after login.
    pub home_path: String,
    /// Route shown for missing permissions.
    pub forbidden_path: String,
    /// Routes reachable without a session.
    pub public_paths: Vec<String>,
    /// Query key carrying the original target to the login route.
    pub redirect_param: String,
    /// Non-401 verification failure policy.
    pub verify_failure: VerifyFailurePolicy,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
            forbidden_path: "/403".to_string(),
            public_paths: vec![
                "/login".to_string(),
                "/register".to_string(),
                "/forgot-password".to_string(),
            ],
            redirect_param: "redirect".to_string(),
            verify_failure: VerifyFailurePolicy::FailClosed,
        }
    }
}

impl GuardConfig {
    /// Create a config for testing.
    pub fn for_testing() -> Self {
        Self::default()
    }

    /// Whether `path` is listed as public.
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<(), GuardError> {
        for (field, value) in [
            ("login_path", &self.login_path),
            ("home_path", &self.home_path),
            ("forbidden_path", &self.forbidden_path),
        ] {
            if !value.starts_with('/') {
                return Err(GuardError::RelativePath {
                    field,
                    value: value.clone(),
                });
            }
        }
        if let Some(bad) = self.public_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(GuardError::RelativePath {
                field: "public_paths",
                value: bad.clone(),
            });
        }
        if !self.is_public(&self.login_path) {
            return Err(GuardError::LoginNotPublic(self.login_path.clone()));
        }
        if self.redirect_param.is_empty() {
            return Err(GuardError::EmptyRedirectKey);
        }
        Ok(())
    }
}
