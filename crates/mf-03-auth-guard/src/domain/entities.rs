//! # Domain Entities

use serde::{Deserialize, Serialize};
use shared_types::RouteLocation;
use std::fmt;

/// Authentication state as seen by navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardState {
    /// No token.
    Unauthenticated,
    /// Token present, profile not yet verified.
    Resolving,
    /// Token verified.
    Authenticated,
    /// Last navigation was refused for a missing permission.
    Forbidden,
}

impl GuardState {
    /// Whether the state implies a live token.
    #[must_use]
    pub fn has_session(self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Resolving => "resolving",
            Self::Authenticated => "authenticated",
            Self::Forbidden => "forbidden",
        };
        f.write_str(name)
    }
}

/// Outcome of evaluating a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Proceed to the requested route.
    Allow,
    /// Go somewhere else instead.
    Redirect(RouteLocation),
}

impl GuardDecision {
    /// Whether the navigation may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Redirect target, if any.
    #[must_use]
    pub fn redirect_target(&self) -> Option<&RouteLocation> {
        match self {
            Self::Redirect(location) => Some(location),
            Self::Allow => None,
        }
    }
}
