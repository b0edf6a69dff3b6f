//! # Domain Entities

use serde::{Deserialize, Serialize};
use shared_types::{RouteLocation, RouteMeta, RouteTarget};

/// `(host_path, sub_app) ⇄ relative_path`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteBinding {
    /// Full host path.
    pub host_path: String,
    /// Owning sub-application.
    pub sub_app: String,
    /// Path inside the sandbox.
    pub relative_path: String,
}

/// Kind of host route a path resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteKind {
    /// Host landing page.
    Home,
    /// Login page.
    Login,
    /// Registration page.
    Register,
    /// Password recovery page.
    ForgotPassword,
    /// Missing-permission page.
    Forbidden,
    /// A sub-application prefix route.
    SubApp(RouteBinding),
    /// Catch-all.
    NotFound,
}

/// A resolved host route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// What matched.
    pub kind: RouteKind,
    /// Location and metadata, ready for the auth guard.
    pub target: RouteTarget,
}

impl RouteMatch {
    /// Build a match.
    #[must_use]
    pub fn new(kind: RouteKind, location: RouteLocation, meta: RouteMeta) -> Self {
        Self {
            kind,
            target: RouteTarget::new(location, meta),
        }
    }

    /// Sub-application binding, if this is a sub-application route.
    #[must_use]
    pub fn binding(&self) -> Option<&RouteBinding> {
        match &self.kind {
            RouteKind::SubApp(binding) => Some(binding),
            _ => None,
        }
    }
}
