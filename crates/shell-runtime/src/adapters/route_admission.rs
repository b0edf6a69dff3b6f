//! Decides which sandbox-initiated route changes the host follows.
//!
//! A `sub-route-change` moves the host only when it comes from the active
//! sub-application, stays under that sub-application's routes and lands on
//! a route the auth guard allows as things stand.

use mf_03_auth_guard::AuthGuard;
use mf_04_lifecycle::LifecycleOrchestrator;
use mf_05_route_sync::{RouteError, RouteTable, SubRouteAdmission};
use shared_types::RouteLocation;
use std::sync::{Arc, Weak};
use tracing::debug;

/// `SubRouteAdmission` backed by the lifecycle and the auth guard.
pub struct ActiveRouteAdmission {
    lifecycle: Weak<LifecycleOrchestrator>,
    guard: Arc<AuthGuard>,
    route_table: Arc<RouteTable>,
}

impl ActiveRouteAdmission {
    /// The orchestrator is held weakly: it owns the route synchronizer this
    /// admission is attached to.
    pub fn new(
        lifecycle: &Arc<LifecycleOrchestrator>,
        guard: Arc<AuthGuard>,
        route_table: Arc<RouteTable>,
    ) -> Self {
        Self {
            lifecycle: Arc::downgrade(lifecycle),
            guard,
            route_table,
        }
    }
}

fn rejected(sub_app: &str, reason: &str) -> RouteError {
    RouteError::Rejected {
        sub_app: sub_app.to_string(),
        reason: reason.to_string(),
    }
}

impl SubRouteAdmission for ActiveRouteAdmission {
    fn admit(&self, sub_app: &str, location: &RouteLocation) -> Result<(), RouteError> {
        let lifecycle = self
            .lifecycle
            .upgrade()
            .ok_or_else(|| rejected(sub_app, "shell stopped"))?;
        if lifecycle.active().as_deref() != Some(sub_app) {
            return Err(rejected(sub_app, "not the active sub-application"));
        }

        let route = self.route_table.resolve(location);
        if route.binding().map(|b| b.sub_app.as_str()) != Some(sub_app) {
            return Err(rejected(sub_app, "outside the sub-application's routes"));
        }
        if !self.guard.admits(&route.target) {
            return Err(rejected(sub_app, "not allowed by the auth guard"));
        }

        debug!(sub_app = %sub_app, to = %location, "Sub-route change admitted");
        Ok(())
    }
}
