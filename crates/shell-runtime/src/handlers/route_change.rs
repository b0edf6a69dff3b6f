//! Records sandbox-initiated navigation on the lifecycle side.

use mf_04_lifecycle::LifecycleOrchestrator;
use mf_05_route_sync::RouteSynchronizer;
use shared_bus::{BusPayload, Channel, MessageBus, SubscriptionToken};
use shell_telemetry::ROUTE_SYNC_PUSHES;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Handler for `sub-route-change`. Must be installed after the route
/// synchronizer's own subscription so the push count is already updated.
pub struct RouteChangeHandler {
    lifecycle: Arc<LifecycleOrchestrator>,
    routes: Arc<RouteSynchronizer>,
    seen_pushes: AtomicU64,
}

impl RouteChangeHandler {
    /// Create the handler.
    pub fn new(lifecycle: Arc<LifecycleOrchestrator>, routes: Arc<RouteSynchronizer>) -> Self {
        let seen_pushes = AtomicU64::new(routes.push_count());
        Self {
            lifecycle,
            routes,
            seen_pushes,
        }
    }

    /// Subscribe on `bus`.
    pub fn install(self, bus: &MessageBus) -> SubscriptionToken {
        bus.subscribe(Channel::SUB_ROUTE_CHANGE, move |msg| {
            if let BusPayload::SubRouteChange {
                sub_app_name,
                relative_path,
            } = &msg.payload
            {
                if !self.lifecycle.record_route(sub_app_name, relative_path) {
                    debug!(sub_app = %sub_app_name, "Route change from a sandbox that is not live");
                }
            }
            self.flush_push_metric();
        })
    }

    fn flush_push_metric(&self) {
        let total = self.routes.push_count();
        let previous = self.seen_pushes.swap(total, Ordering::Relaxed);
        if total > previous {
            ROUTE_SYNC_PUSHES.inc_by(total - previous);
        }
    }
}
