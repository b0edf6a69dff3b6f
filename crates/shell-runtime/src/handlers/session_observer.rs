//! Redirects the host to the login page when the session disappears.

use mf_03_auth_guard::AuthGuard;
use mf_05_route_sync::RouteSynchronizer;
use shared_bus::{BusPayload, Channel, MessageBus, SubscriptionToken};
use shell_telemetry::{log_event, metric_inc, SESSION_LOGOUTS};
use std::sync::Arc;
use tracing::warn;

/// Handler for `session-changed` broadcasts that clear the session.
pub struct SessionLossHandler {
    guard: Arc<AuthGuard>,
    routes: Arc<RouteSynchronizer>,
}

impl SessionLossHandler {
    /// Create the handler.
    pub fn new(guard: Arc<AuthGuard>, routes: Arc<RouteSynchronizer>) -> Self {
        Self { guard, routes }
    }

    /// Subscribe on `bus`.
    pub fn install(self, bus: &MessageBus) -> SubscriptionToken {
        bus.subscribe(Channel::SESSION_CHANGED, move |msg| {
            let BusPayload::SessionChanged(snapshot) = &msg.payload else {
                return;
            };
            if snapshot.is_logged_in() {
                return;
            }
            self.on_session_lost();
        })
    }

    fn on_session_lost(&self) {
        metric_inc!(SESSION_LOGOUTS);
        let current = self.routes.navigator().current();
        let Some(login) = self.guard.session_lost(&current) else {
            return;
        };
        log_event!(info, "session", "Session cleared; leaving protected page", from = %current, to = %login);
        if let Err(e) = self.routes.push_if_changed(login) {
            warn!(error = %e, "Login redirect failed");
        }
    }
}
