//! # Route Synchronizer Service
//!
//! Translates between host and sandbox paths and reflects sandbox-initiated
//! navigation into the host navigator.

use crate::domain::{host_to_sub, sub_to_host, RouteError};
use crate::ports::SubRouteAdmission;
use mf_01_registry::{RegistryError, SubAppDescriptor, SubAppRegistry};
use parking_lot::RwLock;
use shared_bus::{BusPayload, Channel, MessageBus, SubscriptionToken};
use shared_types::{HostNavigator, RouteLocation};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Route Synchronizer.
pub struct RouteSynchronizer {
    registry: Arc<SubAppRegistry>,
    navigator: Arc<dyn HostNavigator>,
    bus: Arc<MessageBus>,
    admission: RwLock<Option<Arc<dyn SubRouteAdmission>>>,
    pushes: AtomicU64,
    suppressed: AtomicU64,
    rejected: AtomicU64,
}

impl RouteSynchronizer {
    /// Create the synchronizer.
    pub fn new(
        registry: Arc<SubAppRegistry>,
        navigator: Arc<dyn HostNavigator>,
        bus: Arc<MessageBus>,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            navigator,
            bus,
            admission: RwLock::new(None),
            pushes: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        })
    }

    /// Submit every sandbox-initiated change to `admission` before pushing.
    pub fn set_admission(&self, admission: Arc<dyn SubRouteAdmission>) {
        *self.admission.write() = Some(admission);
    }

    /// Subscribe to `sub-route-change`.
    pub fn install(self: &Arc<Self>) -> SubscriptionToken {
        let weak = Arc::downgrade(self);
        self.bus.subscribe(Channel::SUB_ROUTE_CHANGE, move |msg| {
            let Some(this) = weak.upgrade() else { return };
            let BusPayload::SubRouteChange {
                sub_app_name,
                relative_path,
            } = &msg.payload
            else {
                warn!(sender = %msg.sender_id, kind = msg.payload.kind(), "Malformed sub-route-change");
                return;
            };
            if let Err(e) = this.on_sub_route_change(sub_app_name, relative_path) {
                warn!(sub_app = %sub_app_name, path = %relative_path, error = %e, "Sub-route change ignored");
            }
        })
    }

    /// Relative path the named sandbox should show for `host_path`.
    pub fn host_to_sub(&self, sub_app: &str, host_path: &str) -> Result<String, RouteError> {
        host_to_sub(&*self.descriptor(sub_app)?, host_path)
    }

    /// Host path of a sandbox-relative path.
    pub fn sub_to_host(&self, sub_app: &str, relative_path: &str) -> Result<String, RouteError> {
        Ok(sub_to_host(&*self.descriptor(sub_app)?, relative_path))
    }

    /// A sandbox navigated internally. Returns whether the host navigator
    /// was pushed.
    pub fn on_sub_route_change(
        &self,
        sub_app: &str,
        relative_path: &str,
    ) -> Result<bool, RouteError> {
        let location = RouteLocation::new(self.sub_to_host(sub_app, relative_path)?);
        debug!(sub_app = %sub_app, relative = %relative_path, host = %location, "Sub-route change");
        let admission = self.admission.read().clone();
        if let Some(admission) = admission {
            if let Err(e) = admission.admit(sub_app, &location) {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        }
        self.push_if_changed(location)
    }

    /// Push `location` unless the navigator is already on its path.
    pub fn push_if_changed(&self, location: RouteLocation) -> Result<bool, RouteError> {
        if self.navigator.current_path() == location.path {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            debug!(path = %location.path, "Host already on path; push suppressed");
            return Ok(false);
        }
        info!(to = %location, "Syncing host navigator");
        self.navigator.push(location)?;
        self.pushes.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Host navigator.
    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn HostNavigator> {
        &self.navigator
    }

    /// Pushes performed.
    #[must_use]
    pub fn push_count(&self) -> u64 {
        self.pushes.load(Ordering::Relaxed)
    }

    /// Pushes skipped because the host was already there.
    #[must_use]
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    /// Sandbox-initiated changes refused by the admission.
    #[must_use]
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    fn descriptor(&self, sub_app: &str) -> Result<Arc<SubAppDescriptor>, RouteError> {
        self.registry.resolve(sub_app).map_err(|e| match e {
            RegistryError::NotFound(name) => RouteError::UnknownSubApp(name),
            other => RouteError::UnknownSubApp(other.to_string()),
        })
    }
}
