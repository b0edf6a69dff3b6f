//! # Outbound Ports
//!
//! The sandbox technology and lifecycle observers.

use crate::domain::{SandboxError, SandboxHandle, SandboxStrategy};
use async_trait::async_trait;
use mf_01_registry::SubAppDescriptor;
use parking_lot::Mutex;
use shared_bus::MessageBus;
use shared_types::{MountProps, SessionSnapshot};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Sandbox technology capability.
///
/// The synchronous methods are called while the orchestrator holds its
/// instance lock. They must not call back into the orchestrator or publish
/// on the bus.
#[async_trait]
pub trait SandboxRuntime: Send + Sync {
    /// Register the sub-application with the runtime (no loading).
    fn setup_app(&self, descriptor: &SubAppDescriptor, strategy: SandboxStrategy);

    /// Fetch and evaluate the entry; returns the new sandbox.
    async fn preload_app(
        &self,
        descriptor: &SubAppDescriptor,
        strategy: SandboxStrategy,
    ) -> Result<SandboxHandle, SandboxError>;

    /// Render the sub-application with its mount-time props.
    async fn start_app(&self, handle: &SandboxHandle, props: &MountProps)
        -> Result<(), SandboxError>;

    /// Hand the session to the sandbox.
    fn inject_session(&self, handle: &SandboxHandle, session: &SessionSnapshot);

    /// Move the sandbox's internal router to `relative_path`.
    fn sync_route(&self, handle: &SandboxHandle, relative_path: &str);

    /// Make the sandbox visible.
    fn activate_app(&self, handle: &SandboxHandle);

    /// Hide the sandbox, keeping its state.
    fn deactivate_app(&self, handle: &SandboxHandle);

    /// Destroy the sandbox and release its resources.
    fn destroy_app(&self, handle: &SandboxHandle);

    /// Bus shared between the host and the sandboxes.
    fn bus(&self) -> Arc<MessageBus>;
}

/// Lifecycle observers. Every method defaults to a log line.
pub trait LifecycleHooks: Send + Sync {
    /// A sandbox is about to load.
    fn before_load(&self, sub_app: &str) {
        debug!(sub_app = %sub_app, "beforeLoad");
    }

    /// A sandbox is about to render.
    fn before_mount(&self, sub_app: &str) {
        debug!(sub_app = %sub_app, "beforeMount");
    }

    /// A sandbox rendered.
    fn after_mount(&self, sub_app: &str) {
        info!(sub_app = %sub_app, "afterMount");
    }

    /// A sandbox is about to be destroyed.
    fn before_unmount(&self, sub_app: &str) {
        debug!(sub_app = %sub_app, "beforeUnmount");
    }

    /// A sandbox was destroyed.
    fn after_unmount(&self, sub_app: &str) {
        info!(sub_app = %sub_app, "afterUnmount");
    }

    /// A sandbox became visible.
    fn activated(&self, sub_app: &str) {
        debug!(sub_app = %sub_app, "activated");
    }

    /// A keep-alive sandbox was hidden.
    fn deactivated(&self, sub_app: &str) {
        debug!(sub_app = %sub_app, "deactivated");
    }

    /// Loading or starting failed.
    fn load_error(&self, sub_app: &str, error: &SandboxError) {
        warn!(sub_app = %sub_app, error = %error, "loadError");
    }
}

/// Hooks that only log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHooks;

impl LifecycleHooks for TracingHooks {}

// =============================================================================
// Mock Implementation (for testing)
// =============================================================================

/// In-memory sandbox runtime that records every call.
pub struct MockSandboxRuntime {
    bus: Arc<MessageBus>,
    next_id: AtomicU64,
    live: Mutex<HashMap<u64, String>>,
    setups: Mutex<Vec<(String, SandboxStrategy)>>,
    preload_failures: Mutex<HashMap<String, SandboxError>>,
    start_failures: Mutex<HashMap<String, SandboxError>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    preloads: AtomicU64,
    starts: AtomicU64,
    injections: Mutex<Vec<(String, SessionSnapshot)>>,
    props: Mutex<HashMap<String, MountProps>>,
    route_syncs: Mutex<Vec<(String, String)>>,
    activations: AtomicU64,
    deactivations: AtomicU64,
    destroyed: Mutex<Vec<SandboxHandle>>,
}

impl MockSandboxRuntime {
    /// Runtime on the given bus.
    pub fn new(bus: Arc<MessageBus>) -> Self {
        Self {
            bus,
            next_id: AtomicU64::new(1),
            live: Mutex::new(HashMap::new()),
            setups: Mutex::new(Vec::new()),
            preload_failures: Mutex::new(HashMap::new()),
            start_failures: Mutex::new(HashMap::new()),
            gate: Mutex::new(None),
            preloads: AtomicU64::new(0),
            starts: AtomicU64::new(0),
            injections: Mutex::new(Vec::new()),
            props: Mutex::new(HashMap::new()),
            route_syncs: Mutex::new(Vec::new()),
            activations: AtomicU64::new(0),
            deactivations: AtomicU64::new(0),
            destroyed: Mutex::new(Vec::new()),
        }
    }

    /// Make every preload of `sub_app` fail.
    pub fn fail_preload(&self, sub_app: &str, error: SandboxError) {
        self.preload_failures.lock().insert(sub_app.to_string(), error);
    }

    /// Make every start of `sub_app` fail.
    pub fn fail_start(&self, sub_app: &str, error: SandboxError) {
        self.start_failures.lock().insert(sub_app.to_string(), error);
    }

    /// Remove configured failures.
    pub fn clear_failures(&self) {
        self.preload_failures.lock().clear();
        self.start_failures.lock().clear();
    }

    /// Park every subsequent preload until `release_preloads`.
    pub fn hold_preloads(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` parked (or future) preloads through.
    pub fn release_preloads(&self, n: usize) {
        if let Some(gate) = self.gate.lock().as_ref() {
            gate.add_permits(n);
        }
    }

    /// Registered sub-apps with their strategy.
    pub fn setups(&self) -> Vec<(String, SandboxStrategy)> {
        self.setups.lock().clone()
    }

    /// `preload_app` calls.
    pub fn preload_calls(&self) -> u64 {
        self.preloads.load(Ordering::SeqCst)
    }

    /// `start_app` calls.
    pub fn start_calls(&self) -> u64 {
        self.starts.load(Ordering::SeqCst)
    }

    /// Every session injection, oldest first.
    pub fn injections(&self) -> Vec<(String, SessionSnapshot)> {
        self.injections.lock().clone()
    }

    /// Last session injected into `sub_app`.
    pub fn last_injection(&self, sub_app: &str) -> Option<SessionSnapshot> {
        self.injections
            .lock()
            .iter()
            .rev()
            .find(|(name, _)| name == sub_app)
            .map(|(_, snapshot)| snapshot.clone())
    }

    /// Props of the last start of `sub_app`.
    pub fn props(&self, sub_app: &str) -> Option<MountProps> {
        self.props.lock().get(sub_app).cloned()
    }

    /// Every `sync_route` call as `(sub_app, relative_path)`.
    pub fn route_syncs(&self) -> Vec<(String, String)> {
        self.route_syncs.lock().clone()
    }

    /// `activate_app` calls.
    pub fn activations(&self) -> u64 {
        self.activations.load(Ordering::SeqCst)
    }

    /// `deactivate_app` calls.
    pub fn deactivations(&self) -> u64 {
        self.deactivations.load(Ordering::SeqCst)
    }

    /// Destroyed sandboxes, oldest first.
    pub fn destroyed(&self) -> Vec<SandboxHandle> {
        self.destroyed.lock().clone()
    }

    /// Sandboxes not yet destroyed for `sub_app`.
    pub fn live_count(&self, sub_app: &str) -> usize {
        self.live.lock().values().filter(|name| *name == sub_app).count()
    }
}

#[async_trait]
impl SandboxRuntime for MockSandboxRuntime {
    fn setup_app(&self, descriptor: &SubAppDescriptor, strategy: SandboxStrategy) {
        self.setups.lock().push((descriptor.name.clone(), strategy));
    }

    async fn preload_app(
        &self,
        descriptor: &SubAppDescriptor,
        strategy: SandboxStrategy,
    ) -> Result<SandboxHandle, SandboxError> {
        self.preloads.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if let Some(err) = self.preload_failures.lock().get(&descriptor.name) {
            return Err(err.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.live.lock().insert(id, descriptor.name.clone());
        Ok(SandboxHandle {
            id,
            sub_app: descriptor.name.clone(),
            strategy,
        })
    }

    async fn start_app(&self, handle: &SandboxHandle, props: &MountProps) -> Result<(), SandboxError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if !self.live.lock().contains_key(&handle.id) {
            return Err(SandboxError::UnknownHandle(handle.id));
        }
        if let Some(err) = self.start_failures.lock().get(&handle.sub_app) {
            return Err(err.clone());
        }
        self.props.lock().insert(handle.sub_app.clone(), props.clone());
        Ok(())
    }

    fn inject_session(&self, handle: &SandboxHandle, session: &SessionSnapshot) {
        self.injections
            .lock()
            .push((handle.sub_app.clone(), session.clone()));
    }

    fn sync_route(&self, handle: &SandboxHandle, relative_path: &str) {
        self.route_syncs
            .lock()
            .push((handle.sub_app.clone(), relative_path.to_string()));
    }

    fn activate_app(&self, _handle: &SandboxHandle) {
        self.activations.fetch_add(1, Ordering::SeqCst);
    }

    fn deactivate_app(&self, _handle: &SandboxHandle) {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy_app(&self, handle: &SandboxHandle) {
        self.live.lock().remove(&handle.id);
        self.destroyed.lock().push(handle.clone());
    }

    fn bus(&self) -> Arc<MessageBus> {
        self.bus.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_tracks_live_sandboxes() {
        let runtime = MockSandboxRuntime::new(Arc::new(MessageBus::new()));
        let desc = SubAppDescriptor::new("order-system", "http://localhost:8003/");

        let handle = runtime
            .preload_app(&desc, SandboxStrategy::Isolated)
            .await
            .unwrap();
        assert_eq!(runtime.live_count("order-system"), 1);

        runtime.destroy_app(&handle);
        assert_eq!(runtime.live_count("order-system"), 0);

        let err = runtime
            .start_app(&handle, &MountProps::default())
            .await
            .unwrap_err();
        assert_eq!(err, SandboxError::UnknownHandle(handle.id));
    }

    #[tokio::test]
    async fn test_mock_preload_failure() {
        let runtime = MockSandboxRuntime::new(Arc::new(MessageBus::new()));
        runtime.fail_preload(
            "user-center",
            SandboxError::Script("syntax error".to_string()),
        );
        let desc = SubAppDescriptor::new("user-center", "http://localhost:8001/");
        assert!(runtime
            .preload_app(&desc, SandboxStrategy::Degraded)
            .await
            .is_err());
        assert_eq!(runtime.preload_calls(), 1);
    }
}
