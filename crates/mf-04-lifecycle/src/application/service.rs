//! # Lifecycle Orchestrator Service
//!
//! Owns the instance table. Every await (preload, start) is bracketed by
//! short critical sections; a completion is applied only if the instance
//! still carries the generation it was started with.
//!
//! Lock order: instances, then the session (through `SessionReader`).

use crate::config::LifecycleConfig;
use crate::domain::{
    Activation, InstanceStatus, LifecycleError, MountedInstance, PreloadOutcome, SandboxHandle,
    SandboxStrategy,
};
use crate::ports::{LifecycleHooks, SandboxRuntime, TracingHooks};
use mf_01_registry::{SubAppDescriptor, SubAppRegistry};
use mf_05_route_sync::RouteSynchronizer;
use parking_lot::Mutex;
use shared_types::{normalize_path, InstanceDisposer, MountProps, SessionReader};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What `navigate_to` has to do after inspecting the instance.
enum Step {
    /// Instance was Active or Inactive; already handled under the lock.
    Done(Activation, bool),
    /// Sandbox loaded; render it.
    Start(SandboxHandle, u64),
    /// No usable sandbox; load one (destroying the previous one, if any).
    Load(u64, Option<SandboxHandle>),
}

/// Lifecycle Orchestrator.
pub struct LifecycleOrchestrator {
    config: LifecycleConfig,
    registry: Arc<SubAppRegistry>,
    routes: Arc<RouteSynchronizer>,
    session: Arc<dyn SessionReader>,
    runtime: Option<Arc<dyn SandboxRuntime>>,
    hooks: Arc<dyn LifecycleHooks>,
    instances: Mutex<HashMap<String, MountedInstance>>,
    next_generation: AtomicU64,
}

impl LifecycleOrchestrator {
    /// Create the orchestrator. Without a runtime nothing can be mounted.
    pub fn new(
        config: LifecycleConfig,
        registry: Arc<SubAppRegistry>,
        routes: Arc<RouteSynchronizer>,
        session: Arc<dyn SessionReader>,
        runtime: Option<Arc<dyn SandboxRuntime>>,
    ) -> Self {
        if runtime.is_none() {
            warn!("No sandbox runtime; sub-applications will not be mounted");
        }
        Self {
            config,
            registry,
            routes,
            session,
            runtime,
            hooks: Arc::new(TracingHooks),
            instances: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Replace the lifecycle hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn LifecycleHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Register every descriptor with the runtime. Returns how many were
    /// set up.
    pub fn setup_all(&self) -> usize {
        let Some(runtime) = &self.runtime else {
            return 0;
        };
        let descriptors = self.registry.list();
        let mut instances = self.instances.lock();
        for descriptor in &descriptors {
            let strategy = self.strategy_for(descriptor);
            runtime.setup_app(descriptor, strategy);
            instances
                .entry(descriptor.name.clone())
                .or_insert_with(|| MountedInstance::new(&descriptor.name, descriptor.keep_alive));
            debug!(sub_app = %descriptor.name, strategy = %strategy, "Sub-application set up");
        }
        info!(count = descriptors.len(), "Sub-applications registered with runtime");
        descriptors.len()
    }

    /// Load a sandbox ahead of navigation. Best effort: failures leave the
    /// instance in `Error` and are reported, never raised.
    pub async fn preload(&self, name: &str) -> PreloadOutcome {
        let Some(runtime) = self.runtime.clone() else {
            return PreloadOutcome::Unsupported;
        };
        if !self.session.has_session() {
            debug!(sub_app = %name, "Preload skipped: no session");
            return PreloadOutcome::SkippedNoSession;
        }
        let descriptor = match self.registry.resolve(name) {
            Ok(descriptor) => descriptor,
            Err(e) => return PreloadOutcome::Failed(e.to_string()),
        };

        let (generation, stale) = {
            let mut instances = self.instances.lock();
            let inst = instances
                .entry(name.to_string())
                .or_insert_with(|| MountedInstance::new(name, descriptor.keep_alive));
            if inst.status.is_live() {
                return PreloadOutcome::AlreadyLive;
            }
            let generation = self.bump_generation();
            match inst.begin_load(generation) {
                Ok(stale) => (generation, stale),
                Err(e) => return PreloadOutcome::Failed(e.to_string()),
            }
        };
        if let Some(stale) = stale {
            runtime.destroy_app(&stale);
        }

        match self.load(&runtime, &descriptor, generation).await {
            Ok(_) => PreloadOutcome::Loaded,
            Err(LifecycleError::Superseded(_)) => PreloadOutcome::Superseded,
            Err(LifecycleError::NoSession(_)) => PreloadOutcome::SkippedNoSession,
            Err(e) => PreloadOutcome::Failed(e.to_string()),
        }
    }

    /// Preload every registered sub-application, in registration order.
    pub async fn preload_all(&self) -> Vec<(String, PreloadOutcome)> {
        let names = self.registry.names();
        if !self.config.preload_enabled {
            return names
                .into_iter()
                .map(|name| (name, PreloadOutcome::SkippedDisabled))
                .collect();
        }
        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            let outcome = self.preload(&name).await;
            outcomes.push((name, outcome));
        }
        outcomes
    }

    /// Show the sub-application `name` at `host_path`.
    ///
    /// Loads and renders the sandbox if needed, injects the current session
    /// and activates it. A keep-alive instance that was hidden is reused.
    pub async fn navigate_to(
        &self,
        name: &str,
        host_path: &str,
    ) -> Result<Activation, LifecycleError> {
        let runtime = self.runtime.clone().ok_or(LifecycleError::NoRuntime)?;
        let descriptor = self
            .registry
            .resolve(name)
            .map_err(|_| LifecycleError::UnknownSubApp(name.to_string()))?;
        let relative = self.routes.host_to_sub(name, host_path)?;
        if !self.session.has_session() {
            return Err(LifecycleError::NoSession(name.to_string()));
        }

        let step = {
            let mut instances = self.instances.lock();
            let inst = instances
                .entry(name.to_string())
                .or_insert_with(|| MountedInstance::new(name, descriptor.keep_alive));
            self.plan(runtime.as_ref(), inst, &relative)?
        };

        let (handle, generation) = match step {
            Step::Done(activation, resumed) => {
                if resumed {
                    self.hooks.activated(name);
                }
                return Ok(activation);
            }
            Step::Start(handle, generation) => (handle, generation),
            Step::Load(generation, stale) => {
                if let Some(stale) = stale {
                    runtime.destroy_app(&stale);
                }
                let handle = self.load(&runtime, &descriptor, generation).await?;
                (handle, generation)
            }
        };

        self.start(&runtime, &descriptor, handle, generation, relative)
            .await
    }

    /// Hide or destroy the sandbox of `name`. Returns the resulting status,
    /// or `None` if the sub-application has no instance.
    pub fn deactivate(&self, name: &str) -> Option<InstanceStatus> {
        let retired = {
            let mut instances = self.instances.lock();
            let inst = instances.get_mut(name)?;
            match inst.status {
                InstanceStatus::Active if inst.keep_alive => {
                    if let Err(e) = inst.transition(InstanceStatus::Inactive) {
                        warn!(sub_app = %name, error = %e, "Deactivation refused");
                        return Some(inst.status);
                    }
                    if let (Some(runtime), Some(handle)) = (&self.runtime, &inst.sandbox) {
                        runtime.deactivate_app(handle);
                    }
                    None
                }
                InstanceStatus::Inactive | InstanceStatus::Registered | InstanceStatus::Disposed => {
                    return Some(inst.status);
                }
                _ => Some(self.retire(inst)),
            }
        };

        match retired {
            None => {
                self.hooks.deactivated(name);
                Some(InstanceStatus::Inactive)
            }
            Some(handle) => {
                self.destroy(name, handle);
                Some(InstanceStatus::Disposed)
            }
        }
    }

    /// Destroy every live instance regardless of keep-alive. Returns how
    /// many were disposed.
    pub fn dispose_all(&self) -> usize {
        let retired: Vec<(String, Option<SandboxHandle>)> = {
            let mut instances = self.instances.lock();
            instances
                .values_mut()
                .filter(|inst| inst.status.is_live() || inst.status == InstanceStatus::Error)
                .map(|inst| (inst.sub_app_name.clone(), self.retire(inst)))
                .collect()
        };
        for (name, handle) in &retired {
            self.destroy(name, handle.clone());
        }
        if !retired.is_empty() {
            info!(count = retired.len(), "All sandboxes disposed");
        }
        retired.len()
    }

    /// Record a sandbox-initiated navigation. Returns whether the instance
    /// was live.
    pub fn record_route(&self, name: &str, relative_path: &str) -> bool {
        let mut instances = self.instances.lock();
        match instances.get_mut(name) {
            Some(inst) if inst.status.is_live() => {
                inst.current_relative_path = Some(normalize_path(relative_path));
                true
            }
            _ => false,
        }
    }

    /// Snapshot of one instance.
    #[must_use]
    pub fn instance(&self, name: &str) -> Option<MountedInstance> {
        self.instances.lock().get(name).cloned()
    }

    /// Snapshot of every instance, by name.
    #[must_use]
    pub fn instances(&self) -> Vec<MountedInstance> {
        let mut all: Vec<_> = self.instances.lock().values().cloned().collect();
        all.sort_by(|a, b| a.sub_app_name.cmp(&b.sub_app_name));
        all
    }

    /// Name of the active sub-application.
    #[must_use]
    pub fn active(&self) -> Option<String> {
        self.instances
            .lock()
            .values()
            .find(|inst| inst.status == InstanceStatus::Active)
            .map(|inst| inst.sub_app_name.clone())
    }

    /// Number of live instances.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.instances
            .lock()
            .values()
            .filter(|inst| inst.status.is_live())
            .count()
    }

    /// Whether a sandbox runtime is configured.
    #[must_use]
    pub fn has_runtime(&self) -> bool {
        self.runtime.is_some()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn bump_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    fn strategy_for(&self, descriptor: &SubAppDescriptor) -> SandboxStrategy {
        if self.config.degrade || descriptor.degrade {
            SandboxStrategy::Degraded
        } else {
            SandboxStrategy::Isolated
        }
    }

    /// Decide what `navigate_to` does with `inst`. Active and Inactive
    /// instances are finished here, under the lock.
    fn plan(
        &self,
        runtime: &dyn SandboxRuntime,
        inst: &mut MountedInstance,
        relative: &str,
    ) -> Result<Step, LifecycleError> {
        let reusable = matches!(
            inst.status,
            InstanceStatus::Active
                | InstanceStatus::Inactive
                | InstanceStatus::Loaded
                | InstanceStatus::Mounted
        );
        if reusable && inst.sandbox.is_none() {
            inst.fail("instance lost its sandbox");
        }

        match (inst.status, inst.sandbox.clone()) {
            (InstanceStatus::Active, Some(handle)) => {
                if inst.current_relative_path.as_deref() != Some(relative) {
                    runtime.sync_route(&handle, relative);
                    inst.current_relative_path = Some(relative.to_string());
                }
                Ok(Step::Done(self.activation(inst, true), false))
            }
            (InstanceStatus::Inactive, Some(handle)) => {
                if inst.current_relative_path.as_deref() != Some(relative) {
                    runtime.sync_route(&handle, relative);
                }
                self.activate_locked(runtime, inst, &handle, relative)?;
                debug!(sub_app = %inst.sub_app_name, "Keep-alive sandbox resumed");
                Ok(Step::Done(self.activation(inst, true), true))
            }
            (InstanceStatus::Loaded | InstanceStatus::Mounted, Some(handle)) => {
                let generation = self.bump_generation();
                inst.generation = generation;
                Ok(Step::Start(handle, generation))
            }
            (InstanceStatus::Preloading, _) => {
                // Take over the in-flight load; its completion becomes stale.
                let generation = self.bump_generation();
                inst.generation = generation;
                Ok(Step::Load(generation, None))
            }
            _ => {
                let generation = self.bump_generation();
                let stale = inst.begin_load(generation)?;
                Ok(Step::Load(generation, stale))
            }
        }
    }

    /// Await `preload_app` and apply the result if still current.
    async fn load(
        &self,
        runtime: &Arc<dyn SandboxRuntime>,
        descriptor: &SubAppDescriptor,
        generation: u64,
    ) -> Result<SandboxHandle, LifecycleError> {
        let name = descriptor.name.as_str();
        self.hooks.before_load(name);
        let result = runtime
            .preload_app(descriptor, self.strategy_for(descriptor))
            .await;

        let (outcome, orphan) = {
            let mut instances = self.instances.lock();
            let current = instances.get_mut(name).filter(|inst| {
                inst.is_current(generation) && inst.status == InstanceStatus::Preloading
            });
            match (current, result) {
                (None, Ok(handle)) => (Err(LifecycleError::Superseded(name.to_string())), Some(handle)),
                (None, Err(_)) => (Err(LifecycleError::Superseded(name.to_string())), None),
                (Some(inst), Ok(handle)) => {
                    if !self.session.has_session() {
                        self.retire(inst);
                        (Err(LifecycleError::NoSession(name.to_string())), Some(handle))
                    } else {
                        match inst.transition(InstanceStatus::Loaded) {
                            Ok(()) => {
                                inst.sandbox = Some(handle.clone());
                                (Ok(handle), None)
                            }
                            Err(e) => (Err(e), Some(handle)),
                        }
                    }
                }
                (Some(inst), Err(source)) => {
                    inst.fail(source.to_string());
                    (
                        Err(LifecycleError::Load {
                            sub_app: name.to_string(),
                            source,
                        }),
                        None,
                    )
                }
            }
        };

        if let Some(orphan) = orphan {
            debug!(sub_app = %name, sandbox = orphan.id, "Discarding stale sandbox");
            runtime.destroy_app(&orphan);
        }
        match &outcome {
            Ok(handle) => debug!(sub_app = %name, sandbox = handle.id, "Sandbox loaded"),
            Err(LifecycleError::Load { source, .. }) => self.hooks.load_error(name, source),
            Err(e) => debug!(sub_app = %name, error = %e, "Load outcome discarded"),
        }
        outcome
    }

    /// Await `start_app`, then inject the session and activate in one
    /// critical section.
    async fn start(
        &self,
        runtime: &Arc<dyn SandboxRuntime>,
        descriptor: &SubAppDescriptor,
        handle: SandboxHandle,
        generation: u64,
        relative: String,
    ) -> Result<Activation, LifecycleError> {
        let name = descriptor.name.as_str();
        let props = MountProps::new(
            relative.clone(),
            &self.session.snapshot(),
            &descriptor.static_props,
        );

        self.hooks.before_mount(name);
        let result = runtime.start_app(&handle, &props).await;

        let (outcome, retired) = {
            let mut instances = self.instances.lock();
            let current = instances.get_mut(name).filter(|inst| {
                inst.is_current(generation)
                    && matches!(inst.status, InstanceStatus::Loaded | InstanceStatus::Mounted)
            });
            match (current, result) {
                (None, _) => (Err(LifecycleError::Superseded(name.to_string())), None),
                (Some(inst), Err(source)) => {
                    inst.fail(source.to_string());
                    (
                        Err(LifecycleError::Load {
                            sub_app: name.to_string(),
                            source,
                        }),
                        None,
                    )
                }
                (Some(inst), Ok(())) => {
                    if inst.status == InstanceStatus::Loaded {
                        inst.transition(InstanceStatus::Mounted)?;
                    }
                    match self.activate_locked(runtime.as_ref(), inst, &handle, &relative) {
                        Ok(()) => (Ok(self.activation(inst, false)), None),
                        // Session vanished while rendering.
                        Err(e) => (Err(e), Some(self.retire(inst))),
                    }
                }
            }
        };
        if let Some(sandbox) = retired {
            self.destroy(name, sandbox);
        }

        match &outcome {
            Ok(_) => {
                self.hooks.after_mount(name);
                self.hooks.activated(name);
                info!(sub_app = %name, path = %relative, "Sub-application active");
            }
            Err(LifecycleError::Load { source, .. }) => self.hooks.load_error(name, source),
            Err(e) => debug!(sub_app = %name, error = %e, "Start outcome discarded"),
        }
        outcome
    }

    /// Inject a fresh snapshot and move to `Active`. Called with the
    /// instance lock held so no session change can slip in between.
    fn activate_locked(
        &self,
        runtime: &dyn SandboxRuntime,
        inst: &mut MountedInstance,
        handle: &SandboxHandle,
        relative: &str,
    ) -> Result<(), LifecycleError> {
        let snapshot = self.session.snapshot();
        if !snapshot.is_logged_in() {
            return Err(LifecycleError::NoSession(inst.sub_app_name.clone()));
        }
        runtime.inject_session(handle, &snapshot);
        inst.transition(InstanceStatus::Active)?;
        inst.last_injected = Some(snapshot);
        inst.current_relative_path = Some(relative.to_string());
        runtime.activate_app(handle);
        Ok(())
    }

    fn activation(&self, inst: &MountedInstance, reused: bool) -> Activation {
        Activation {
            sub_app: inst.sub_app_name.clone(),
            relative_path: inst.current_relative_path.clone().unwrap_or_default(),
            reused,
            generation: inst.generation,
        }
    }

    /// Mark `inst` disposed and invalidate in-flight work on it.
    fn retire(&self, inst: &mut MountedInstance) -> Option<SandboxHandle> {
        inst.generation = self.bump_generation();
        inst.dispose()
    }

    fn destroy(&self, name: &str, handle: Option<SandboxHandle>) {
        self.hooks.before_unmount(name);
        if let (Some(runtime), Some(handle)) = (&self.runtime, handle) {
            runtime.destroy_app(&handle);
        }
        self.hooks.after_unmount(name);
    }
}

impl InstanceDisposer for LifecycleOrchestrator {
    fn dispose_all(&self) -> usize {
        LifecycleOrchestrator::dispose_all(self)
    }
}

impl std::fmt::Debug for LifecycleOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleOrchestrator")
            .field("config", &self.config)
            .field("has_runtime", &self.runtime.is_some())
            .field("live", &self.live_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SandboxError;
    use crate::ports::MockSandboxRuntime;
    use parking_lot::RwLock;
    use shared_bus::MessageBus;
    use shared_types::{MemoryNavigator, SessionSnapshot, UserProfile};

    #[derive(Default)]
    struct TestSession {
        snapshot: RwLock<SessionSnapshot>,
    }

    impl TestSession {
        fn login(&self, token: &str) {
            *self.snapshot.write() = SessionSnapshot::authenticated(
                token,
                UserProfile::new("1", "alice", &["order:view"]),
            );
        }

        fn logout(&self) {
            *self.snapshot.write() = SessionSnapshot::empty();
        }
    }

    impl SessionReader for TestSession {
        fn snapshot(&self) -> SessionSnapshot {
            self.snapshot.read().clone()
        }
    }

    struct Fixture {
        session: Arc<TestSession>,
        runtime: Arc<MockSandboxRuntime>,
        orchestrator: Arc<LifecycleOrchestrator>,
    }

    fn fixture(config: LifecycleConfig) -> Fixture {
        let registry = Arc::new(SubAppRegistry::new());
        registry
            .register(
                SubAppDescriptor::new("order-system", "http://localhost:8003/").keep_alive(true),
            )
            .unwrap();
        registry
            .register(SubAppDescriptor::new(
                "product-management",
                "http://localhost:8002/",
            ))
            .unwrap();

        let bus = Arc::new(MessageBus::new());
        let routes = RouteSynchronizer::new(
            registry.clone(),
            Arc::new(MemoryNavigator::default()),
            bus.clone(),
        );
        let session = Arc::new(TestSession::default());
        let runtime = Arc::new(MockSandboxRuntime::new(bus));
        let orchestrator = Arc::new(LifecycleOrchestrator::new(
            config,
            registry,
            routes,
            session.clone(),
            Some(runtime.clone()),
        ));
        Fixture {
            session,
            runtime,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_no_mount_without_session() {
        let f = fixture(LifecycleConfig::for_testing());

        let err = f
            .orchestrator
            .navigate_to("order-system", "/order-system/list")
            .await
            .unwrap_err();
        assert_eq!(err, LifecycleError::NoSession("order-system".to_string()));
        assert_eq!(f.runtime.preload_calls(), 0);
        assert_eq!(f.orchestrator.preload("order-system").await, PreloadOutcome::SkippedNoSession);
        assert_eq!(f.runtime.preload_calls(), 0);
    }

    #[tokio::test]
    async fn test_navigate_loads_and_activates() {
        let f = fixture(LifecycleConfig::for_testing());
        f.session.login("t1");

        let activation = f
            .orchestrator
            .navigate_to("order-system", "/order-system/detail/7")
            .await
            .unwrap();
        assert!(!activation.reused);
        assert_eq!(activation.relative_path, "/detail/7");

        let inst = f.orchestrator.instance("order-system").unwrap();
        assert_eq!(inst.status, InstanceStatus::Active);
        assert_eq!(inst.last_injected.unwrap().token.as_deref(), Some("t1"));

        let props = f.runtime.props("order-system").unwrap();
        assert_eq!(props.route_path, "/detail/7");
        assert_eq!(props.token.as_deref(), Some("t1"));
        assert_eq!(f.orchestrator.active().as_deref(), Some("order-system"));
    }

    #[tokio::test]
    async fn test_bare_prefix_uses_default_path() {
        let f = fixture(LifecycleConfig::for_testing());
        f.session.login("t1");

        let activation = f
            .orchestrator
            .navigate_to("product-management", "/product-management")
            .await
            .unwrap();
        assert_eq!(activation.relative_path, "/list");
    }

    #[tokio::test]
    async fn test_single_instance_per_sub_app() {
        let f = fixture(LifecycleConfig::for_testing());
        f.session.login("t1");

        f.orchestrator
            .navigate_to("order-system", "/order-system/list")
            .await
            .unwrap();
        let again = f
            .orchestrator
            .navigate_to("order-system", "/order-system/detail/3")
            .await
            .unwrap();

        assert!(again.reused);
        assert_eq!(f.runtime.preload_calls(), 1);
        assert_eq!(f.runtime.live_count("order-system"), 1);
        assert_eq!(
            f.runtime.route_syncs(),
            vec![("order-system".to_string(), "/detail/3".to_string())]
        );
    }

    #[tokio::test]
    async fn test_keep_alive_resume_injects_fresh_session() {
        let f = fixture(LifecycleConfig::for_testing());
        f.session.login("t1");
        f.orchestrator
            .navigate_to("order-system", "/order-system/list")
            .await
            .unwrap();

        assert_eq!(
            f.orchestrator.deactivate("order-system"),
            Some(InstanceStatus::Inactive)
        );
        assert_eq!(f.runtime.deactivations(), 1);

        // Token refreshed while hidden.
        f.session.login("t2");
        let resumed = f
            .orchestrator
            .navigate_to("order-system", "/order-system/list")
            .await
            .unwrap();

        assert!(resumed.reused);
        assert_eq!(f.runtime.preload_calls(), 1);
        assert_eq!(
            f.runtime.last_injection("order-system").unwrap().token.as_deref(),
            Some("t2")
        );
    }

    #[tokio::test]
    async fn test_deactivate_without_keep_alive_disposes() {
        let f = fixture(LifecycleConfig::for_testing());
        f.session.login("t1");
        f.orchestrator
            .navigate_to("product-management", "/product-management/list")
            .await
            .unwrap();

        assert_eq!(
            f.orchestrator.deactivate("product-management"),
            Some(InstanceStatus::Disposed)
        );
        assert_eq!(f.runtime.live_count("product-management"), 0);
        assert_eq!(f.orchestrator.deactivate("unknown"), None);
    }

    #[tokio::test]
    async fn test_preloaded_sandbox_is_reused_by_navigation() {
        let f = fixture(LifecycleConfig::for_testing());
        f.session.login("t1");

        assert_eq!(f.orchestrator.preload("order-system").await, PreloadOutcome::Loaded);
        assert_eq!(f.orchestrator.preload("order-system").await, PreloadOutcome::AlreadyLive);
        assert_eq!(
            f.orchestrator.instance("order-system").unwrap().status,
            InstanceStatus::Loaded
        );

        f.orchestrator
            .navigate_to("order-system", "/order-system/list")
            .await
            .unwrap();
        assert_eq!(f.runtime.preload_calls(), 1);
        assert_eq!(f.runtime.start_calls(), 1);
    }

    #[tokio::test]
    async fn test_preload_all_respects_switch() {
        let f = fixture(LifecycleConfig::for_testing());
        f.session.login("t1");
        let outcomes = f.orchestrator.preload_all().await;
        assert!(outcomes
            .iter()
            .all(|(_, outcome)| *outcome == PreloadOutcome::SkippedDisabled));

        let f = fixture(LifecycleConfig::default());
        f.session.login("t1");
        let outcomes = f.orchestrator.preload_all().await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|(_, outcome)| *outcome == PreloadOutcome::Loaded));
    }

    #[tokio::test]
    async fn test_stale_load_completion_is_discarded() {
        let f = fixture(LifecycleConfig::for_testing());
        f.session.login("t1");
        f.runtime.hold_preloads();

        let orchestrator = f.orchestrator.clone();
        let pending = tokio::spawn(async move { orchestrator.preload("order-system").await });
        tokio::task::yield_now().await;
        assert_eq!(f.runtime.preload_calls(), 1);
        assert_eq!(
            f.orchestrator.instance("order-system").unwrap().status,
            InstanceStatus::Preloading
        );

        // Logout lands while the entry is still loading.
        f.session.logout();
        assert_eq!(f.orchestrator.dispose_all(), 1);
        f.runtime.release_preloads(1);

        assert_eq!(pending.await.unwrap(), PreloadOutcome::Superseded);
        let inst = f.orchestrator.instance("order-system").unwrap();
        assert_eq!(inst.status, InstanceStatus::Disposed);
        assert!(inst.sandbox.is_none());
        assert_eq!(f.runtime.live_count("order-system"), 0);
    }

    #[tokio::test]
    async fn test_preload_failure_is_contained_and_retried() {
        let f = fixture(LifecycleConfig::for_testing());
        f.session.login("t1");
        f.runtime.fail_preload(
            "order-system",
            SandboxError::EntryUnreachable {
                url: "http://localhost:8003/".to_string(),
                reason: "connection refused".to_string(),
            },
        );

        let outcome = f.orchestrator.preload("order-system").await;
        assert!(matches!(outcome, PreloadOutcome::Failed(_)));
        let inst = f.orchestrator.instance("order-system").unwrap();
        assert_eq!(inst.status, InstanceStatus::Error);
        assert!(inst.last_error.is_some());

        f.runtime.clear_failures();
        f.orchestrator
            .navigate_to("order-system", "/order-system/list")
            .await
            .unwrap();
        assert_eq!(
            f.orchestrator.instance("order-system").unwrap().status,
            InstanceStatus::Active
        );
    }

    #[tokio::test]
    async fn test_start_failure_sets_error() {
        let f = fixture(LifecycleConfig::for_testing());
        f.session.login("t1");
        f.runtime
            .fail_start("order-system", SandboxError::Script("boom".to_string()));

        let err = f
            .orchestrator
            .navigate_to("order-system", "/order-system/list")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Load { .. }));
        assert_eq!(
            f.orchestrator.instance("order-system").unwrap().status,
            InstanceStatus::Error
        );
        assert!(f.runtime.injections().is_empty());
    }

    #[tokio::test]
    async fn test_dispose_all_ignores_keep_alive() {
        let f = fixture(LifecycleConfig::for_testing());
        f.session.login("t1");
        f.orchestrator
            .navigate_to("order-system", "/order-system/list")
            .await
            .unwrap();
        f.orchestrator.deactivate("order-system");
        f.orchestrator
            .navigate_to("product-management", "/product-management/list")
            .await
            .unwrap();

        assert_eq!(f.orchestrator.dispose_all(), 2);
        assert_eq!(f.orchestrator.live_count(), 0);
        assert_eq!(f.runtime.destroyed().len(), 2);
        assert_eq!(f.orchestrator.dispose_all(), 0);
    }

    #[tokio::test]
    async fn test_record_route_tracks_live_instances() {
        let f = fixture(LifecycleConfig::for_testing());
        f.session.login("t1");
        assert!(!f.orchestrator.record_route("order-system", "/detail/1"));

        f.orchestrator
            .navigate_to("order-system", "/order-system/list")
            .await
            .unwrap();
        assert!(f.orchestrator.record_route("order-system", "detail/1"));
        assert_eq!(
            f.orchestrator
                .instance("order-system")
                .unwrap()
                .current_relative_path
                .as_deref(),
            Some("/detail/1")
        );
    }

    #[tokio::test]
    async fn test_degrade_selects_strategy() {
        let f = fixture(LifecycleConfig {
            degrade: true,
            preload_enabled: false,
        });
        assert_eq!(f.orchestrator.setup_all(), 2);
        assert!(f
            .runtime
            .setups()
            .iter()
            .all(|(_, strategy)| *strategy == SandboxStrategy::Degraded));
    }

    #[tokio::test]
    async fn test_without_runtime() {
        let registry = Arc::new(SubAppRegistry::new());
        let routes = RouteSynchronizer::new(
            registry.clone(),
            Arc::new(MemoryNavigator::default()),
            Arc::new(MessageBus::new()),
        );
        let session = Arc::new(TestSession::default());
        session.login("t1");
        let orchestrator = LifecycleOrchestrator::new(
            LifecycleConfig::default(),
            registry,
            routes,
            session,
            None,
        );

        assert_eq!(orchestrator.setup_all(), 0);
        assert_eq!(orchestrator.preload("order-system").await, PreloadOutcome::Unsupported);
        assert_eq!(
            orchestrator
                .navigate_to("order-system", "/order-system")
                .await
                .unwrap_err(),
            LifecycleError::NoRuntime
        );
    }
}
