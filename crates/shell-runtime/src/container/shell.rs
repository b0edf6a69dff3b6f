//! # Component Wiring
//!
//! ```text
//! Level 0: MessageBus, SubAppRegistry
//! Level 1: CredentialSynchronizer (backend, token store)
//! Level 2: AuthGuard, RouteSynchronizer, RouteTable
//! Level 3: LifecycleOrchestrator (runtime, session reader)
//! Level 4: route admission (lifecycle, guard, route table)
//! ```
//!
//! The credential synchronizer holds the lifecycle orchestrator only as a
//! weak `InstanceDisposer`, so logout can dispose every sandbox without a
//! reference cycle.

use std::sync::Arc;

use tracing::info;

use mf_01_registry::SubAppRegistry;
use mf_02_credentials::{AuthBackend, CredentialSynchronizer};
use mf_03_auth_guard::AuthGuard;
use mf_04_lifecycle::{LifecycleOrchestrator, SandboxRuntime};
use mf_05_route_sync::{RouteSynchronizer, RouteTable};
use shared_bus::MessageBus;
use shared_types::{HostNavigator, InstanceDisposer, MemoryNavigator, MemoryTokenStore, TokenStore};

use crate::adapters::{
    ActiveRouteAdmission, HttpAuthBackend, HttpSandboxRuntime, MeteredAuthBackend, MetricsHooks,
};
use crate::container::config::{ConfigError, ShellConfig};

/// Outbound adapters injected into the container.
pub struct ShellAdapters {
    /// Bus shared with the sandboxes.
    pub bus: Arc<MessageBus>,
    /// Authentication API.
    pub backend: Arc<dyn AuthBackend>,
    /// Persistent token slot.
    pub store: Arc<dyn TokenStore>,
    /// Host router.
    pub navigator: Arc<dyn HostNavigator>,
    /// Sandbox technology; `None` disables mounting.
    pub runtime: Option<Arc<dyn SandboxRuntime>>,
}

/// Every shell component, wired.
pub struct ShellContainer {
    /// Configuration the container was built from.
    pub config: ShellConfig,
    /// Host/sandbox message bus.
    pub bus: Arc<MessageBus>,
    /// Sub-application registry (MF-01).
    pub registry: Arc<SubAppRegistry>,
    /// Host router.
    pub navigator: Arc<dyn HostNavigator>,
    /// Credential synchronizer (MF-02).
    pub credentials: Arc<CredentialSynchronizer>,
    /// Navigation guard (MF-03).
    pub guard: Arc<AuthGuard>,
    /// Route synchronizer (MF-05).
    pub routes: Arc<RouteSynchronizer>,
    /// Host page routes (MF-05).
    pub route_table: Arc<RouteTable>,
    /// Sandbox lifecycle (MF-04).
    pub lifecycle: Arc<LifecycleOrchestrator>,
}

impl ShellContainer {
    /// Build the container with the production adapters: HTTP auth API,
    /// HTTP sandbox runtime, in-memory token slot and router.
    pub fn new(config: ShellConfig) -> Result<Self, ConfigError> {
        let bus = Arc::new(MessageBus::new());
        let http: Arc<dyn AuthBackend> = Arc::new(HttpAuthBackend::new(&config.auth_api)?);
        let runtime: Arc<dyn SandboxRuntime> =
            Arc::new(HttpSandboxRuntime::new(&config.sandbox, bus.clone())?);
        let adapters = ShellAdapters {
            bus,
            backend: Arc::new(MeteredAuthBackend::new(http)),
            store: Arc::new(MemoryTokenStore::new()),
            navigator: Arc::new(MemoryNavigator::new(config.initial_path.clone())),
            runtime: Some(runtime),
        };
        Self::with_adapters(config, adapters)
    }

    /// Build the container around the given adapters.
    pub fn with_adapters(config: ShellConfig, adapters: ShellAdapters) -> Result<Self, ConfigError> {
        config.validate()?;
        let ShellAdapters {
            bus,
            backend,
            store,
            navigator,
            runtime,
        } = adapters;

        if let Some(runtime) = &runtime {
            if !Arc::ptr_eq(&runtime.bus(), &bus) {
                return Err(ConfigError::Invalid(
                    "sandbox runtime must share the host message bus".into(),
                ));
            }
        }

        info!("Initializing shell components...");

        // Level 0
        let registry = Arc::new(SubAppRegistry::from_config(&config.registry)?);
        info!(sub_apps = registry.len(), "  [MF-01] Registry ready");

        // Level 1
        let credentials =
            CredentialSynchronizer::new(config.credentials.clone(), backend, store, bus.clone());
        info!(
            session = credentials.snapshot().is_logged_in(),
            "  [MF-02] Credential synchronizer ready"
        );

        // Level 2
        let guard = Arc::new(AuthGuard::new(config.guard.clone(), credentials.clone()));
        let routes = RouteSynchronizer::new(registry.clone(), navigator.clone(), bus.clone());
        let route_table = Arc::new(RouteTable::new(config.routes.clone(), registry.clone()));
        info!(state = %guard.state(), "  [MF-03] Auth guard ready");
        info!("  [MF-05] Route synchronizer ready");

        // Level 3
        let lifecycle = Arc::new(
            LifecycleOrchestrator::new(
                config.effective_lifecycle(),
                registry.clone(),
                routes.clone(),
                credentials.clone(),
                runtime,
            )
            .with_hooks(Arc::new(MetricsHooks)),
        );
        let disposer: Arc<dyn InstanceDisposer> = lifecycle.clone();
        credentials.attach_disposer(&disposer);
        info!(
            runtime = lifecycle.has_runtime(),
            preload = lifecycle.config().preload_enabled,
            "  [MF-04] Lifecycle orchestrator ready"
        );

        // Level 4
        routes.set_admission(Arc::new(ActiveRouteAdmission::new(
            &lifecycle,
            guard.clone(),
            route_table.clone(),
        )));
        info!("  [MF-05] Sub-route admission attached");

        Ok(Self {
            config,
            bus,
            registry,
            navigator,
            credentials,
            guard,
            routes,
            route_table,
            lifecycle,
        })
    }
}

impl std::fmt::Debug for ShellContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellContainer")
            .field("sub_apps", &self.registry.names())
            .field("guard", &self.guard.state())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
