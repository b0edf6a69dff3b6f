//! Shell wired over mock adapters.

use std::sync::Arc;

use mf_01_registry::{RegistryConfig, SubAppConfig};
use mf_02_credentials::MockAuthBackend;
use mf_04_lifecycle::MockSandboxRuntime;
use sandbox_client::SandboxBridge;
use shared_bus::MessageBus;
use shared_types::{MemoryNavigator, MemoryTokenStore};
use shell_runtime::{ShellAdapters, ShellConfig, ShellContainer, ShellRuntime};

pub(crate) const USER: &str = "alice";
pub(crate) const PASSWORD: &str = "secret";

/// A booted-or-not shell plus handles on every mock.
pub(crate) struct Harness {
    pub shell: ShellRuntime,
    pub backend: Arc<MockAuthBackend>,
    pub sandboxes: Arc<MockSandboxRuntime>,
    pub navigator: Arc<MemoryNavigator>,
    pub store: Arc<MemoryTokenStore>,
    pub bus: Arc<MessageBus>,
}

/// Four sub-apps: `orders` and `order-system` keep-alive, `product-management`
/// transient, `order-admin` gated by `order:write`.
pub(crate) fn config() -> ShellConfig {
    let mut transient = SubAppConfig::new("product-management", 8002);
    transient.keep_alive = false;
    let mut admin = SubAppConfig::new("order-admin", 8005);
    admin.permission = Some("order:write".to_string());

    let mut config = ShellConfig::for_testing();
    config.registry = RegistryConfig {
        sub_apps: vec![
            SubAppConfig::new("orders", 8004),
            SubAppConfig::new("order-system", 8003),
            transient,
            admin,
        ],
        ..RegistryConfig::for_testing()
    };
    config
}

/// Backend knowing `alice`, who may read but not write orders.
pub(crate) fn backend() -> MockAuthBackend {
    MockAuthBackend::new().with_user(USER, PASSWORD, &["order:read"])
}

/// Harness without a stored token.
pub(crate) fn harness() -> Harness {
    build(config(), backend(), MemoryTokenStore::new())
}

/// Harness whose token slot already holds a valid token for `alice`.
pub(crate) fn harness_with_stored_token(initial_path: &str) -> Harness {
    let backend = backend();
    let token = backend.issue_token(USER);
    let mut config = config();
    config.initial_path = initial_path.to_string();
    build(config, backend, MemoryTokenStore::with_token(token))
}

pub(crate) fn build(config: ShellConfig, backend: MockAuthBackend, store: MemoryTokenStore) -> Harness {
    let bus = Arc::new(MessageBus::new());
    let backend = Arc::new(backend);
    let store = Arc::new(store);
    let sandboxes = Arc::new(MockSandboxRuntime::new(bus.clone()));
    let navigator = Arc::new(MemoryNavigator::new(config.initial_path.clone()));

    let container = ShellContainer::with_adapters(
        config,
        ShellAdapters {
            bus: bus.clone(),
            backend: backend.clone(),
            store: store.clone(),
            navigator: navigator.clone(),
            runtime: Some(sandboxes.clone()),
        },
    )
    .expect("valid test configuration");

    Harness {
        shell: ShellRuntime::from_container(container),
        backend,
        sandboxes,
        navigator,
        store,
        bus,
    }
}

impl Harness {
    /// Boot and log in as `alice`.
    pub async fn logged_in(self) -> Self {
        self.shell.boot().await.expect("boot");
        self.shell.login(USER, PASSWORD).await.expect("login");
        self
    }

    /// Bridge of a sandbox the host has started, built from its mount props.
    pub fn bridge(&self, sub_app: &str) -> SandboxBridge {
        let props = self
            .sandboxes
            .props(sub_app)
            .expect("sub-application was started");
        SandboxBridge::from_mount(self.bus.clone(), sub_app, props)
    }
}
