//! # HTTP Sandbox Runtime
//!
//! `SandboxRuntime` that fetches each sub-application's entry document over
//! HTTP and keeps the per-sandbox state (props, session, route, visibility)
//! in memory. Rendering belongs to the embedding host; this runtime is the
//! bookkeeping side of it.

use crate::container::{ConfigError, SandboxConfig};
use async_trait::async_trait;
use mf_01_registry::SubAppDescriptor;
use mf_04_lifecycle::{SandboxError, SandboxHandle, SandboxRuntime, SandboxStrategy};
use parking_lot::RwLock;
use shared_bus::MessageBus;
use shared_types::{MountProps, SessionSnapshot};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// State of one live sandbox.
#[derive(Debug, Clone)]
pub struct SandboxRecord {
    /// Owning sub-application.
    pub sub_app: String,
    /// Isolation strategy.
    pub strategy: SandboxStrategy,
    /// Size of the fetched entry document, if fetched.
    pub entry_bytes: Option<usize>,
    /// Props of the last start.
    pub props: Option<MountProps>,
    /// Last injected session.
    pub session: Option<SessionSnapshot>,
    /// Internal router path.
    pub route: String,
    /// Whether the sandbox is shown.
    pub visible: bool,
}

/// Sandbox runtime backed by HTTP entry fetches.
pub struct HttpSandboxRuntime {
    client: reqwest::Client,
    fetch_entries: bool,
    bus: Arc<MessageBus>,
    next_id: AtomicU64,
    registered: RwLock<HashMap<String, SandboxStrategy>>,
    sandboxes: RwLock<HashMap<u64, SandboxRecord>>,
}

impl HttpSandboxRuntime {
    /// Runtime sharing `bus` with the host.
    pub fn new(config: &SandboxConfig, bus: Arc<MessageBus>) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self {
            client,
            fetch_entries: config.fetch_entries,
            bus,
            next_id: AtomicU64::new(1),
            registered: RwLock::new(HashMap::new()),
            sandboxes: RwLock::new(HashMap::new()),
        })
    }

    /// Sub-applications registered through `setup_app`.
    pub fn registered(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registered.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot of a live sandbox.
    pub fn record(&self, id: u64) -> Option<SandboxRecord> {
        self.sandboxes.read().get(&id).cloned()
    }

    /// Number of live sandboxes.
    pub fn live(&self) -> usize {
        self.sandboxes.read().len()
    }

    /// Sub-applications currently shown.
    pub fn visible(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sandboxes
            .read()
            .values()
            .filter(|r| r.visible)
            .map(|r| r.sub_app.clone())
            .collect();
        names.sort();
        names
    }

    async fn fetch_entry(&self, descriptor: &SubAppDescriptor) -> Result<usize, SandboxError> {
        let unreachable = |reason: String| SandboxError::EntryUnreachable {
            url: descriptor.entry_url.clone(),
            reason,
        };
        let response = self
            .client
            .get(&descriptor.entry_url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unreachable(format!("HTTP {status}")));
        }
        let body = response
            .text()
            .await
            .map_err(|e| unreachable(e.to_string()))?;
        if descriptor.exec && body.trim().is_empty() {
            return Err(SandboxError::Script("empty entry document".to_string()));
        }
        Ok(body.len())
    }

    fn with_record(&self, handle: &SandboxHandle, f: impl FnOnce(&mut SandboxRecord)) {
        match self.sandboxes.write().get_mut(&handle.id) {
            Some(record) => f(record),
            None => warn!(sub_app = %handle.sub_app, id = handle.id, "Unknown sandbox"),
        }
    }
}

#[async_trait]
impl SandboxRuntime for HttpSandboxRuntime {
    fn setup_app(&self, descriptor: &SubAppDescriptor, strategy: SandboxStrategy) {
        debug!(sub_app = %descriptor.name, strategy = %strategy, "Sandbox registered");
        self.registered
            .write()
            .insert(descriptor.name.clone(), strategy);
    }

    async fn preload_app(
        &self,
        descriptor: &SubAppDescriptor,
        strategy: SandboxStrategy,
    ) -> Result<SandboxHandle, SandboxError> {
        let entry_bytes = if self.fetch_entries {
            Some(self.fetch_entry(descriptor).await?)
        } else {
            None
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sandboxes.write().insert(
            id,
            SandboxRecord {
                sub_app: descriptor.name.clone(),
                strategy,
                entry_bytes,
                props: None,
                session: None,
                route: descriptor.default_path.clone(),
                visible: false,
            },
        );
        info!(sub_app = %descriptor.name, id, ?entry_bytes, "Sandbox created");
        Ok(SandboxHandle {
            id,
            sub_app: descriptor.name.clone(),
            strategy,
        })
    }

    async fn start_app(&self, handle: &SandboxHandle, props: &MountProps) -> Result<(), SandboxError> {
        let mut sandboxes = self.sandboxes.write();
        let record = sandboxes
            .get_mut(&handle.id)
            .ok_or(SandboxError::UnknownHandle(handle.id))?;
        record.route = props.route_path.clone();
        record.props = Some(props.clone());
        Ok(())
    }

    fn inject_session(&self, handle: &SandboxHandle, session: &SessionSnapshot) {
        self.with_record(handle, |r| r.session = Some(session.clone()));
    }

    fn sync_route(&self, handle: &SandboxHandle, relative_path: &str) {
        self.with_record(handle, |r| r.route = relative_path.to_string());
    }

    fn activate_app(&self, handle: &SandboxHandle) {
        self.with_record(handle, |r| r.visible = true);
    }

    fn deactivate_app(&self, handle: &SandboxHandle) {
        self.with_record(handle, |r| r.visible = false);
    }

    fn destroy_app(&self, handle: &SandboxHandle) {
        if self.sandboxes.write().remove(&handle.id).is_some() {
            info!(sub_app = %handle.sub_app, id = handle.id, "Sandbox destroyed");
        }
    }

    fn bus(&self) -> Arc<MessageBus> {
        self.bus.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime(fetch_entries: bool) -> HttpSandboxRuntime {
        HttpSandboxRuntime::new(
            &SandboxConfig {
                fetch_entries,
                timeout_secs: 1,
            },
            Arc::new(MessageBus::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_sandbox_bookkeeping() {
        let runtime = runtime(false);
        let desc = SubAppDescriptor::new("order-system", "http://localhost:8003/");
        runtime.setup_app(&desc, SandboxStrategy::Isolated);
        assert_eq!(runtime.registered(), vec!["order-system"]);

        let handle = runtime
            .preload_app(&desc, SandboxStrategy::Isolated)
            .await
            .unwrap();
        let record = runtime.record(handle.id).unwrap();
        assert_eq!(record.entry_bytes, None);
        assert!(!record.visible);

        let props = MountProps::new("/detail/7", &SessionSnapshot::empty(), &desc.static_props);
        runtime.start_app(&handle, &props).await.unwrap();
        runtime.activate_app(&handle);
        runtime.sync_route(&handle, "/list");
        assert_eq!(runtime.visible(), vec!["order-system"]);
        assert_eq!(runtime.record(handle.id).unwrap().route, "/list");

        runtime.deactivate_app(&handle);
        assert!(runtime.visible().is_empty());

        runtime.destroy_app(&handle);
        assert_eq!(runtime.live(), 0);
        let err = runtime.start_app(&handle, &props).await.unwrap_err();
        assert_eq!(err, SandboxError::UnknownHandle(handle.id));
    }

    #[tokio::test]
    async fn test_unreachable_entry() {
        let runtime = runtime(true);
        let desc = SubAppDescriptor::new("user-center", "http://127.0.0.1:9/");
        let err = runtime
            .preload_app(&desc, SandboxStrategy::Isolated)
            .await
            .unwrap_err();
        assert!(matches!(err, SandboxError::EntryUnreachable { .. }));
        assert_eq!(runtime.live(), 0);
    }
}
