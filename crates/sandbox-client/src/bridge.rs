//! # Sandbox Bridge
//!
//! Session cache, pull request with timeout fallback, and the sandbox half
//! of route synchronization.

use crate::config::BridgeConfig;
use parking_lot::{Mutex, RwLock};
use shared_bus::{BusError, BusPayload, Channel, MessageBus, SubscriptionToken};
use shared_types::{normalize_path, MountProps, SessionReader, SessionSnapshot, TokenStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of `request_auth_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthInfo {
    /// Session to use.
    pub snapshot: SessionSnapshot,
    /// `false` when the host did not answer and the cache was used.
    pub from_host: bool,
}

enum Link {
    Host {
        bus: Arc<MessageBus>,
        observer: SubscriptionToken,
    },
    Standalone {
        store: Arc<dyn TokenStore>,
    },
}

/// Sandbox-side connection to the host shell.
pub struct SandboxBridge {
    app_name: String,
    config: BridgeConfig,
    link: Link,
    cache: Arc<RwLock<SessionSnapshot>>,
    current_path: Mutex<String>,
}

impl SandboxBridge {
    /// Bridge for a sandbox mounted by the host with `props`.
    ///
    /// The injected session is cached and kept current by observing
    /// `session-changed`.
    pub fn from_mount(bus: Arc<MessageBus>, app_name: impl Into<String>, props: MountProps) -> Self {
        Self::from_mount_with(bus, app_name, props, BridgeConfig::default())
    }

    /// `from_mount` with explicit settings.
    pub fn from_mount_with(
        bus: Arc<MessageBus>,
        app_name: impl Into<String>,
        props: MountProps,
        config: BridgeConfig,
    ) -> Self {
        let app_name = app_name.into();
        let cache = Arc::new(RwLock::new(props.session()));

        let observed = Arc::clone(&cache);
        let observer_app = app_name.clone();
        let observer = bus.subscribe(Channel::SESSION_CHANGED, move |msg| {
            if let Some(snapshot) = msg.payload.session_snapshot() {
                debug!(sub_app = %observer_app, logged_in = snapshot.is_logged_in(), "Session update observed");
                *observed.write() = snapshot.clone();
            }
        });

        info!(sub_app = %app_name, path = %props.route_path, "Sandbox bridge attached to host");
        Self {
            current_path: Mutex::new(normalize_path(&props.route_path)),
            app_name,
            config,
            link: Link::Host { bus, observer },
            cache,
        }
    }

    /// Bridge for a sub-application running on its own.
    pub fn standalone(
        app_name: impl Into<String>,
        store: Arc<dyn TokenStore>,
        initial_path: &str,
    ) -> Self {
        let app_name = app_name.into();
        let snapshot = SessionSnapshot {
            token: store.load(),
            ..SessionSnapshot::empty()
        };
        info!(sub_app = %app_name, "Sandbox bridge running standalone");
        Self {
            app_name,
            config: BridgeConfig::default(),
            link: Link::Standalone { store },
            cache: Arc::new(RwLock::new(snapshot)),
            current_path: Mutex::new(normalize_path(initial_path)),
        }
    }

    /// Sub-application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Whether no host is attached.
    #[must_use]
    pub fn is_standalone(&self) -> bool {
        matches!(self.link, Link::Standalone { .. })
    }

    /// Cached session.
    #[must_use]
    pub fn session(&self) -> SessionSnapshot {
        if let Link::Standalone { store } = &self.link {
            let token = store.load();
            let mut cache = self.cache.write();
            if cache.token != token {
                *cache = SessionSnapshot {
                    token,
                    ..SessionSnapshot::empty()
                };
            }
            return cache.clone();
        }
        self.cache.read().clone()
    }

    /// Cached token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session().token
    }

    /// Ask the host for the current session.
    ///
    /// Waits up to the configured timeout; on timeout the cached session is
    /// returned with `from_host = false`.
    pub async fn request_auth_info(&self) -> AuthInfo {
        let bus = match &self.link {
            Link::Host { bus, .. } => bus,
            Link::Standalone { .. } => {
                return AuthInfo {
                    snapshot: self.session(),
                    from_host: false,
                }
            }
        };

        let reply = bus
            .request(
                Channel::auth_get_token(),
                BusPayload::AuthGetToken {
                    sender: self.app_name.clone(),
                },
                Channel::auth_reply(&self.app_name),
                &self.app_name,
                self.config.request_timeout(),
            )
            .await;

        match reply {
            Ok(msg) => match msg.payload {
                BusPayload::AuthSetAuthInfo(snapshot) => {
                    *self.cache.write() = snapshot.clone();
                    AuthInfo {
                        snapshot,
                        from_host: true,
                    }
                }
                other => {
                    warn!(sub_app = %self.app_name, kind = other.kind(), "Unexpected auth reply; using cache");
                    self.cached()
                }
            },
            Err(BusError::Timeout { waited_ms, .. }) => {
                warn!(sub_app = %self.app_name, waited_ms, "Host did not answer auth:getToken; using cached session");
                self.cached()
            }
            Err(e) => {
                warn!(sub_app = %self.app_name, error = %e, "Auth request failed; using cached session");
                self.cached()
            }
        }
    }

    /// Ask the host to log out. Standalone, the local token is cleared.
    /// Returns whether a host was notified.
    pub fn request_logout(&self) -> bool {
        match &self.link {
            Link::Host { bus, .. } => {
                info!(sub_app = %self.app_name, "Requesting logout from host");
                bus.publish(Channel::auth_logout(), BusPayload::AuthLogout, &self.app_name);
                true
            }
            Link::Standalone { store } => {
                store.clear();
                *self.cache.write() = SessionSnapshot::empty();
                false
            }
        }
    }

    /// The sub-application navigated on its own. Reports the new path to
    /// the host unless it is unchanged. Returns whether it changed.
    pub fn navigate_internal(&self, relative_path: &str) -> bool {
        let path = normalize_path(relative_path);
        {
            let mut current = self.current_path.lock();
            if *current == path {
                return false;
            }
            current.clone_from(&path);
        }
        if let Link::Host { bus, .. } = &self.link {
            bus.publish(
                Channel::sub_route_change(),
                BusPayload::SubRouteChange {
                    sub_app_name: self.app_name.clone(),
                    relative_path: path,
                },
                &self.app_name,
            );
        }
        true
    }

    /// The host moved this sandbox to `relative_path`. Applied only if it
    /// differs from the current path, and never reported back.
    pub fn apply_host_path(&self, relative_path: &str) -> bool {
        let path = normalize_path(relative_path);
        let mut current = self.current_path.lock();
        if *current == path {
            return false;
        }
        debug!(sub_app = %self.app_name, from = %*current, to = %path, "Applying host path");
        *current = path;
        true
    }

    /// Current internal path.
    #[must_use]
    pub fn current_path(&self) -> String {
        self.current_path.lock().clone()
    }

    /// Publish `{app}-mounted`.
    pub fn announce_mounted(&self) {
        if let Link::Host { bus, .. } = &self.link {
            bus.publish(
                Channel::mounted(&self.app_name),
                BusPayload::SubAppMounted {
                    timestamp: chrono::Utc::now().timestamp_millis(),
                },
                &self.app_name,
            );
        }
    }

    fn cached(&self) -> AuthInfo {
        AuthInfo {
            snapshot: self.cache.read().clone(),
            from_host: false,
        }
    }
}

impl SessionReader for SandboxBridge {
    fn snapshot(&self) -> SessionSnapshot {
        self.session()
    }
}

impl Drop for SandboxBridge {
    fn drop(&mut self) {
        if let Link::Host { bus, observer } = &self.link {
            bus.unsubscribe(observer);
        }
    }
}

impl std::fmt::Debug for SandboxBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxBridge")
            .field("app_name", &self.app_name)
            .field("standalone", &self.is_standalone())
            .field("current_path", &self.current_path())
            .finish()
    }
}
