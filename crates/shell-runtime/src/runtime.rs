//! # Shell Runtime
//!
//! Drives the wired components: boot, guarded navigation, login, logout and
//! shutdown.
//!
//! ## Navigation
//!
//! ```text
//! url ─→ RouteTable ─→ AuthGuard ─┬─ Redirect ─→ (again, bounded)
//!                                 └─ Allow ─→ push host navigator
//!                                             ─→ deactivate previous sub-app
//!                                             ─→ LifecycleOrchestrator::navigate_to
//! ```

use std::fmt;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use mf_02_credentials::{CredentialError, LogoutReason};
use mf_03_auth_guard::{GuardDecision, GuardState};
use mf_04_lifecycle::{Activation, PreloadOutcome};
use mf_05_route_sync::{RouteError, RouteKind};
use shared_bus::SubscriptionToken;
use shared_types::RouteLocation;
use shell_telemetry::{log_event, metric_inc, BUS_MESSAGES_PUBLISHED, GUARD_REDIRECTS};

use crate::container::{ConfigError, ShellConfig, ShellContainer};
use crate::handlers::{MountedHandler, RouteChangeHandler, SessionLossHandler};

/// Runtime errors.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Login or verification failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The host navigator rejected a push.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The guard kept redirecting.
    #[error("Navigation to {path} exceeded {limit} redirects")]
    RedirectLoop {
        /// Originally requested location
        path: String,
        /// Redirects followed
        limit: usize,
    },

    /// Container setup failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result of one navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationOutcome {
    /// Location the host ended on.
    pub location: RouteLocation,
    /// Route rendered at that location.
    pub kind: RouteKind,
    /// Guard redirects followed.
    pub redirects: usize,
    /// Sub-application shown, if any.
    pub activation: Option<Activation>,
    /// Sandbox failure, contained: the host stays on the route.
    pub error: Option<String>,
}

/// Snapshot for the `status` command.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellStatus {
    /// Host path.
    pub path: String,
    /// Guard state.
    pub guard: GuardState,
    /// Logged-in user.
    pub user: Option<String>,
    /// Active sub-application.
    pub active: Option<String>,
    /// Live sandboxes.
    pub live_sandboxes: usize,
    /// Bus messages published so far.
    pub bus_messages: u64,
}

impl fmt::Display for ShellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "path={} guard={} user={} active={} live={} bus_messages={}",
            self.path,
            self.guard,
            self.user.as_deref().unwrap_or("-"),
            self.active.as_deref().unwrap_or("-"),
            self.live_sandboxes,
            self.bus_messages
        )
    }
}

/// The host shell.
pub struct ShellRuntime {
    container: ShellContainer,
    subscriptions: Mutex<Vec<SubscriptionToken>>,
}

impl ShellRuntime {
    /// Build with the production adapters.
    pub fn new(config: ShellConfig) -> Result<Self, ShellError> {
        Ok(Self::from_container(ShellContainer::new(config)?))
    }

    /// Wrap an already wired container.
    pub fn from_container(container: ShellContainer) -> Self {
        Self {
            container,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Wired components.
    pub fn container(&self) -> &ShellContainer {
        &self.container
    }

    /// Install the bus handlers, register every sub-application with the
    /// sandbox runtime and navigate to the initial path.
    pub async fn boot(&self) -> Result<NavigationOutcome, ShellError> {
        let c = &self.container;
        info!("Booting shell...");

        {
            let mut subs = self.subscriptions.lock();
            subs.extend(c.credentials.install());
            subs.push(c.routes.install());
            subs.push(RouteChangeHandler::new(c.lifecycle.clone(), c.routes.clone()).install(&c.bus));
            subs.push(SessionLossHandler::new(c.guard.clone(), c.routes.clone()).install(&c.bus));
            subs.extend(MountedHandler::install(&c.registry, &c.bus));
            info!(handlers = subs.len(), "Bus handlers installed");
        }

        let registered = c.lifecycle.setup_all();
        info!(sub_apps = registered, "Sub-applications set up");

        let initial = c.navigator.current().to_url();
        let outcome = self.navigate(&initial).await?;
        if c.credentials.snapshot().is_logged_in() {
            self.spawn_preload();
        }
        info!(path = %outcome.location, "Shell ready");
        Ok(outcome)
    }

    /// Navigate the host to `url`.
    pub async fn navigate(&self, url: &str) -> Result<NavigationOutcome, ShellError> {
        let c = &self.container;
        let requested = RouteLocation::parse(url);
        let limit = c.config.max_redirects;

        let mut location = requested.clone();
        let mut redirects = 0;
        let route = loop {
            let route = c.route_table.resolve(&location);
            match c.guard.evaluate(&route.target).await {
                GuardDecision::Allow => break route,
                GuardDecision::Redirect(next) => {
                    redirects += 1;
                    metric_inc!(GUARD_REDIRECTS, &[next.path.as_str()]);
                    if redirects > limit {
                        return Err(ShellError::RedirectLoop {
                            path: requested.to_url(),
                            limit,
                        });
                    }
                    log_event!(info, "guard", "Navigation redirected", from = %location, to = %next);
                    location = next;
                }
            }
        };

        if c.navigator.current() != location {
            c.navigator.push(location.clone()).map_err(RouteError::from)?;
        }

        let target = route.binding().map(|b| b.sub_app.clone());
        if let Some(previous) = c.lifecycle.active() {
            if target.as_deref() != Some(previous.as_str()) {
                c.lifecycle.deactivate(&previous);
            }
        }

        let mut outcome = NavigationOutcome {
            location,
            kind: route.kind.clone(),
            redirects,
            activation: None,
            error: None,
        };
        if let Some(sub_app) = target {
            match c.lifecycle.navigate_to(&sub_app, &outcome.location.path).await {
                Ok(activation) => {
                    log_event!(info, "lifecycle", "Sub-application active",
                        sub_app = %sub_app, relative = %activation.relative_path, reused = activation.reused);
                    outcome.activation = Some(activation);
                }
                Err(e) => {
                    log_event!(warn, "lifecycle", "Sub-application unavailable", sub_app = %sub_app, error = %e);
                    outcome.error = Some(e.to_string());
                }
            }
        }

        self.sync_bus_gauge();
        Ok(outcome)
    }

    /// Log in and go to the preserved target (or home).
    pub async fn login(&self, username: &str, password: &str) -> Result<NavigationOutcome, ShellError> {
        let c = &self.container;
        let snapshot = c.credentials.login(username, password).await?;
        info!(user = ?snapshot.username(), "Logged in");

        let current = c.navigator.current();
        let target = c.guard.after_login(Some(&current));
        let outcome = self.navigate(&target.to_url()).await?;
        self.spawn_preload();
        Ok(outcome)
    }

    /// Log out. Every sandbox is disposed and the host leaves protected
    /// pages through the session observer.
    pub fn logout(&self) -> RouteLocation {
        self.container.credentials.logout(LogoutReason::UserRequested);
        self.sync_bus_gauge();
        self.container.navigator.current()
    }

    /// Preload every sub-application in the background when preloading is
    /// enabled.
    pub fn spawn_preload(&self) -> Option<JoinHandle<Vec<(String, PreloadOutcome)>>> {
        let lifecycle = self.container.lifecycle.clone();
        if !lifecycle.config().preload_enabled || !lifecycle.has_runtime() {
            return None;
        }
        Some(tokio::spawn(async move {
            let outcomes = lifecycle.preload_all().await;
            let loaded = outcomes
                .iter()
                .filter(|(_, o)| *o == PreloadOutcome::Loaded)
                .count();
            info!(loaded, total = outcomes.len(), "Preload finished");
            outcomes
        }))
    }

    /// Current state.
    pub fn status(&self) -> ShellStatus {
        let c = &self.container;
        let snapshot = c.credentials.snapshot();
        self.sync_bus_gauge();
        ShellStatus {
            path: c.navigator.current_path(),
            guard: c.guard.state(),
            user: snapshot.username().map(str::to_string),
            active: c.lifecycle.active(),
            live_sandboxes: c.lifecycle.live_count(),
            bus_messages: c.bus.messages_published(),
        }
    }

    /// Unsubscribe every handler and dispose every sandbox.
    pub fn shutdown(&self) {
        let c = &self.container;
        let subs: Vec<SubscriptionToken> = self.subscriptions.lock().drain(..).collect();
        for token in &subs {
            if !c.bus.unsubscribe(token) {
                warn!(channel = %token.channel(), "Handler already removed");
            }
        }
        let disposed = c.lifecycle.dispose_all();
        info!(handlers = subs.len(), disposed, "Shell stopped");
    }

    fn sync_bus_gauge(&self) {
        let published = self.container.bus.messages_published();
        BUS_MESSAGES_PUBLISHED.set(i64::try_from(published).unwrap_or(i64::MAX));
    }
}

impl fmt::Debug for ShellRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellRuntime")
            .field("container", &self.container)
            .field("subscriptions", &self.subscriptions.lock().len())
            .finish()
    }
}
