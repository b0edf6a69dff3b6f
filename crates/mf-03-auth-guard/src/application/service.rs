//! # Auth Guard Service
//!
//! Evaluates navigations against the session. The guard keeps only its own
//! state and the preserved post-login target; the session itself is read
//! through `SessionAuthority` and reconciled before every decision, so a
//! logout or login performed elsewhere is picked up on the next navigation.

use crate::config::{GuardConfig, VerifyFailurePolicy};
use crate::domain::{GuardDecision, GuardState};
use crate::ports::SessionAuthority;
use parking_lot::Mutex;
use shared_types::{RouteLocation, RouteTarget, SessionSnapshot};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Auth Guard - navigation state machine.
pub struct AuthGuard {
    config: GuardConfig,
    authority: Arc<dyn SessionAuthority>,
    state: Mutex<GuardState>,
    pending_redirect: Mutex<Option<RouteLocation>>,
}

impl AuthGuard {
    /// Create the guard. Initial state follows token presence.
    pub fn new(config: GuardConfig, authority: Arc<dyn SessionAuthority>) -> Self {
        let state = if authority.snapshot().is_logged_in() {
            GuardState::Resolving
        } else {
            GuardState::Unauthenticated
        };
        debug!(state = %state, "Auth guard initialized");
        Self {
            config,
            authority,
            state: Mutex::new(state),
            pending_redirect: Mutex::new(None),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> GuardState {
        *self.state.lock()
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Target preserved by the last login redirect.
    #[must_use]
    pub fn pending_redirect(&self) -> Option<RouteLocation> {
        self.pending_redirect.lock().clone()
    }

    /// Decide whether navigating to `target` may proceed.
    pub async fn evaluate(&self, target: &RouteTarget) -> GuardDecision {
        let snapshot = self.reconcile();

        let snapshot = match self.state() {
            GuardState::Unauthenticated => return self.evaluate_anonymous(target),
            GuardState::Resolving => match self.resolve().await {
                Some(snapshot) => snapshot,
                None => return self.redirect_to_login(target),
            },
            GuardState::Authenticated | GuardState::Forbidden => snapshot,
        };

        self.evaluate_authenticated(target, &snapshot)
    }

    /// Whether a navigation the host did not start itself may go to
    /// `target`: only if `evaluate` would allow it without a redirect or a
    /// verification round trip. Leaves the guard state and the preserved
    /// target untouched.
    pub fn admits(&self, target: &RouteTarget) -> bool {
        let snapshot = self.reconcile();
        match self.state() {
            GuardState::Unauthenticated => self.is_public(target),
            GuardState::Resolving => false,
            GuardState::Authenticated | GuardState::Forbidden => {
                target.path() != self.config.login_path
                    && target
                        .meta
                        .permission_code
                        .as_deref()
                        .map_or(true, |code| snapshot.has_permission(code))
            }
        }
    }

    /// Where to go after a successful login: the `redirect` query of the
    /// login location, else the target preserved by the last redirect, else
    /// home.
    pub fn after_login(&self, login_location: Option<&RouteLocation>) -> RouteLocation {
        self.reconcile();
        let preserved = self.pending_redirect.lock().take();

        let from_query = login_location
            .and_then(|l| l.query_param(&self.config.redirect_param))
            .map(RouteLocation::parse);

        from_query
            .into_iter()
            .chain(preserved)
            .find(|l| self.is_safe_redirect(l))
            .unwrap_or_else(|| RouteLocation::new(&self.config.home_path))
    }

    /// The session disappeared (logout broadcast, refresh failure). Returns
    /// the login redirect if the guard was not already unauthenticated.
    pub fn session_lost(&self, current: &RouteLocation) -> Option<RouteLocation> {
        {
            let mut state = self.state.lock();
            if *state == GuardState::Unauthenticated {
                return None;
            }
            *state = GuardState::Unauthenticated;
        }
        info!(from = %current, "Session lost; redirecting to login");

        if self.config.is_public(&current.path) {
            return Some(RouteLocation::new(&self.config.login_path));
        }
        Some(self.login_redirect_for(current))
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Align the guard state with the session and return the snapshot used.
    fn reconcile(&self) -> SessionSnapshot {
        let snapshot = self.authority.snapshot();
        let mut state = self.state.lock();
        let next = match (*state, snapshot.is_logged_in()) {
            (_, false) => GuardState::Unauthenticated,
            (GuardState::Unauthenticated, true) if snapshot.user_profile.is_some() => {
                GuardState::Authenticated
            }
            (GuardState::Unauthenticated, true) => GuardState::Resolving,
            (current, true) => current,
        };
        if next != *state {
            debug!(from = %*state, to = %next, "Guard state reconciled with session");
            *state = next;
        }
        snapshot
    }

    /// `Resolving`: verify the stored token. `None` means the session was
    /// dropped and the caller must redirect to login.
    async fn resolve(&self) -> Option<SessionSnapshot> {
        match self.authority.verify().await {
            Ok(snapshot) => {
                self.set_state(GuardState::Authenticated);
                Some(snapshot)
            }
            Err(failure)
                if !failure.fatal && self.config.verify_failure == VerifyFailurePolicy::FailOpen =>
            {
                warn!(error = %failure, "Verification failed; keeping token (fail-open)");
                if !self.authority.keep_unverified() {
                    self.set_state(GuardState::Unauthenticated);
                    return None;
                }
                self.set_state(GuardState::Authenticated);
                Some(self.authority.snapshot())
            }
            Err(failure) => {
                warn!(error = %failure, "Verification failed; dropping session");
                self.authority.invalidate();
                self.set_state(GuardState::Unauthenticated);
                None
            }
        }
    }

    fn evaluate_anonymous(&self, target: &RouteTarget) -> GuardDecision {
        if self.is_public(target) {
            GuardDecision::Allow
        } else {
            self.redirect_to_login(target)
        }
    }

    fn evaluate_authenticated(
        &self,
        target: &RouteTarget,
        snapshot: &SessionSnapshot,
    ) -> GuardDecision {
        if target.path() == self.config.login_path {
            self.set_state(GuardState::Authenticated);
            return GuardDecision::Redirect(RouteLocation::new(&self.config.home_path));
        }

        if let Some(code) = target.meta.permission_code.as_deref() {
            if target.path() != self.config.forbidden_path && !snapshot.has_permission(code) {
                info!(
                    path = %target.path(),
                    permission = %code,
                    user = ?snapshot.username(),
                    "Permission missing; redirecting to forbidden route"
                );
                self.set_state(GuardState::Forbidden);
                return GuardDecision::Redirect(RouteLocation::new(&self.config.forbidden_path));
            }
        }

        self.set_state(GuardState::Authenticated);
        GuardDecision::Allow
    }

    fn redirect_to_login(&self, target: &RouteTarget) -> GuardDecision {
        *self.pending_redirect.lock() = Some(target.location.clone());
        debug!(target = %target.location, "Unauthenticated; redirecting to login");
        GuardDecision::Redirect(self.login_redirect_for(&target.location))
    }

    fn login_redirect_for(&self, target: &RouteLocation) -> RouteLocation {
        RouteLocation::new(&self.config.login_path)
            .with_query(&self.config.redirect_param, target.to_url())
    }

    fn is_public(&self, target: &RouteTarget) -> bool {
        self.config.is_public(target.path()) || !target.meta.requires_auth
    }

    fn is_safe_redirect(&self, location: &RouteLocation) -> bool {
        location.path.starts_with('/')
            && !location.path.starts_with("//")
            && location.path != self.config.login_path
    }

    fn set_state(&self, next: GuardState) {
        let mut state = self.state.lock();
        if *state != next {
            debug!(from = %*state, to = %next, "Guard state transition");
            *state = next;
        }
    }
}

impl std::fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGuard")
            .field("state", &self.state())
            .field("pending_redirect", &self.pending_redirect())
            .finish()
    }
}
