//! # Domain Entities
//!
//! The process-wide session and its refresh timer.
//!
//! ## Invariants
//!
//! - Token absence is the only meaning of "logged out".
//! - A live refresh timer implies a live token: `clear()` cancels the timer
//!   before it drops the token, and `arm_refresh()` refuses without one.
//! - `epoch` changes whenever the identity behind the session changes, so
//!   work started under an older epoch can detect that it is stale.

use shared_types::{PermissionSet, SessionSnapshot, UserProfile};
use std::fmt;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutReason {
    /// The host user logged out.
    UserRequested,
    /// A sandbox published `auth:logout`.
    SandboxRequested(String),
    /// An authenticated call returned 401.
    Unauthorized,
    /// The token refresh failed.
    RefreshFailed,
    /// Boot-time verification of a stored token failed.
    VerificationFailed,
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserRequested => f.write_str("user-requested"),
            Self::SandboxRequested(sender) => write!(f, "sandbox-requested:{sender}"),
            Self::Unauthorized => f.write_str("unauthorized"),
            Self::RefreshFailed => f.write_str("refresh-failed"),
            Self::VerificationFailed => f.write_str("verification-failed"),
        }
    }
}

/// Handle of the one-shot refresh task.
#[derive(Debug)]
pub struct RefreshTimer {
    handle: AbortHandle,
    generation: u64,
    delay: Duration,
    armed_at: Instant,
}

impl RefreshTimer {
    /// Wrap a spawned refresh task.
    pub fn new(handle: AbortHandle, generation: u64, delay: Duration) -> Self {
        Self {
            handle,
            generation,
            delay,
            armed_at: Instant::now(),
        }
    }

    /// Generation the task was armed with.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Delay the timer was armed with.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Time left until the timer fires.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.delay.saturating_sub(self.armed_at.elapsed())
    }

    /// Stop the task if it has not fired yet.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

/// The single process-wide session.
#[derive(Debug, Default)]
pub struct Session {
    token: Option<String>,
    profile: Option<UserProfile>,
    permission_codes: PermissionSet,
    refresh_timer: Option<RefreshTimer>,
    epoch: u64,
}

impl Session {
    /// Session restored from storage at boot (token only, profile pending).
    #[must_use]
    pub fn restored(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            ..Self::default()
        }
    }

    /// Start a new session. Any previous timer is cancelled.
    pub fn establish(&mut self, token: String, profile: UserProfile) {
        self.cancel_refresh();
        self.permission_codes = profile.permission_codes();
        self.profile = Some(profile);
        self.token = Some(token);
        self.epoch += 1;
    }

    /// Cache the resolved profile of the current token.
    pub fn cache_profile(&mut self, profile: UserProfile) {
        self.permission_codes = profile.permission_codes();
        self.profile = Some(profile);
    }

    /// Swap in a refreshed token. Identity is unchanged.
    pub fn replace_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// End the session. The timer is cancelled before the token is dropped.
    ///
    /// Returns whether there was a token.
    pub fn clear(&mut self) -> bool {
        self.cancel_refresh();
        let had_token = self.token.take().is_some();
        self.profile = None;
        self.permission_codes.clear();
        self.epoch += 1;
        had_token
    }

    /// Install a refresh timer, replacing (and cancelling) any previous one.
    ///
    /// Refused without a token; the timer is cancelled in that case.
    pub fn arm_refresh(&mut self, timer: RefreshTimer) -> bool {
        if self.token.is_none() {
            timer.cancel();
            return false;
        }
        self.cancel_refresh();
        self.refresh_timer = Some(timer);
        true
    }

    /// Remove the timer without aborting it; used by the task that fired.
    pub fn take_refresh_timer(&mut self) -> Option<RefreshTimer> {
        self.refresh_timer.take()
    }

    /// Cancel the pending refresh, if any.
    pub fn cancel_refresh(&mut self) {
        if let Some(timer) = self.refresh_timer.take() {
            timer.cancel();
        }
    }

    /// Current token.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether a token is present.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Resolved profile.
    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Current pending timer.
    #[must_use]
    pub fn refresh_timer(&self) -> Option<&RefreshTimer> {
        self.refresh_timer.as_ref()
    }

    /// Identity epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Value view of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: self.token.clone(),
            user_profile: self.profile.clone(),
            permission_codes: self.permission_codes.clone(),
        }
    }
}
