//! # Outbound Ports
//!
//! The authentication API.

use crate::domain::{AuthError, LoginResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::UserProfile;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Authentication backend - outbound port.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token and the user profile.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError>;

    /// Resolve the profile behind a token.
    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, AuthError>;

    /// Exchange a token for a fresh one.
    async fn refresh_token(&self, token: &str) -> Result<String, AuthError>;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

struct MockUser {
    password: String,
    profile: UserProfile,
}

/// In-memory authentication backend.
///
/// Issues tokens `mock-token-{n}`, remembers which user each belongs to, and
/// lets tests inject failures and count calls.
#[derive(Default)]
pub struct MockAuthBackend {
    users: Mutex<HashMap<String, MockUser>>,
    tokens: Mutex<HashMap<String, String>>,
    next_token: AtomicU64,
    profile_failure: Mutex<Option<AuthError>>,
    refresh_failure: Mutex<Option<AuthError>>,
    login_calls: AtomicUsize,
    profile_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
}

impl MockAuthBackend {
    /// Backend without users.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user.
    #[must_use]
    pub fn with_user(self, username: &str, password: &str, permissions: &[&str]) -> Self {
        let id = (self.users.lock().len() + 1).to_string();
        self.users.lock().insert(
            username.to_string(),
            MockUser {
                password: password.to_string(),
                profile: UserProfile::new(id, username, permissions),
            },
        );
        self
    }

    /// Issue a valid token for `username` without a login call (simulates a
    /// token left in storage by an earlier page load).
    pub fn issue_token(&self, username: &str) -> String {
        let n = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("mock-token-{n}");
        self.tokens
            .lock()
            .insert(token.clone(), username.to_string());
        token
    }

    /// Make every profile fetch fail with `error`.
    pub fn fail_profile_with(&self, error: AuthError) {
        *self.profile_failure.lock() = Some(error);
    }

    /// Make every refresh fail with `error`.
    pub fn fail_refresh_with(&self, error: AuthError) {
        *self.refresh_failure.lock() = Some(error);
    }

    /// Remove injected failures.
    pub fn clear_failures(&self) {
        *self.profile_failure.lock() = None;
        *self.refresh_failure.lock() = None;
    }

    /// Revoke a token; later calls with it get 401.
    pub fn revoke(&self, token: &str) {
        self.tokens.lock().remove(token);
    }

    /// Login calls so far.
    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    /// Profile calls so far.
    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    /// Refresh calls so far.
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn profile_for_token(&self, token: &str) -> Result<UserProfile, AuthError> {
        let username = self
            .tokens
            .lock()
            .get(token)
            .cloned()
            .ok_or(AuthError::Unauthorized)?;
        self.users
            .lock()
            .get(&username)
            .map(|u| u.profile.clone())
            .ok_or(AuthError::Unauthorized)
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let profile = {
            let users = self.users.lock();
            match users.get(username) {
                Some(user) if user.password == password => user.profile.clone(),
                _ => return Err(AuthError::Unauthorized),
            }
        };
        Ok(LoginResponse {
            access_token: self.issue_token(username),
            user: profile,
        })
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, AuthError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.profile_failure.lock().clone() {
            return Err(error);
        }
        self.profile_for_token(token)
    }

    async fn refresh_token(&self, token: &str) -> Result<String, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.refresh_failure.lock().clone() {
            return Err(error);
        }
        let username = self
            .tokens
            .lock()
            .remove(token)
            .ok_or(AuthError::Unauthorized)?;
        Ok(self.issue_token(&username))
    }
}
