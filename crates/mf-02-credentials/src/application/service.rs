//! # Credential Synchronizer Service
//!
//! The only writer of the session. Every mutation ends with a
//! `session-changed` broadcast; sandboxes that need the session on demand
//! ask on `auth:getToken` and get the answer on their own reply channel.
//!
//! No lock is held across an `.await` or while publishing.

use crate::config::CredentialConfig;
use crate::domain::{AuthError, CredentialError, LogoutReason, RefreshTimer, Session};
use crate::ports::AuthBackend;
use parking_lot::{Mutex, RwLock};
use shared_bus::{BusPayload, Channel, MessageBus, SubscriptionToken};
use shared_types::{InstanceDisposer, SessionReader, SessionSnapshot, TokenStore, HOST_SENDER_ID};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Credential Synchronizer - owns the session.
pub struct CredentialSynchronizer {
    /// Handle to the owning `Arc`, for handlers and timer tasks.
    this: Weak<Self>,
    /// Configuration.
    config: CredentialConfig,
    /// Authentication API.
    backend: Arc<dyn AuthBackend>,
    /// Persistent token slot.
    store: Arc<dyn TokenStore>,
    /// Shared bus.
    bus: Arc<MessageBus>,
    /// The session.
    session: Mutex<Session>,
    /// Late-bound teardown of mounted sandboxes.
    disposer: RwLock<Option<Weak<dyn InstanceDisposer>>>,
    /// Refresh timer generations.
    next_generation: AtomicU64,
}

impl CredentialSynchronizer {
    /// Create the synchronizer, restoring any token left in `store`.
    pub fn new(
        config: CredentialConfig,
        backend: Arc<dyn AuthBackend>,
        store: Arc<dyn TokenStore>,
        bus: Arc<MessageBus>,
    ) -> Arc<Self> {
        let session = Session::restored(store.load());
        if session.has_token() {
            info!("Stored token found; session pending verification");
        }
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            config,
            backend,
            store,
            bus,
            session: Mutex::new(session),
            disposer: RwLock::new(None),
            next_generation: AtomicU64::new(0),
        })
    }

    /// Register the component that disposes sandboxes on logout.
    pub fn attach_disposer(&self, disposer: &Arc<dyn InstanceDisposer>) {
        *self.disposer.write() = Some(Arc::downgrade(disposer));
    }

    /// Subscribe the pull and logout handlers. Returns their tokens.
    pub fn install(&self) -> Vec<SubscriptionToken> {
        let weak = self.this.clone();
        let get_token = self.bus.subscribe(Channel::AUTH_GET_TOKEN, move |msg| {
            let Some(this) = weak.upgrade() else { return };
            let sender = match &msg.payload {
                BusPayload::AuthGetToken { sender } => sender.clone(),
                _ => msg.sender_id.clone(),
            };
            debug!(sender = %sender, "Answering auth:getToken");
            this.bus.publish(
                Channel::auth_reply(&sender),
                BusPayload::AuthSetAuthInfo(this.snapshot()),
                HOST_SENDER_ID,
            );
        });

        let weak = self.this.clone();
        let logout = self.bus.subscribe(Channel::AUTH_LOGOUT, move |msg| {
            if let Some(this) = weak.upgrade() {
                this.logout(LogoutReason::SandboxRequested(msg.sender_id.clone()));
            }
        });

        vec![get_token, logout]
    }

    /// Log in and broadcast the new session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionSnapshot, CredentialError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(CredentialError::MissingCredentials);
        }

        let response = self.backend.login(username, password).await.map_err(|e| {
            warn!(user = %username, error = %e, "Login failed");
            e
        })?;

        let snapshot = {
            let mut session = self.session.lock();
            session.establish(response.access_token.clone(), response.user);
            self.store.save(&response.access_token);
            self.arm_refresh(&mut session);
            session.snapshot()
        };

        info!(user = %username, "Login succeeded");
        self.broadcast(snapshot.clone());
        Ok(snapshot)
    }

    /// End the session: cancel the refresh timer, clear the session and the
    /// stored token, dispose every sandbox, broadcast the empty session.
    ///
    /// Synchronous so it can run inside bus handlers.
    pub fn logout(&self, reason: LogoutReason) {
        let had_session = {
            let mut session = self.session.lock();
            let had = session.clear();
            self.store.clear();
            had
        };

        let disposer = self.disposer.read().as_ref().and_then(Weak::upgrade);
        let disposed = disposer.map_or(0, |d| d.dispose_all());

        info!(reason = %reason, had_session, disposed, "Logged out");
        if had_session {
            self.broadcast(SessionSnapshot::empty());
        }
    }

    /// Resolve the profile of the current token. Arms the refresh timer if
    /// it is not armed yet. A 401 ends the session.
    pub async fn verify_session(&self) -> Result<SessionSnapshot, CredentialError> {
        let (token, epoch) = {
            let session = self.session.lock();
            let token = session.token().ok_or(CredentialError::NoSession)?;
            (token.to_string(), session.epoch())
        };

        let profile = match self.backend.fetch_profile(&token).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Session verification failed");
                self.handle_call_error(&e);
                return Err(e.into());
            }
        };

        let snapshot = {
            let mut session = self.session.lock();
            if session.epoch() != epoch {
                return Err(CredentialError::SessionChanged);
            }
            session.cache_profile(profile);
            if session.refresh_timer().is_none() {
                self.arm_refresh(&mut session);
            }
            session.snapshot()
        };

        debug!(user = ?snapshot.username(), "Session verified");
        self.broadcast(snapshot.clone());
        Ok(snapshot)
    }

    /// Keep the current token without a resolved profile (fail-open boot
    /// verification). Arms the refresh timer if it is not armed yet.
    /// Returns whether a token is live.
    pub fn keep_unverified(&self) -> bool {
        let mut session = self.session.lock();
        if !session.has_token() {
            return false;
        }
        if session.refresh_timer().is_none() {
            self.arm_refresh(&mut session);
        }
        debug!(refresh_armed = session.refresh_timer().is_some(), "Keeping unverified token");
        true
    }

    /// Apply the session consequence of a failed authenticated call: a 401
    /// ends the session. Returns whether it did.
    pub fn handle_call_error(&self, error: &AuthError) -> bool {
        if error.is_unauthorized() {
            self.logout(LogoutReason::Unauthorized);
            true
        } else {
            false
        }
    }

    /// Current session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    /// Current token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session.lock().token().map(str::to_string)
    }

    /// Whether a refresh is pending.
    #[must_use]
    pub fn refresh_armed(&self) -> bool {
        self.session.lock().refresh_timer().is_some()
    }

    /// Delay the pending refresh timer was armed with.
    #[must_use]
    pub fn refresh_delay(&self) -> Option<Duration> {
        self.session.lock().refresh_timer().map(RefreshTimer::delay)
    }

    /// Bus the synchronizer publishes on.
    #[must_use]
    pub fn bus(&self) -> &Arc<MessageBus> {
        &self.bus
    }

    fn broadcast(&self, snapshot: SessionSnapshot) {
        self.bus.publish(
            Channel::session_changed(),
            BusPayload::SessionChanged(snapshot),
            HOST_SENDER_ID,
        );
    }

    /// Spawn the one-shot refresh task and hand it to the session.
    fn arm_refresh(&self, session: &mut Session) {
        if !self.config.auto_refresh {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime; token refresh not scheduled");
            return;
        };

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.config.refresh_delay();
        let weak = self.this.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(this) = weak.upgrade() {
                this.run_refresh(generation).await;
            }
        });

        if session.arm_refresh(RefreshTimer::new(task.abort_handle(), generation, delay)) {
            debug!(generation, delay_secs = delay.as_secs(), "Token refresh scheduled");
        }
    }

    async fn run_refresh(self: Arc<Self>, generation: u64) {
        let (token, epoch) = {
            let mut session = self.session.lock();
            if session.refresh_timer().map(RefreshTimer::generation) != Some(generation) {
                return;
            }
            // The firing timer is finished; aborting it would cancel this task.
            drop(session.take_refresh_timer());
            let Some(token) = session.token() else { return };
            (token.to_string(), session.epoch())
        };

        match self.backend.refresh_token(&token).await {
            Ok(new_token) => {
                let snapshot = {
                    let mut session = self.session.lock();
                    if session.epoch() != epoch || session.token() != Some(token.as_str()) {
                        debug!("Refresh result discarded; session changed meanwhile");
                        return;
                    }
                    session.replace_token(new_token.clone());
                    self.store.save(&new_token);
                    self.arm_refresh(&mut session);
                    session.snapshot()
                };
                info!("Token refreshed");
                self.broadcast(snapshot);
            }
            Err(e) => {
                if self.session.lock().epoch() != epoch {
                    debug!(error = %e, "Refresh failure ignored; session already ended");
                    return;
                }
                warn!(error = %e, "Token refresh failed; ending session");
                self.logout(LogoutReason::RefreshFailed);
            }
        }
    }
}

impl SessionReader for CredentialSynchronizer {
    fn snapshot(&self) -> SessionSnapshot {
        CredentialSynchronizer::snapshot(self)
    }
}

impl std::fmt::Debug for CredentialSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session.lock();
        f.debug_struct("CredentialSynchronizer")
            .field("logged_in", &session.has_token())
            .field("refresh_armed", &session.refresh_timer().is_some())
            .field("epoch", &session.epoch())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockAuthBackend;
    use shared_types::MemoryTokenStore;
    use std::sync::atomic::AtomicUsize;

    struct CountingDisposer(AtomicUsize);

    impl InstanceDisposer for CountingDisposer {
        fn dispose_all(&self) -> usize {
            self.0.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    struct Fixture {
        backend: Arc<MockAuthBackend>,
        store: Arc<MemoryTokenStore>,
        bus: Arc<MessageBus>,
        creds: Arc<CredentialSynchronizer>,
    }

    fn fixture_with(store: MemoryTokenStore, backend: MockAuthBackend) -> Fixture {
        let backend = Arc::new(backend);
        let store = Arc::new(store);
        let bus = Arc::new(MessageBus::new());
        let creds = CredentialSynchronizer::new(
            CredentialConfig::for_testing(),
            backend.clone(),
            store.clone(),
            bus.clone(),
        );
        creds.install();
        Fixture {
            backend,
            store,
            bus,
            creds,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            MemoryTokenStore::new(),
            MockAuthBackend::new().with_user("admin", "secret", &["order:read"]),
        )
    }

    fn record_broadcasts(bus: &MessageBus) -> Arc<Mutex<Vec<SessionSnapshot>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(Channel::SESSION_CHANGED, move |msg| {
            if let Some(snapshot) = msg.payload.session_snapshot() {
                sink.lock().push(snapshot.clone());
            }
        });
        seen
    }

    #[tokio::test]
    async fn test_login_stores_arms_and_broadcasts() {
        let f = fixture();
        let seen = record_broadcasts(&f.bus);

        let snapshot = f.creds.login("admin", "secret").await.unwrap();

        assert!(snapshot.is_logged_in());
        assert!(snapshot.has_permission("order:read"));
        assert_eq!(f.store.load(), snapshot.token);
        assert!(f.creds.refresh_armed());
        assert_eq!(f.creds.refresh_delay(), Some(Duration::from_secs(55)));
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(seen.lock()[0], snapshot);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let f = fixture();
        let err = f.creds.login("admin", "nope").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(!f.creds.snapshot().is_logged_in());
        assert!(f.store.load().is_none());

        assert_eq!(
            f.creds.login("", "x").await.unwrap_err(),
            CredentialError::MissingCredentials
        );
        assert_eq!(f.backend.login_calls(), 1);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let f = fixture();
        let disposer: Arc<CountingDisposer> = Arc::new(CountingDisposer(AtomicUsize::new(0)));
        let as_port: Arc<dyn InstanceDisposer> = disposer.clone();
        f.creds.attach_disposer(&as_port);
        f.creds.login("admin", "secret").await.unwrap();
        let seen = record_broadcasts(&f.bus);

        f.creds.logout(LogoutReason::UserRequested);

        assert!(!f.creds.snapshot().is_logged_in());
        assert!(!f.creds.refresh_armed());
        assert!(f.store.load().is_none());
        assert_eq!(disposer.0.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock(), vec![SessionSnapshot::empty()]);
    }

    #[tokio::test]
    async fn test_pull_reply_on_sender_scoped_channel() {
        let f = fixture();
        f.creds.login("admin", "secret").await.unwrap();

        let reply = f
            .bus
            .request(
                Channel::auth_get_token(),
                BusPayload::AuthGetToken {
                    sender: "order-system".to_string(),
                },
                Channel::auth_reply("order-system"),
                "order-system",
                Duration::from_millis(100),
            )
            .await
            .unwrap();

        assert_eq!(reply.payload.session_snapshot(), Some(&f.creds.snapshot()));
        assert_eq!(reply.sender_id, HOST_SENDER_ID);
    }

    #[tokio::test]
    async fn test_sandbox_logout_request() {
        let f = fixture();
        f.creds.login("admin", "secret").await.unwrap();

        f.bus
            .publish(Channel::auth_logout(), BusPayload::AuthLogout, "user-center");

        assert!(!f.creds.snapshot().is_logged_in());
    }

    #[tokio::test]
    async fn test_restore_and_verify() {
        let backend = MockAuthBackend::new().with_user("admin", "secret", &["order:read"]);
        let token = backend.issue_token("admin");
        let f = fixture_with(MemoryTokenStore::with_token(token.clone()), backend);

        assert_eq!(f.creds.token(), Some(token));
        assert!(f.creds.snapshot().user_profile.is_none());
        assert!(!f.creds.refresh_armed());

        let snapshot = f.creds.verify_session().await.unwrap();
        assert_eq!(snapshot.username(), Some("admin"));
        assert!(f.creds.refresh_armed());
    }

    #[tokio::test]
    async fn test_verify_401_logs_out() {
        let backend = MockAuthBackend::new().with_user("admin", "secret", &[]);
        let f = fixture_with(MemoryTokenStore::with_token("stale"), backend);

        let err = f.creds.verify_session().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(!f.creds.snapshot().is_logged_in());
        assert!(f.store.load().is_none());
    }

    #[tokio::test]
    async fn test_verify_network_failure_keeps_token() {
        let backend = MockAuthBackend::new().with_user("admin", "secret", &[]);
        let token = backend.issue_token("admin");
        backend.fail_profile_with(AuthError::Network("down".into()));
        let f = fixture_with(MemoryTokenStore::with_token(token), backend);

        assert!(f.creds.verify_session().await.is_err());
        assert!(f.creds.snapshot().is_logged_in());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_unverified_arms_refresh() {
        let backend = MockAuthBackend::new().with_user("admin", "secret", &[]);
        let token = backend.issue_token("admin");
        backend.fail_profile_with(AuthError::Network("down".into()));
        let f = fixture_with(MemoryTokenStore::with_token(token.clone()), backend);
        assert!(!f.creds.refresh_armed());

        assert!(f.creds.keep_unverified());
        assert!(f.creds.refresh_armed());
        // Idempotent: the pending timer is kept.
        assert!(f.creds.keep_unverified());

        tokio::time::sleep(Duration::from_secs(56)).await;
        assert_eq!(f.backend.refresh_calls(), 1);
        assert_ne!(f.creds.token(), Some(token));
    }

    #[tokio::test]
    async fn test_keep_unverified_without_session() {
        let f = fixture();
        assert!(!f.creds.keep_unverified());
        assert!(!f.creds.refresh_armed());
    }

    #[tokio::test]
    async fn test_verify_without_session() {
        let f = fixture();
        assert_eq!(
            f.creds.verify_session().await.unwrap_err(),
            CredentialError::NoSession
        );
    }

    #[tokio::test]
    async fn test_handle_call_error() {
        let f = fixture();
        f.creds.login("admin", "secret").await.unwrap();

        assert!(!f.creds.handle_call_error(&AuthError::Network("x".into())));
        assert!(f.creds.snapshot().is_logged_in());

        assert!(f.creds.handle_call_error(&AuthError::Unauthorized));
        assert!(!f.creds.snapshot().is_logged_in());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_success_rotates_and_rearms() {
        let f = fixture();
        let first = f.creds.login("admin", "secret").await.unwrap();
        let seen = record_broadcasts(&f.bus);

        tokio::time::sleep(Duration::from_secs(56)).await;

        assert_eq!(f.backend.refresh_calls(), 1);
        let current = f.creds.snapshot();
        assert!(current.is_logged_in());
        assert_ne!(current.token, first.token);
        assert_eq!(f.store.load(), current.token);
        assert!(f.creds.refresh_armed());
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_logs_out() {
        let f = fixture();
        f.creds.login("admin", "secret").await.unwrap();
        f.backend.fail_refresh_with(AuthError::Network("down".into()));

        tokio::time::sleep(Duration::from_secs(56)).await;

        assert_eq!(f.backend.refresh_calls(), 1);
        assert!(!f.creds.snapshot().is_logged_in());
        assert!(f.store.load().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_refresh_after_logout() {
        let f = fixture();
        f.creds.login("admin", "secret").await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;

        f.creds.logout(LogoutReason::UserRequested);
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(f.backend.refresh_calls(), 0);
    }
}
