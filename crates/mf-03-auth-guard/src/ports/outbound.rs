//! # Outbound Ports
//!
//! What the guard needs from the session owner.

use crate::domain::VerificationFailure;
use async_trait::async_trait;
use mf_02_credentials::{CredentialSynchronizer, LogoutReason};
use shared_types::SessionSnapshot;

/// Session owner - outbound port.
#[async_trait]
pub trait SessionAuthority: Send + Sync {
    /// Current session.
    fn snapshot(&self) -> SessionSnapshot;

    /// Verify the stored token and resolve its profile.
    async fn verify(&self) -> Result<SessionSnapshot, VerificationFailure>;

    /// Keep the session although verification failed (fail-open). Returns
    /// whether a token is still live.
    fn keep_unverified(&self) -> bool;

    /// Drop the session after a failed verification.
    fn invalidate(&self);
}

#[async_trait]
impl SessionAuthority for CredentialSynchronizer {
    fn snapshot(&self) -> SessionSnapshot {
        CredentialSynchronizer::snapshot(self)
    }

    async fn verify(&self) -> Result<SessionSnapshot, VerificationFailure> {
        self.verify_session().await.map_err(VerificationFailure::from)
    }

    fn keep_unverified(&self) -> bool {
        CredentialSynchronizer::keep_unverified(self)
    }

    fn invalidate(&self) {
        self.logout(LogoutReason::VerificationFailed);
    }
}
