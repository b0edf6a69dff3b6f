//! # Domain Errors
//!
//! Error types for the Credential Synchronizer.

use thiserror::Error;

/// Failures of the authentication backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// HTTP 401: the token (or the credentials) are not accepted.
    #[error("Unauthorized")]
    Unauthorized,

    /// The backend could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with something unexpected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The backend refused the request for another reason.
    #[error("Request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Backend message
        message: String,
    },
}

impl AuthError {
    /// Whether this error must end the session.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Credential synchronizer error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The backend call failed.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Username or password missing.
    #[error("Username and password are required")]
    MissingCredentials,

    /// The operation needs a session and there is none.
    #[error("No active session")]
    NoSession,

    /// The session changed while the operation was in flight; its result was
    /// discarded.
    #[error("Session changed during the operation")]
    SessionChanged,
}

impl CredentialError {
    /// Whether the underlying cause is an HTTP 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Auth(AuthError::Unauthorized))
    }
}
