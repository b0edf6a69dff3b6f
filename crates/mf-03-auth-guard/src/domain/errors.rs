//! # Domain Errors

use mf_02_credentials::CredentialError;
use thiserror::Error;

/// Guard configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// A configured path is not absolute.
    #[error("Guard path '{field}' must start with '/': {value}")]
    RelativePath {
        /// Config field
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// The login route would itself be guarded.
    #[error("Login route {0} must be public")]
    LoginNotPublic(String),

    /// The redirect query key is empty.
    #[error("Redirect query key must not be empty")]
    EmptyRedirectKey,
}

/// Why verifying a stored session failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Session verification failed: {message}")]
pub struct VerificationFailure {
    /// The session cannot be kept whatever the policy (401, token gone).
    pub fatal: bool,
    /// Cause.
    pub message: String,
}

impl From<CredentialError> for VerificationFailure {
    fn from(error: CredentialError) -> Self {
        let fatal = error.is_unauthorized() || matches!(error, CredentialError::NoSession);
        Self {
            fatal,
            message: error.to_string(),
        }
    }
}
