//! # Error Types
//!
//! Errors shared across the shell crates.

use thiserror::Error;

/// Errors raised by a host navigator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// The location cannot be navigated to.
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// The navigator refused the transition.
    #[error("Navigation rejected: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_error_display() {
        let err = NavigationError::Rejected("busy".to_string());
        assert!(err.to_string().contains("busy"));
    }
}
