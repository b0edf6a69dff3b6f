//! # Domain Errors

use shared_types::NavigationError;
use thiserror::Error;

/// Route synchronizer error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No sub-application with this name.
    #[error("Unknown sub-application: {0}")]
    UnknownSubApp(String),

    /// The host path is outside the sub-application's prefix.
    #[error("Path {host_path} is not under {prefix}")]
    OutsidePrefix {
        /// Host path
        host_path: String,
        /// Expected prefix
        prefix: String,
    },

    /// The host refused to follow a sandbox-initiated navigation.
    #[error("Route change from {sub_app} rejected: {reason}")]
    Rejected {
        /// Reporting sub-application
        sub_app: String,
        /// Why it was refused
        reason: String,
    },

    /// The host navigator refused the push.
    #[error("Navigation failed: {0}")]
    Navigation(#[from] NavigationError),
}
