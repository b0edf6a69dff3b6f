//! # Domain Errors
//!
//! Error types for the Lifecycle Orchestrator.

use super::entities::InstanceStatus;
use mf_05_route_sync::RouteError;
use thiserror::Error;

/// Failures reported by a sandbox runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    /// The entry document could not be fetched.
    #[error("Entry {url} unreachable: {reason}")]
    EntryUnreachable {
        /// Entry URL
        url: String,
        /// Cause
        reason: String,
    },

    /// The sub-application failed while starting.
    #[error("Sandbox script failure: {0}")]
    Script(String),

    /// The handle does not name a live sandbox.
    #[error("Unknown sandbox handle: {0}")]
    UnknownHandle(u64),
}

/// Lifecycle orchestrator error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Loading or mounting needs a session.
    #[error("No session; refusing to load or mount {0}")]
    NoSession(String),

    /// The sub-application is not registered.
    #[error("Unknown sub-application: {0}")]
    UnknownSubApp(String),

    /// No sandbox runtime is configured.
    #[error("No sandbox runtime available")]
    NoRuntime,

    /// The sandbox failed to load or start.
    #[error("Failed to load {sub_app}: {source}")]
    Load {
        /// Sub-application
        sub_app: String,
        /// Runtime failure
        #[source]
        source: SandboxError,
    },

    /// The operation was overtaken by a newer one (deactivate, dispose, or a
    /// later navigation) and its result discarded.
    #[error("Operation on {0} superseded")]
    Superseded(String),

    /// Illegal state change.
    #[error("Invalid transition for {sub_app}: {from} -> {to}")]
    InvalidTransition {
        /// Sub-application
        sub_app: String,
        /// Current status
        from: InstanceStatus,
        /// Requested status
        to: InstanceStatus,
    },

    /// Host path translation failed.
    #[error("Route error: {0}")]
    Route(#[from] RouteError),
}
