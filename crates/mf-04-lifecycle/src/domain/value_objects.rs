//! # Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the sandbox is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SandboxStrategy {
    /// Full execution-context isolation.
    Isolated,
    /// Reduced-isolation fallback (degrade mode).
    Degraded,
}

impl fmt::Display for SandboxStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Isolated => f.write_str("isolated"),
            Self::Degraded => f.write_str("degraded"),
        }
    }
}

/// Opaque reference to a sandbox owned by a runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SandboxHandle {
    /// Runtime-assigned identifier.
    pub id: u64,
    /// Sub-application loaded in the sandbox.
    pub sub_app: String,
    /// Construction strategy.
    pub strategy: SandboxStrategy,
}

/// Result of a best-effort preload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadOutcome {
    /// The sandbox is loaded and waiting for navigation.
    Loaded,
    /// An instance is already live; nothing to do.
    AlreadyLive,
    /// No session (loading without one is forbidden).
    SkippedNoSession,
    /// Preloading is switched off.
    SkippedDisabled,
    /// No sandbox runtime.
    Unsupported,
    /// The instance was disposed or replaced while loading.
    Superseded,
    /// Loading failed; the instance is in `Error`.
    Failed(String),
}

/// Result of a successful navigation into a sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Sub-application now active.
    pub sub_app: String,
    /// Relative path the sandbox was sent to.
    pub relative_path: String,
    /// Whether an existing sandbox was reused.
    pub reused: bool,
    /// Instance generation.
    pub generation: u64,
}
