//! # Domain Entities
//!
//! The per-sub-application instance record and its state machine.

use super::errors::LifecycleError;
use super::value_objects::SandboxHandle;
use serde::{Deserialize, Serialize};
use shared_types::SessionSnapshot;
use std::fmt;

/// Lifecycle state of a sub-application instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceStatus {
    /// Known to the runtime, nothing loaded.
    Registered,
    /// Entry document and scripts loading.
    Preloading,
    /// Loaded, not rendered.
    Loaded,
    /// Rendered, credentials not yet injected.
    Mounted,
    /// Visible with fresh credentials.
    Active,
    /// Hidden but kept alive.
    Inactive,
    /// Teardown in progress.
    Unmounting,
    /// Torn down. A later navigation starts a new lifecycle.
    Disposed,
    /// Loading or starting failed.
    Error,
}

impl InstanceStatus {
    /// Whether `self → next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: InstanceStatus) -> bool {
        use InstanceStatus::*;
        matches!(
            (self, next),
            (Registered | Disposed | Error, Preloading)
                | (Preloading, Loaded | Error)
                | (Loaded, Mounted | Error)
                | (Mounted, Active | Error)
                | (Active, Inactive)
                | (Inactive, Active)
                | (
                    Registered | Preloading | Loaded | Mounted | Active | Inactive | Error,
                    Unmounting
                )
                | (Unmounting, Disposed)
        )
    }

    /// Whether a sandbox exists (or is being built) for this instance.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(
            self,
            Self::Preloading
                | Self::Loaded
                | Self::Mounted
                | Self::Active
                | Self::Inactive
                | Self::Unmounting
        )
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Registered => "registered",
            Self::Preloading => "preloading",
            Self::Loaded => "loaded",
            Self::Mounted => "mounted",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Unmounting => "unmounting",
            Self::Disposed => "disposed",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Runtime record of one sub-application's sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedInstance {
    /// Sub-application name.
    pub sub_app_name: String,
    /// Sandbox owned by the runtime, once loaded.
    pub sandbox: Option<SandboxHandle>,
    /// Current state.
    pub status: InstanceStatus,
    /// Session injected at the last activation.
    pub last_injected: Option<SessionSnapshot>,
    /// Path inside the sandbox.
    pub current_relative_path: Option<String>,
    /// Bumped on every new load; completions carrying an older value are
    /// discarded.
    pub generation: u64,
    /// Last load or start failure.
    pub last_error: Option<String>,
    /// Suspend instead of destroying on deactivation.
    pub keep_alive: bool,
}

impl MountedInstance {
    /// Fresh `Registered` record.
    pub fn new(sub_app_name: impl Into<String>, keep_alive: bool) -> Self {
        Self {
            sub_app_name: sub_app_name.into(),
            sandbox: None,
            status: InstanceStatus::Registered,
            last_injected: None,
            current_relative_path: None,
            generation: 0,
            last_error: None,
            keep_alive,
        }
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn transition(&mut self, next: InstanceStatus) -> Result<(), LifecycleError> {
        if !self.status.can_transition_to(next) {
            return Err(LifecycleError::InvalidTransition {
                sub_app: self.sub_app_name.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Whether a completion tagged with `generation` still applies.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Start a new load cycle. Returns the sandbox of the previous cycle,
    /// which the caller must destroy.
    pub fn begin_load(&mut self, generation: u64) -> Result<Option<SandboxHandle>, LifecycleError> {
        self.transition(InstanceStatus::Preloading)?;
        self.generation = generation;
        self.last_error = None;
        self.last_injected = None;
        Ok(self.sandbox.take())
    }

    /// Record a failure and move to `Error`.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = InstanceStatus::Error;
        self.last_error = Some(message.into());
    }

    /// Tear down the record. Returns the sandbox to destroy.
    pub fn dispose(&mut self) -> Option<SandboxHandle> {
        // Unmounting is reachable from every state except itself and Disposed.
        if self.status.can_transition_to(InstanceStatus::Unmounting) {
            self.status = InstanceStatus::Unmounting;
        }
        self.status = InstanceStatus::Disposed;
        self.last_injected = None;
        self.current_relative_path = None;
        self.sandbox.take()
    }
}
