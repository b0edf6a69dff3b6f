//! # MF-04 Lifecycle Orchestrator
//!
//! Drives every sandbox through load, mount, activation, suspension and
//! disposal.
//!
//! **Subsystem ID:** 04
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Instance State Machine
//!
//! ```text
//! Registered → Preloading → Loaded → Mounted → Active ⇄ Inactive
//!                  │           │                  │         │
//!                  └──► Error ◄┘                  └─► Unmounting → Disposed
//! ```
//!
//! ## Guarantees
//!
//! | Guarantee | Mechanism |
//! |-----------|-----------|
//! | One live instance per sub-app | instances keyed by name |
//! | No load or mount without a session | checked on entry and after every await |
//! | Fresh credentials at activation | snapshot read and injected in the same critical section that sets `Active` |
//! | Stale load completions are no-ops | per-instance generation compared after every await |
//!
//! The sandbox technology sits behind `SandboxRuntime`. The orchestrator
//! holds an optional runtime and refuses to mount without one.
//!
//! ## Module Structure
//!
//! ```text
//! mf-04-lifecycle/
//! ├── domain/          # InstanceStatus, MountedInstance, SandboxHandle, errors
//! ├── ports/           # SandboxRuntime, LifecycleHooks (outbound) + mocks
//! ├── application/     # LifecycleOrchestrator
//! └── config.rs        # LifecycleConfig, IsolationCapabilities
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::LifecycleOrchestrator;
pub use config::{IsolationCapabilities, LifecycleConfig};
pub use domain::{
    Activation, InstanceStatus, LifecycleError, MountedInstance, PreloadOutcome, SandboxError,
    SandboxHandle, SandboxStrategy,
};
pub use ports::{LifecycleHooks, MockSandboxRuntime, SandboxRuntime, TracingHooks};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
