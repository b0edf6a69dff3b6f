//! # Ports Layer
//!
//! - `SandboxRuntime`: the sandbox technology
//! - `LifecycleHooks`: observers of lifecycle events

pub mod outbound;

pub use outbound::{LifecycleHooks, MockSandboxRuntime, SandboxRuntime, TracingHooks};
