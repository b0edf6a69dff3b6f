//! # Domain Layer
//!
//! Instance state machine, sandbox handles and errors.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::{InstanceStatus, MountedInstance};
pub use errors::{LifecycleError, SandboxError};
pub use value_objects::{Activation, PreloadOutcome, SandboxHandle, SandboxStrategy};
