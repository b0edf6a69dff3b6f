//! # Ports
//!
//! Dependencies of the Credential Synchronizer on the outside world.

pub mod outbound;

pub use outbound::{AuthBackend, MockAuthBackend};
