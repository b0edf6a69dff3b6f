//! # Shared Types Crate
//!
//! Values and ports shared by every crate of the micro-application shell:
//! the session snapshot, user profile, route locations and metadata, and the
//! traits through which components reach each other.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate types are defined here only.
//! - **Snapshots, not references**: components other than the credential
//!   synchronizer only ever see `SessionSnapshot` values.
//! - **Ports at the seams**: browser primitives (router, storage slot) are
//!   traits with in-memory implementations for tests and the demo host.

pub mod entities;
pub mod errors;
pub mod mount;
pub mod ports;
pub mod routing;

pub use entities::*;
pub use errors::*;
pub use mount::*;
pub use ports::*;
pub use routing::*;

/// Identifier the host shell uses as `sender_id` on the bus.
pub const HOST_SENDER_ID: &str = "main-app";
