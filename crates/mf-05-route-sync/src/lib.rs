//! # MF-05 Route Synchronizer
//!
//! Keeps the host navigator and every sandbox's internal navigator pointing
//! at the same place.
//!
//! **Subsystem ID:** 05
//!
//! ## Translation
//!
//! ```text
//! host path                      sub-app            relative path
//! /order-system/detail/7   ⇄   order-system   ⇄   /detail/7
//! /order-system            →   order-system   →   /list        (default path)
//! ```
//!
//! ## Feedback-Loop Guard
//!
//! A `sub-route-change` from a sandbox is pushed to the host navigator only
//! if the composed host path differs from the current one. The sandbox side
//! applies the converse check, so neither side echoes the other.
//!
//! ## Admission
//!
//! When a `SubRouteAdmission` is attached, every sandbox-initiated change is
//! submitted to it first. The host uses this to follow only the active
//! sub-application and only onto routes the auth guard would allow.
//!
//! ## Module Structure
//!
//! ```text
//! mf-05-route-sync/
//! ├── domain/          # RouteBinding, RouteMatch, translation, errors
//! ├── ports/           # SubRouteAdmission (outbound)
//! ├── application/     # RouteSynchronizer, RouteTable
//! └── config.rs        # RouteTableConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::{RouteSynchronizer, RouteTable};
pub use config::RouteTableConfig;
pub use domain::{host_to_sub, sub_to_host, RouteBinding, RouteError, RouteKind, RouteMatch};
pub use ports::SubRouteAdmission;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
