//! # Domain Layer
//!
//! Route bindings, matches and the pure host/sub-app translation.

pub mod entities;
pub mod errors;
pub mod translation;

pub use entities::{RouteBinding, RouteKind, RouteMatch};
pub use errors::RouteError;
pub use translation::{host_to_sub, sub_to_host};
