//! # Outbound Ports
//!
//! What the synchronizer asks the host before following a sandbox.

use crate::domain::RouteError;
use shared_types::RouteLocation;

/// Admission of sandbox-initiated navigation - outbound port.
///
/// Called synchronously from the `sub-route-change` handler, so
/// implementations must not block or publish on the bus.
pub trait SubRouteAdmission: Send + Sync {
    /// `Ok` if `sub_app` may move the host navigator to `location`;
    /// otherwise `RouteError::Rejected`.
    fn admit(&self, sub_app: &str, location: &RouteLocation) -> Result<(), RouteError>;
}
