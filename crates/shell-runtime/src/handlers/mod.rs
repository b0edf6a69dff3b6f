//! # Bus Handlers
//!
//! Host-side reactions to bus traffic that span several components:
//!
//! 1. `session-changed` with no token → guard redirect to login
//! 2. `sub-route-change` → lifecycle bookkeeping and push metrics
//! 3. `{subAppName}-mounted` → mount telemetry

pub mod mounted;
pub mod route_change;
pub mod session_observer;

pub use mounted::MountedHandler;
pub use route_change::RouteChangeHandler;
pub use session_observer::SessionLossHandler;
