//! # Adapters
//!
//! Production implementations of the outbound ports.

pub mod http_auth;
pub mod http_sandbox;
pub mod metrics_hooks;
pub mod route_admission;

pub use http_auth::{HttpAuthBackend, MeteredAuthBackend};
pub use http_sandbox::{HttpSandboxRuntime, SandboxRecord};
pub use metrics_hooks::MetricsHooks;
pub use route_admission::ActiveRouteAdmission;
