//! # Shell Container
//!
//! Holds every shell component with its adapters wired in.
//!
//! - Components are created in dependency order (registry first, lifecycle
//!   last)
//! - Cross-component traffic goes over the message bus, except for the
//!   narrow ports (`SessionReader`, `SessionAuthority`, `InstanceDisposer`)

pub mod config;
pub mod shell;

pub use config::{AuthApiConfig, ConfigError, SandboxConfig, ShellConfig};
pub use shell::{ShellAdapters, ShellContainer};
