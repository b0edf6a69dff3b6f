//! # Shell Runtime Library
//!
//! Host side of the micro-application shell: component wiring, bus
//! handlers, HTTP adapters and the runtime driving them. The binary in
//! `main.rs` is a line-oriented console over [`ShellRuntime`].
//!
//! ## Control Flow
//!
//! ```text
//! nav /order-system/detail/7
//!   │
//!   ├─→ RouteTable (MF-05)        host route + metadata
//!   ├─→ AuthGuard (MF-03)         session / permission / redirect
//!   ├─→ HostNavigator             push
//!   └─→ LifecycleOrchestrator (MF-04)
//!         ├─ SessionReader (MF-02)    snapshot injected before activation
//!         └─ RouteSynchronizer (MF-05) relative path for the sandbox
//! ```
//!
//! ## Module Structure
//!
//! - `container/` - `ShellConfig` and the wired `ShellContainer`
//! - `adapters/` - HTTP auth backend, HTTP sandbox runtime, metric hooks
//! - `handlers/` - cross-component bus handlers
//! - `runtime` - `ShellRuntime`
//! - `command` - console commands

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod command;
pub mod container;
pub mod handlers;
pub mod runtime;

pub use command::{Command, CommandError};
pub use container::{ConfigError, ShellAdapters, ShellConfig, ShellContainer};
pub use runtime::{NavigationOutcome, ShellError, ShellRuntime, ShellStatus};
