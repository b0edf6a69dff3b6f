//! # Sandbox Client
//!
//! What a sub-application links against to talk to the host shell.
//!
//! ```text
//!  mount props ──► SandboxBridge ──► cached SessionSnapshot
//!                     │   ▲
//!  auth:getToken ◄────┘   └──── session-changed / auth:setAuthInfo:{app}
//!  sub-route-change ◄── navigate_internal()
//!  {app}-mounted    ◄── announce_mounted()
//! ```
//!
//! Run without a host (standalone), the bridge reads its token from a local
//! `TokenStore` and publishes nothing.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod bridge;
pub mod config;

pub use bridge::{AuthInfo, SandboxBridge};
pub use config::BridgeConfig;
