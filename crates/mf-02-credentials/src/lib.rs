//! # MF-02 Credential Synchronizer
//!
//! Owns the one process-wide session and keeps every sandbox in step with
//! it.
//!
//! **Subsystem ID:** 02
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Synchronization Paths
//!
//! | Path | Channel | Trigger |
//! |------|---------|---------|
//! | Push | `session-changed` | every session mutation (login, refresh, profile, logout) |
//! | Pull | `auth:getToken` → `auth:setAuthInfo:{sender}` | sandbox request |
//! | Logout | `auth:logout` | sandbox request, handled like `logout()` |
//!
//! ## Session Lifecycle
//!
//! ```text
//!          login / restore
//!   ┌──────────────┐      ┌───────────────────────────────┐
//!   │  No Session  │ ───► │ Session (token, profile,      │
//!   │              │      │          refresh timer)       │
//!   └──────────────┘      └───────────────────────────────┘
//!          ▲                 │ timer fires → refresh
//!          │                 │   ok   → new token, re-arm, broadcast
//!          └──── logout ◄────┘   fail → logout
//! ```
//!
//! Logout cancels the refresh timer before it clears the token; a refresh
//! that was already in flight is discarded by an epoch check.
//!
//! ## Module Structure
//!
//! ```text
//! mf-02-credentials/
//! ├── domain/          # Session, RefreshTimer, LogoutReason, errors, wire shapes
//! ├── ports/           # AuthBackend (outbound) + MockAuthBackend
//! ├── application/     # CredentialSynchronizer
//! └── config.rs        # CredentialConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::CredentialSynchronizer;
pub use config::CredentialConfig;
pub use domain::{
    AuthError, CredentialError, LoginRequest, LoginResponse, LogoutReason, RefreshResponse,
    RefreshTimer, Session,
};
pub use ports::{AuthBackend, MockAuthBackend};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
