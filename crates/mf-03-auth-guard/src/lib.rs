//! # MF-03 Auth Guard
//!
//! Decides, for every host navigation, whether it may proceed or must be
//! redirected.
//!
//! **Subsystem ID:** 03
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## State Machine
//!
//! ```text
//!                    stored token at boot
//!   ┌─────────────────┐ ─────────────► ┌───────────┐
//!   │ Unauthenticated │                │ Resolving │
//!   └─────────────────┘ ◄───────────── └───────────┘
//!        ▲   │ login      verify failed      │ verify ok
//!        │   ▼                                ▼
//!        │ ┌───────────────┐  missing perm  ┌───────────┐
//!        └─│ Authenticated │ ─────────────► │ Forbidden │
//!   logout └───────────────┘ ◄───────────── └───────────┘
//!                              next allowed navigation
//! ```
//!
//! | State | Target | Decision |
//! |-------|--------|----------|
//! | Unauthenticated | protected | redirect `/login?redirect=<target>` |
//! | Unauthenticated | public | allow |
//! | Authenticated | login route | redirect home |
//! | Authenticated | missing permission | `Forbidden`, redirect `/403` (session untouched) |
//! | Authenticated | permitted | allow |
//! | Resolving | any | verify, then continue as Authenticated or Unauthenticated |
//!
//! ## Module Structure
//!
//! ```text
//! mf-03-auth-guard/
//! ├── domain/          # GuardState, GuardDecision, errors
//! ├── ports/           # SessionAuthority (outbound)
//! ├── application/     # AuthGuard
//! └── config.rs        # GuardConfig, VerifyFailurePolicy
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::AuthGuard;
pub use config::{GuardConfig, VerifyFailurePolicy};
pub use domain::{GuardDecision, GuardError, GuardState, VerificationFailure};
pub use ports::SessionAuthority;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
