//! # Domain Layer
//!
//! Guard states, decisions and errors.

pub mod entities;
pub mod errors;

pub use entities::{GuardDecision, GuardState};
pub use errors::{GuardError, VerificationFailure};
