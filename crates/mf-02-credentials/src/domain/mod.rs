//! # Domain Layer
//!
//! Session entity, errors and authentication wire shapes.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::{LogoutReason, RefreshTimer, Session};
pub use errors::{AuthError, CredentialError};
pub use value_objects::{LoginRequest, LoginResponse, RefreshResponse};
