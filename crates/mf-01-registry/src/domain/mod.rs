//! # Domain Layer
//!
//! Sub-application descriptors and registry errors.

pub mod entities;
pub mod errors;

pub use entities::{SubAppDescriptor, DEFAULT_RELATIVE_PATH};
pub use errors::RegistryError;
