//! # Domain Errors
//!
//! Error types for the Sub-App Registry.

use thiserror::Error;

/// Registry error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A descriptor with the same name is already registered.
    #[error("Sub-application already registered: {0}")]
    Duplicate(String),

    /// No descriptor with this name.
    #[error("Sub-application not found: {0}")]
    NotFound(String),

    /// The descriptor is malformed.
    #[error("Invalid descriptor for '{name}': {reason}")]
    InvalidDescriptor {
        /// Descriptor name
        name: String,
        /// What is wrong with it
        reason: String,
    },
}
