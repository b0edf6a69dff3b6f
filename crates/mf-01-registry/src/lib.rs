//! # MF-01 Sub-App Registry
//!
//! Static catalogue of the sub-applications the shell can mount.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Every sub-application is described once at process start: where its entry
//! document lives, which host path prefix it owns, and which sandbox
//! policies apply to it (keep-alive, degrade, script execution). Descriptors
//! are immutable after registration and shared as `Arc<SubAppDescriptor>`.
//!
//! ## Entry URLs
//!
//! | Environment | Entry URL |
//! |-------------|-----------|
//! | Development | `{scheme}://localhost:{port}/` |
//! | Production  | `{scheme}://{current_host}/{name}/` |
//!
//! The environment is fixed at build time (`SHELL_ENV`, falling back to the
//! build profile) and never read at runtime.
//!
//! ## Module Structure
//!
//! ```text
//! mf-01-registry/
//! ├── domain/          # SubAppDescriptor, RegistryError
//! ├── application/     # SubAppRegistry
//! └── config.rs        # RegistryConfig, SubAppConfig, Environment
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;

// Re-exports
pub use application::SubAppRegistry;
pub use config::{Environment, RegistryConfig, SubAppConfig, JUMP_BASE_PROP};
pub use domain::{RegistryError, SubAppDescriptor, DEFAULT_RELATIVE_PATH};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
