//! # Application Layer
//!
//! The credential synchronizer service.

pub mod service;

pub use service::CredentialSynchronizer;
