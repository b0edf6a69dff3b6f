//! # Application Layer
//!
//! The registry service.

pub mod service;

pub use service::SubAppRegistry;
