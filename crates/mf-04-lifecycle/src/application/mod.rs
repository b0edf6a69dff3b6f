//! # Application Layer
//!
//! The orchestrator service.

pub mod service;

pub use service::LifecycleOrchestrator;
