//! # Ports

pub mod outbound;

pub use outbound::SubRouteAdmission;
