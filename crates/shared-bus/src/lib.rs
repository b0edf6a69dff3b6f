//! # Shared Bus - Host/Sandbox Message Bus
//!
//! The single communication channel between the host shell and the
//! sandboxed sub-applications. Sandboxes never call the host directly; they
//! publish on named channels and the host answers the same way.
//!
//! ```text
//! ┌──────────────┐   auth:getToken    ┌──────────────┐
//! │   Sandbox    │ ─────────────────► │     Host     │
//! │ (sub-app)    │                    │   (shell)    │
//! │              │ ◄───────────────── │              │
//! └──────────────┘ auth:setAuthInfo:* └──────────────┘
//!        ▲                                   │
//!        └──────── session-changed ──────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Delivery is synchronous and FIFO per bus (nested publishes are queued).
//! - The handler set is snapshotted at publish time.
//! - A failing handler never prevents delivery to the others.
//! - `request` bounds every pull with a timeout.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod request;
pub mod subscriber;

// Re-export main types
pub use events::{BusMessage, BusPayload, Channel, MessageId};
pub use publisher::{Handler, MessageBus, SubscriptionToken};
pub use request::BusError;
pub use subscriber::{Subscription, SubscriptionError};

/// Default wait for a reply to `auth:getToken`.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_timeout() {
        assert_eq!(DEFAULT_REQUEST_TIMEOUT_MS, 3000);
    }
}
