//! # Request/Reply
//!
//! Timeout-bounded request over the bus. The reply handler is registered
//! before the request is published so a synchronous reply (delivered in the
//! same drain as the request) is never missed.
//!
//! ```text
//! requester                      bus                       responder
//!    │ subscribe_once(reply) ──►  │                            │
//!    │ publish(request) ───────►  │ ─────────────────────────► │
//!    │                            │ ◄──────── publish(reply) ── │
//!    │ ◄──────── oneshot ──────── │                            │
//!    │  (or Timeout after `wait`; reply handler removed)       │
//! ```
//!
//! The reply handler is also removed when the request future is dropped
//! before it completes.

use crate::events::{BusMessage, BusPayload, Channel};
use crate::publisher::{MessageBus, SubscriptionToken};
use parking_lot::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Errors from `MessageBus::request`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// No reply arrived in time.
    #[error("No reply on '{channel}' within {waited_ms}ms")]
    Timeout {
        /// Reply channel that stayed silent.
        channel: String,
        /// Time waited.
        waited_ms: u64,
    },

    /// The reply handler was removed before a reply arrived.
    #[error("Reply handler on '{channel}' dropped before a reply arrived")]
    ReplyDropped {
        /// Reply channel.
        channel: String,
    },
}

/// Removes the reply handler when the request ends, however it ends.
struct ReplyGuard<'a> {
    bus: &'a MessageBus,
    token: SubscriptionToken,
}

impl Drop for ReplyGuard<'_> {
    fn drop(&mut self) {
        // Already gone after a delivered reply.
        self.bus.unsubscribe(&self.token);
    }
}

impl MessageBus {
    /// Publish `payload` on `request_channel` and wait up to `wait` for the
    /// first message on `reply_channel`.
    pub async fn request(
        &self,
        request_channel: impl Into<Channel>,
        payload: BusPayload,
        reply_channel: impl Into<Channel>,
        sender_id: &str,
        wait: Duration,
    ) -> Result<BusMessage, BusError> {
        let reply_channel = reply_channel.into();
        let (tx, rx) = oneshot::channel();
        let slot = Mutex::new(Some(tx));

        let _reply = ReplyGuard {
            bus: self,
            token: self.subscribe_once(reply_channel.clone(), move |msg| {
                if let Some(tx) = slot.lock().take() {
                    let _ = tx.send(msg.clone());
                }
            }),
        };

        self.publish(request_channel, payload, sender_id);

        match tokio::time::timeout(wait, rx).await {
            Ok(Ok(reply)) => {
                debug!(channel = %reply_channel, "Reply received");
                Ok(reply)
            }
            Ok(Err(_)) => Err(BusError::ReplyDropped {
                channel: reply_channel.to_string(),
            }),
            Err(_) => {
                let waited_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
                warn!(channel = %reply_channel, waited_ms, "Request timed out");
                Err(BusError::Timeout {
                    channel: reply_channel.to_string(),
                    waited_ms,
                })
            }
        }
    }
}
