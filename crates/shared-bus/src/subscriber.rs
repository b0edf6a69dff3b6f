//! # Channel Subscription Streams
//!
//! Async consumption of a bus channel. A `Subscription` registers a handler
//! that forwards into an unbounded queue, so a task can `await` messages
//! instead of reacting inside the publishing call.

use crate::events::{BusMessage, Channel};
use crate::publisher::{MessageBus, SubscriptionToken};
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Message bus closed")]
    Closed,
}

/// Owned subscription to one channel.
///
/// When dropped, the handler is removed from the bus.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<BusMessage>,
    bus: Weak<MessageBus>,
    token: SubscriptionToken,
}

impl Subscription {
    /// Receive the next message.
    ///
    /// Returns `None` once the bus has been dropped.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.receiver.recv().await
    }

    /// Receive without waiting.
    ///
    /// - `Ok(Some(msg))`: a message was queued
    /// - `Ok(None)`: nothing queued
    /// - `Err(SubscriptionError::Closed)`: the bus was dropped
    pub fn try_recv(&mut self) -> Result<Option<BusMessage>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(SubscriptionError::Closed),
        }
    }

    /// Channel this subscription listens on.
    #[must_use]
    pub fn channel(&self) -> &Channel {
        self.token.channel()
    }
}

impl Stream for Subscription {
    type Item = BusMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(&self.token);
        }
        debug!(channel = %self.token.channel(), "Subscription dropped");
    }
}

impl MessageBus {
    /// Subscribe to `channel` as an async stream.
    pub fn subscribe_stream(self: &Arc<Self>, channel: impl Into<Channel>) -> Subscription {
        let (tx, receiver) = mpsc::unbounded_channel();
        let token = self.subscribe(channel, move |msg| {
            // The receiver may be mid-drop; losing the message is fine then.
            let _ = tx.send(msg.clone());
        });
        Subscription {
            receiver,
            bus: Arc::downgrade(self),
            token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BusPayload;
    use std::time::Duration;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_subscription_receives_messages() {
        let bus = Arc::new(MessageBus::new());
        let mut sub = bus.subscribe_stream(Channel::SESSION_CHANGED);

        bus.publish(
            Channel::session_changed(),
            BusPayload::AuthLogout,
            "main-app",
        );

        let msg = tokio::time::timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("message");
        assert_eq!(msg.channel.as_str(), Channel::SESSION_CHANGED);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = Arc::new(MessageBus::new());
        let mut sub = bus.subscribe_stream("ch");
        assert_eq!(sub.try_recv(), Ok(None));
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let bus = Arc::new(MessageBus::new());
        {
            let _sub = bus.subscribe_stream("ch");
            assert_eq!(bus.subscriber_count("ch"), 1);
        }
        assert_eq!(bus.subscriber_count("ch"), 0);
    }

    #[tokio::test]
    async fn test_stream_interface() {
        let bus = Arc::new(MessageBus::new());
        let mut sub = bus.subscribe_stream("ch");

        bus.publish("ch", BusPayload::AuthLogout, "a");
        bus.publish("ch", BusPayload::AuthLogout, "b");

        let first = sub.next().await.expect("first");
        let second = sub.next().await.expect("second");
        assert_eq!(first.sender_id, "a");
        assert_eq!(second.sender_id, "b");
    }
}
