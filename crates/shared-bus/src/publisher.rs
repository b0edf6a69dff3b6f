//! # Message Bus
//!
//! Process-wide publish/subscribe channel shared by the host and every
//! sandbox. One instance lives for the whole session; sandboxes receive a
//! handle through their mount props.
//!
//! ## Delivery
//!
//! ```text
//! publish(A) ──► snapshot handlers of A ──► queue ──► drain (run to completion)
//!                                                       │
//!        handler publishes B ──► snapshot of B ──► queue ┘ (delivered after A)
//! ```
//!
//! - Handlers run synchronously inside the outermost `publish` call.
//! - A publish issued from inside a handler is queued, so every handler of
//!   one message finishes before any handler of the next (FIFO per bus).
//! - The handler set is fixed at publish time: handlers added during
//!   delivery do not see the in-flight message, handlers removed during
//!   delivery are skipped if they have not run yet.
//! - A panicking handler is logged and isolated from the other handlers.

use crate::events::{BusMessage, BusPayload, Channel, MessageId};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Callback invoked for every message on a subscribed channel.
pub type Handler = Arc<dyn Fn(&BusMessage) + Send + Sync>;

/// Handle returned by `subscribe`; pass it to `unsubscribe` to remove the
/// handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionToken {
    channel: Channel,
    id: u64,
}

impl SubscriptionToken {
    /// Channel the handler is registered on.
    #[must_use]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }
}

struct Registration {
    id: u64,
    handler: Handler,
    once: bool,
    active: AtomicBool,
}

struct Dispatch {
    message: BusMessage,
    targets: Vec<Arc<Registration>>,
}

#[derive(Default)]
struct BusState {
    channels: HashMap<Channel, Vec<Arc<Registration>>>,
    queue: VecDeque<Dispatch>,
    dispatching: bool,
}

/// Counters exposed for diagnostics.
#[derive(Debug, Default)]
struct BusStats {
    published: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    handler_failures: AtomicU64,
}

/// In-process message bus.
pub struct MessageBus {
    state: Mutex<BusState>,
    next_id: AtomicU64,
    stats: BusStats,
}

impl MessageBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BusState::default()),
            next_id: AtomicU64::new(1),
            stats: BusStats::default(),
        }
    }

    /// Publish a message. Returns once every handler registered at publish
    /// time has run, unless this call is nested inside another delivery, in
    /// which case the message is queued behind the current one.
    ///
    /// Publishing to a channel with no subscribers is a logged no-op.
    pub fn publish(
        &self,
        channel: impl Into<Channel>,
        payload: BusPayload,
        sender_id: &str,
    ) -> MessageId {
        let message = BusMessage::new(channel.into(), payload, sender_id);
        let id = message.id;
        self.stats.published.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state.lock();
        let targets = state
            .channels
            .get(&message.channel)
            .cloned()
            .unwrap_or_default();

        if targets.is_empty() {
            drop(state);
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(
                channel = %message.channel,
                sender = %message.sender_id,
                kind = message.payload.kind(),
                "Message dropped (no subscribers)"
            );
            return id;
        }

        trace!(
            channel = %message.channel,
            sender = %message.sender_id,
            handlers = targets.len(),
            "Message queued"
        );
        state.queue.push_back(Dispatch { message, targets });

        if state.dispatching {
            return id;
        }
        state.dispatching = true;
        drop(state);

        self.drain();
        id
    }

    /// Register a handler for every future message on `channel`.
    pub fn subscribe<F>(&self, channel: impl Into<Channel>, handler: F) -> SubscriptionToken
    where
        F: Fn(&BusMessage) + Send + Sync + 'static,
    {
        self.register(channel.into(), Arc::new(handler), false)
    }

    /// Register a handler that is removed after its first invocation.
    pub fn subscribe_once<F>(&self, channel: impl Into<Channel>, handler: F) -> SubscriptionToken
    where
        F: Fn(&BusMessage) + Send + Sync + 'static,
    {
        self.register(channel.into(), Arc::new(handler), true)
    }

    /// Remove a handler. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, token: &SubscriptionToken) -> bool {
        let mut state = self.state.lock();
        let Some(registrations) = state.channels.get_mut(&token.channel) else {
            return false;
        };
        let Some(index) = registrations.iter().position(|r| r.id == token.id) else {
            return false;
        };

        let registration = registrations.remove(index);
        registration.active.store(false, Ordering::SeqCst);
        if registrations.is_empty() {
            state.channels.remove(&token.channel);
        }
        debug!(channel = %token.channel, "Handler unsubscribed");
        true
    }

    /// Number of handlers currently registered on `channel`.
    #[must_use]
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.state
            .lock()
            .channels
            .get(&Channel::from(channel))
            .map_or(0, Vec::len)
    }

    /// Total messages published.
    #[must_use]
    pub fn messages_published(&self) -> u64 {
        self.stats.published.load(Ordering::Relaxed)
    }

    /// Total handler invocations that completed.
    #[must_use]
    pub fn deliveries(&self) -> u64 {
        self.stats.delivered.load(Ordering::Relaxed)
    }

    /// Messages published to a channel without subscribers.
    #[must_use]
    pub fn messages_dropped(&self) -> u64 {
        self.stats.dropped.load(Ordering::Relaxed)
    }

    /// Handler invocations that panicked.
    #[must_use]
    pub fn handler_failures(&self) -> u64 {
        self.stats.handler_failures.load(Ordering::Relaxed)
    }

    fn register(&self, channel: Channel, handler: Handler, once: bool) -> SubscriptionToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let registration = Arc::new(Registration {
            id,
            handler,
            once,
            active: AtomicBool::new(true),
        });

        self.state
            .lock()
            .channels
            .entry(channel.clone())
            .or_default()
            .push(registration);

        debug!(channel = %channel, once, "Handler subscribed");
        SubscriptionToken { channel, id }
    }

    fn drain(&self) {
        loop {
            let next = {
                let mut state = self.state.lock();
                match state.queue.pop_front() {
                    Some(dispatch) => dispatch,
                    None => {
                        state.dispatching = false;
                        return;
                    }
                }
            };
            self.deliver(next);
        }
    }

    fn deliver(&self, dispatch: Dispatch) {
        let Dispatch { message, targets } = dispatch;

        for registration in &targets {
            if registration.once {
                // Claim the single invocation; a concurrent unsubscribe or an
                // earlier message may already have taken it.
                if !registration.active.swap(false, Ordering::SeqCst) {
                    continue;
                }
                self.unsubscribe(&SubscriptionToken {
                    channel: message.channel.clone(),
                    id: registration.id,
                });
            } else if !registration.active.load(Ordering::SeqCst) {
                continue;
            }

            let handler = &registration.handler;
            match catch_unwind(AssertUnwindSafe(|| handler(&message))) {
                Ok(()) => {
                    self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {
                    self.stats.handler_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        channel = %message.channel,
                        sender = %message.sender_id,
                        message_id = %message.id,
                        "Bus handler panicked; remaining handlers still run"
                    );
                }
            }
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MessageBus")
            .field("channels", &state.channels.len())
            .field("queued", &state.queue.len())
            .field("published", &self.messages_published())
            .finish()
    }
}
