//! # Message Publisher
//!
//! The posting side of the page bus, plus the secure-context probe the page
//! library consults before talking to the extension.

use crate::message::{BusMessage, MessageFilter};
use crate::subscriber::{MessageSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for posting messages to the page bus.
///
/// Posting is fire-and-forget, like `window.postMessage`: it never blocks and
/// never reports delivery failure to the caller.
pub trait MessagePublisher: Send + Sync {
    /// Post a message. Returns the number of subscribers it reached.
    fn post_message(&self, message: BusMessage) -> usize;

    /// Total messages posted since creation.
    fn messages_posted(&self) -> u64;
}

/// Whether the hosting page runs in a secure context (HTTPS or localhost).
pub trait SecureContext: Send + Sync {
    fn is_secure_context(&self) -> bool;
}

/// Everything the page library needs from its environment.
pub trait PageBus: MessagePublisher + MessageSubscriber + SecureContext {}

impl<T> PageBus for T where T: MessagePublisher + MessageSubscriber + SecureContext {}

/// In-memory page bus.
///
/// Uses `tokio::sync::broadcast`, so every subscriber sees every message
/// posted after it subscribed, the poster included.
pub struct InMemoryMessageBus {
    sender: broadcast::Sender<BusMessage>,

    /// Answer returned by [`SecureContext::is_secure_context`].
    secure_context: AtomicBool,

    messages_posted: AtomicU64,

    capacity: usize,
}

impl InMemoryMessageBus {
    /// Create a secure-context bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            secure_context: AtomicBool::new(true),
            messages_posted: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Flip the secure-context flag, e.g. to simulate a plain-HTTP page.
    pub fn set_secure_context(&self, secure: bool) {
        self.secure_context.store(secure, Ordering::Relaxed);
    }

    /// Builder form of [`Self::set_secure_context`].
    #[must_use]
    pub fn with_secure_context(self, secure: bool) -> Self {
        self.set_secure_context(secure);
        self
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagePublisher for InMemoryMessageBus {
    fn post_message(&self, message: BusMessage) -> usize {
        self.messages_posted.fetch_add(1, Ordering::Relaxed);

        let action = message.action().map(str::to_owned);
        match self.sender.send(message) {
            Ok(receivers) => {
                debug!(action = ?action, receivers, "Message posted");
                receivers
            }
            Err(_) => {
                warn!(action = ?action, "Message dropped (no subscribers)");
                0
            }
        }
    }

    fn messages_posted(&self) -> u64 {
        self.messages_posted.load(Ordering::Relaxed)
    }
}

impl MessageSubscriber for InMemoryMessageBus {
    fn subscribe(&self, filter: MessageFilter) -> Subscription {
        debug!(prefix = ?filter.action_prefix, "New bus subscription");
        Subscription::new(self.sender.subscribe(), filter)
    }
}

impl SecureContext for InMemoryMessageBus {
    fn is_secure_context(&self) -> bool {
        self.secure_context.load(Ordering::Relaxed)
    }
}
