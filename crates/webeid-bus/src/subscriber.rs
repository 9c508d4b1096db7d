//! # Message Subscriber
//!
//! The listening side of the page bus.

use crate::message::{BusMessage, MessageFilter};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::debug;

/// Trait for listening on the page bus.
pub trait MessageSubscriber: Send + Sync {
    /// Listen for messages matching `filter`. Only messages posted after this
    /// call are observed.
    fn subscribe(&self, filter: MessageFilter) -> Subscription;
}

/// A subscription handle. Dropping it unsubscribes.
pub struct Subscription {
    receiver: broadcast::Receiver<BusMessage>,
    filter: MessageFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<BusMessage>, filter: MessageFilter) -> Self {
        Self { receiver, filter }
    }

    /// Receive the next matching message.
    ///
    /// Returns `None` once the bus is gone. Lagging drops the overwritten
    /// messages and keeps going.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            let message = match self.receiver.recv().await {
                Ok(m) => m,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Subscriber lagged, some messages dropped");
                    continue;
                }
            };

            if self.filter.matches(&message) {
                return Some(message);
            }
        }
    }

    #[must_use]
    pub fn filter(&self) -> &MessageFilter {
        &self.filter
    }
}

/// A subscription as a `tokio_stream::Stream`. Lagged gaps are skipped the
/// same way [`Subscription::recv`] skips them.
pub struct MessageStream {
    inner: BroadcastStream<BusMessage>,
    filter: MessageFilter,
}

impl MessageStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        let Subscription { receiver, filter } = subscription;
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &MessageFilter {
        &self.filter
    }
}

impl Stream for MessageStream {
    type Item = BusMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(message))) => {
                    if self.filter.matches(&message) {
                        return Poll::Ready(Some(message));
                    }
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    debug!(lagged = count, "Stream lagged, some messages dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
