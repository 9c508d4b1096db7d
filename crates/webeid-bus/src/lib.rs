//! # Web eID Bus - The Page's Shared Message Channel
//!
//! Models the browser's `window.postMessage` channel: an untyped broadcast
//! bus visible to every script on the page and to the extension's content
//! script.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────────┐
//! │  Page script │                    │ Extension content│
//! │  (web-eid)   │  post_message()    │     script       │
//! │              │ ──────┐            │                  │
//! └──────────────┘       │            └──────────────────┘
//!        ↑               ▼                    ↑   │
//!        │         ┌──────────────┐           │   │
//!        └──────── │   Page Bus   │ ──────────┘   │
//!     subscribe()  │  (broadcast) │ ◄─────────────┘
//!                  └──────────────┘
//! ```
//!
//! ## Rules
//!
//! - Every subscriber sees every message, including its own posts.
//! - Messages are plain JSON values; nothing is typed at this layer.
//! - There is no addressing: correlation is the receiver's job.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod message;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use message::{BusMessage, MessageFilter};
pub use publisher::{InMemoryMessageBus, MessagePublisher, PageBus, SecureContext};
pub use subscriber::{MessageStream, MessageSubscriber, Subscription};

/// Maximum messages to buffer per subscriber before the slowest one lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
