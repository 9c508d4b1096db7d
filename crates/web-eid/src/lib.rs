//! Web eID - page-side library for the Web eID browser extension.
//!
//! A page asks the extension for four operations: status, authenticate,
//! get-signing-certificate and sign. The extension forwards them to a native
//! application that holds the user's keys. Page and extension share nothing
//! but a broadcast message bus, so this crate correlates fire-and-forget
//! messages into awaitable results.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           WEB EID                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │  WebEid (WebEidApi)                                       │  │
//! │  │  validate → grace period → timeout budget → send          │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  ┌────────────────────────────┴──────────────────────────────┐  │
//! │  │  WebExtensionService                                      │  │
//! │  │  PendingRegistry (one per action) + ack / reply timers    │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  domain: semver · version · error_codec · timeouts · config     │
//! └───────────────────────────────┼─────────────────────────────────┘
//!                                 │
//!                             Page Bus
//!                                 │
//!                       Extension content script
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use web_eid::{WebEid, WebEidApi, WebEidConfig};
//! use webeid_bus::InMemoryMessageBus;
//!
//! let bus = Arc::new(InMemoryMessageBus::new());
//! let web_eid = WebEid::new(bus, WebEidConfig::default())?;
//! let versions = web_eid.status().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod domain;
pub mod ipc;
pub mod ports;
pub mod service;
pub mod telemetry;

pub use domain::config::{ConfigError, WebEidConfig};
pub use domain::error_codec::{deserialize_error, serialize_error, serialize_foreign_error};
pub use domain::version::{check_compatibility, has_version_properties};
pub use ipc::WebExtensionService;
pub use ports::WebEidApi;
pub use service::WebEid;
pub use telemetry::{init_tracing, TelemetryConfig, TelemetryError};

/// Library version, sent with every request.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
