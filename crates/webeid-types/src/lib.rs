//! # Web eID Types Crate
//!
//! This crate contains the wire vocabulary exchanged between a web page and
//! the Web eID browser extension over the page's message bus.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every message that crosses the page/extension
//!   boundary is defined here.
//! - **Closed Error Taxonomy**: `ErrorKind` has one variant per `ErrorCode`;
//!   mapping between them is exhaustive.
//! - **Lenient Inbound, Strict Outbound**: Outbound requests are fully typed.
//!   Inbound payloads ignore fields they do not know.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod action;
pub mod entities;
pub mod errors;
pub mod ipc;

pub use action::{initial_action, Action, BusAction, Phase, ACTION_PREFIX};
pub use entities::*;
pub use errors::*;
pub use ipc::*;
