//! Message Bus Client.
//!
//! The page and the extension share nothing but a broadcast bus. Requests go
//! out untargeted; replies come back tagged only by action name, so at most
//! one operation per action kind can be in flight.

pub mod pending;
pub mod service;
pub mod warnings;

pub use pending::{PendingRegistry, PendingState, PendingStats, Settlement};
pub use service::WebExtensionService;
pub use warnings::{strip_line_breaks, WarningLog};
