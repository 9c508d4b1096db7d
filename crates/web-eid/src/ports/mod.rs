//! Ports of the library.
//!
//! The inbound port is what a page calls. Outbound, the library only needs
//! a `webeid_bus::PageBus`.

pub mod inbound;

pub use inbound::WebEidApi;
