//! Pure domain logic: configuration, version gating, error transport and
//! timeout arithmetic. Nothing here touches the bus or the clock.

pub mod config;
pub mod correlation;
pub mod error_codec;
pub mod semver;
pub mod timeouts;
pub mod version;

pub use config::{ConfigError, WebEidConfig};
pub use correlation::CorrelationId;
pub use error_codec::{deserialize_error, serialize_error, serialize_foreign_error};
pub use semver::{compare_semver, parse_semver, IdentifierDiff, Semver, SemverDiff};
pub use timeouts::{timeout_budget, OperationProfile};
pub use version::{check_compatibility, has_version_properties};
