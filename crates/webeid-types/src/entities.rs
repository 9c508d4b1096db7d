//! # Domain Entities
//!
//! Plain data shared by the compatibility check, the error taxonomy and the
//! success payloads.

use serde::{Deserialize, Serialize};

/// Semantic versions of the three cooperating components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versions {
    /// Version of this library.
    pub library: String,
    /// Version of the browser extension.
    pub extension: String,
    /// Version of the native application.
    pub native_app: String,
}

/// Which components are below the library's major version.
///
/// Always derived from `Versions`, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiresUpdate {
    #[serde(default)]
    pub extension: bool,
    #[serde(default)]
    pub native_app: bool,
}

impl RequiresUpdate {
    pub fn any(&self) -> bool {
        self.extension || self.native_app
    }
}

/// One signature scheme the signing certificate's key supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureAlgorithm {
    /// `ECC` or `RSA`.
    pub crypto_algorithm: String,
    /// e.g. `SHA-256`, `SHA3-384`.
    pub hash_function: String,
    /// `NONE`, `PKCS1.5` or `PSS`.
    pub padding_scheme: String,
}
