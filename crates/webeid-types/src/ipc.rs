//! # Bus Message Payloads
//!
//! Outbound requests are fully typed and tagged by `action`. Inbound success
//! payloads ignore the `action` field and anything else they do not know.

use crate::action::Action;
use crate::entities::SignatureAlgorithm;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-call options forwarded to the extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOptions {
    /// Time before a user interaction (e.g. PIN entry) times out.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "duration_millis"
    )]
    pub user_interaction_timeout: Option<Duration>,

    /// Time before a server request times out.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "duration_millis"
    )]
    pub server_request_timeout: Option<Duration>,

    /// Two-letter ISO 639-1 language code for the extension's UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl ActionOptions {
    #[must_use]
    pub fn with_user_interaction_timeout(mut self, timeout: Duration) -> Self {
        self.user_interaction_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_server_request_timeout(mut self, timeout: Duration) -> Self {
        self.server_request_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }
}

/// A request posted by the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ExtensionRequest {
    #[serde(rename = "web-eid:status", rename_all = "camelCase")]
    Status { library_version: String },

    #[serde(rename = "web-eid:authenticate", rename_all = "camelCase")]
    Authenticate {
        library_version: String,
        challenge_nonce: String,
        options: ActionOptions,
    },

    #[serde(rename = "web-eid:get-signing-certificate", rename_all = "camelCase")]
    GetSigningCertificate {
        library_version: String,
        options: ActionOptions,
    },

    #[serde(rename = "web-eid:sign", rename_all = "camelCase")]
    Sign {
        library_version: String,
        certificate: String,
        hash: String,
        hash_function: String,
        options: ActionOptions,
    },
}

impl ExtensionRequest {
    pub fn action(&self) -> Action {
        match self {
            ExtensionRequest::Status { .. } => Action::Status,
            ExtensionRequest::Authenticate { .. } => Action::Authenticate,
            ExtensionRequest::GetSigningCertificate { .. } => Action::GetSigningCertificate,
            ExtensionRequest::Sign { .. } => Action::Sign,
        }
    }

    pub fn library_version(&self) -> &str {
        match self {
            ExtensionRequest::Status { library_version }
            | ExtensionRequest::Authenticate {
                library_version, ..
            }
            | ExtensionRequest::GetSigningCertificate {
                library_version, ..
            }
            | ExtensionRequest::Sign {
                library_version, ..
            } => library_version,
        }
    }
}

/// `web-eid:status-success` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub extension: String,
    pub native_app: String,
}

/// `web-eid:authenticate-success` body: the Web eID authentication token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    /// Base64 DER authentication certificate. Untrusted until verified
    /// against a trusted CA.
    pub unverified_certificate: String,
    /// JWA algorithm of the signature, e.g. `ES384`.
    pub algorithm: String,
    /// Base64 signature over the challenge.
    pub signature: String,
    /// Token format identifier, e.g. `web-eid:1.0`.
    pub format: String,
    /// URL identifying the issuing application and version.
    pub app_version: String,
}

/// `web-eid:get-signing-certificate-success` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningCertificateResponse {
    pub certificate: String,
    pub supported_signature_algorithms: Vec<SignatureAlgorithm>,
}

/// `web-eid:sign-success` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    pub signature: String,
    pub signature_algorithm: SignatureAlgorithm,
}

/// `web-eid:warning` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningMessage {
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Durations as integer milliseconds on the wire.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => {
                let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                serializer.serialize_some(&millis)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
