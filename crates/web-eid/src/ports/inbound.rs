//! Inbound port: the four operations a page can request.

use async_trait::async_trait;
use webeid_types::{
    ActionOptions, AuthenticateResponse, SignResponse, SigningCertificateResponse, Versions,
    WebEidResult,
};

/// Web eID operations as seen by the embedding page.
#[async_trait]
pub trait WebEidApi: Send + Sync {
    /// Versions of the library, extension and native app. Fails with
    /// `VersionMismatch` when either component is a major version behind.
    async fn status(&self) -> WebEidResult<Versions>;

    /// Sign `challenge_nonce` with the authentication key and return the
    /// Web eID authentication token.
    async fn authenticate(
        &self,
        challenge_nonce: &str,
        options: ActionOptions,
    ) -> WebEidResult<AuthenticateResponse>;

    /// The signing certificate and the signature schemes its key supports.
    async fn get_signing_certificate(
        &self,
        options: ActionOptions,
    ) -> WebEidResult<SigningCertificateResponse>;

    /// Sign a precomputed `hash` with the key of `certificate`.
    async fn sign(
        &self,
        certificate: &str,
        hash: &str,
        hash_function: &str,
        options: ActionOptions,
    ) -> WebEidResult<SignResponse>;
}
