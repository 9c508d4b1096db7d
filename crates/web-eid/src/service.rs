//! Web eID service - the public entry point of the library.
//!
//! Each operation validates its arguments, waits out the extension load
//! grace period, computes its timeout budget and hands a typed request to
//! the [`WebExtensionService`].

use crate::domain::config::{ConfigError, WebEidConfig};
use crate::domain::timeouts::timeout_budget;
use crate::domain::version::check_compatibility;
use crate::ipc::WebExtensionService;
use crate::ports::WebEidApi;
use crate::VERSION;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info};
use webeid_bus::{InMemoryMessageBus, PageBus};
use webeid_types::{
    Action, ActionOptions, AuthenticateResponse, ExtensionRequest, SignResponse,
    SigningCertificateResponse, StatusResponse, Versions, WebEidError, WebEidResult,
};

/// Web eID library instance, one per page.
pub struct WebEid {
    config: WebEidConfig,
    service: Arc<WebExtensionService>,
    initialized_at: Instant,
}

impl WebEid {
    /// Create the library on top of `bus`.
    ///
    /// Must be called from within a Tokio runtime; the extension load grace
    /// period starts now.
    pub fn new(bus: Arc<dyn PageBus>, config: WebEidConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::start(bus, config))
    }

    /// Create the library with default configuration.
    pub fn with_defaults(bus: Arc<dyn PageBus>) -> Self {
        Self::start(bus, WebEidConfig::default())
    }

    /// Create the library on a fresh in-memory bus sized by
    /// `config.bus_capacity`. The bus is returned so the extension side can
    /// be attached to it.
    pub fn with_in_memory_bus(
        config: WebEidConfig,
    ) -> Result<(Self, Arc<InMemoryMessageBus>), ConfigError> {
        config.validate()?;
        let bus = Arc::new(InMemoryMessageBus::with_capacity(config.bus_capacity));
        Ok((Self::start(bus.clone(), config), bus))
    }

    fn start(bus: Arc<dyn PageBus>, config: WebEidConfig) -> Self {
        let service = WebExtensionService::spawn(bus, &config);
        info!(version = VERSION, "Web eID library initialized");

        Self {
            config,
            service,
            initialized_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &WebEidConfig {
        &self.config
    }

    /// The underlying bus client, for introspection.
    pub fn extension(&self) -> &Arc<WebExtensionService> {
        &self.service
    }

    /// Sleep until the extension content script has had its chance to load.
    /// Free once the grace period is over. A delay too large to represent as
    /// an instant means no wait.
    async fn extension_loaded(&self) {
        let Some(ready_at) = self
            .initialized_at
            .checked_add(self.config.max_extension_load_delay)
        else {
            return;
        };
        if Instant::now() < ready_at {
            debug!("Waiting for extension content script to load");
            tokio::time::sleep_until(ready_at).await;
        }
    }
}

#[async_trait]
impl WebEidApi for WebEid {
    async fn status(&self) -> WebEidResult<Versions> {
        self.extension_loaded().await;

        let timeout = timeout_budget(&self.config, Action::Status, &ActionOptions::default());
        let request = ExtensionRequest::Status {
            library_version: VERSION.to_owned(),
        };

        let response: StatusResponse = self
            .service
            .send(request, timeout)
            .await
            .map_err(|e| e.with_library(VERSION))?;

        let versions = Versions {
            library: VERSION.to_owned(),
            extension: response.extension,
            native_app: response.native_app,
        };

        let requires_update =
            check_compatibility(&versions).map_err(|e| e.with_library(VERSION))?;
        if requires_update.any() {
            return Err(WebEidError::version_mismatch(Some(&versions), requires_update));
        }

        Ok(versions)
    }

    async fn authenticate(
        &self,
        challenge_nonce: &str,
        options: ActionOptions,
    ) -> WebEidResult<AuthenticateResponse> {
        require("authenticate", "challengeNonce", challenge_nonce)?;
        self.extension_loaded().await;

        let timeout = timeout_budget(&self.config, Action::Authenticate, &options);
        let request = ExtensionRequest::Authenticate {
            library_version: VERSION.to_owned(),
            challenge_nonce: challenge_nonce.to_owned(),
            options,
        };

        self.service.send(request, timeout).await
    }

    async fn get_signing_certificate(
        &self,
        options: ActionOptions,
    ) -> WebEidResult<SigningCertificateResponse> {
        self.extension_loaded().await;

        let timeout = timeout_budget(&self.config, Action::GetSigningCertificate, &options);
        let request = ExtensionRequest::GetSigningCertificate {
            library_version: VERSION.to_owned(),
            options,
        };

        self.service.send(request, timeout).await
    }

    async fn sign(
        &self,
        certificate: &str,
        hash: &str,
        hash_function: &str,
        options: ActionOptions,
    ) -> WebEidResult<SignResponse> {
        require("sign", "certificate", certificate)?;
        require("sign", "hash", hash)?;
        require("sign", "hashFunction", hash_function)?;
        self.extension_loaded().await;

        let timeout = timeout_budget(&self.config, Action::Sign, &options);
        let request = ExtensionRequest::Sign {
            library_version: VERSION.to_owned(),
            certificate: certificate.to_owned(),
            hash: hash.to_owned(),
            hash_function: hash_function.to_owned(),
            options,
        };

        self.service.send(request, timeout).await
    }
}

/// Empty counts as missing.
fn require(operation: &str, field: &str, value: &str) -> WebEidResult<()> {
    if value.is_empty() {
        return Err(WebEidError::missing_parameter(format!(
            "{operation} function requires a {field}"
        )));
    }
    Ok(())
}
