//! # Integration Test Flows
//!
//! Drives `web-eid` against a scripted extension over the in-memory page bus.
//!
//! ## Flows Tested:
//!
//! 1. **Status**: version merge, native app and extension outdated
//! 2. **Handshake**: no extension within the grace period plus handshake window
//! 3. **Interactive operations**: authenticate, get-signing-certificate and
//!    sign wire shapes and typed results
//! 4. **Concurrency**: one pending operation per kind, kinds independent
//! 5. **Failures**: extension errors decoded with their payload
//! 6. **Warnings**: deduplicated across messages
//!
//! All tests run on a paused clock, so timer boundaries are exact.

#[cfg(test)]
mod tests {
    use crate::integration::{MockExtension, Reply};
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::{timeout, Instant};

    use web_eid::{WebEid, WebEidApi, WebEidConfig, VERSION};
    use webeid_bus::{BusMessage, InMemoryMessageBus, MessagePublisher};
    use webeid_types::{
        Action, ActionOptions, ErrorCode, ErrorKind, RequiresUpdate, Versions, WebEidError,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Bus, library and mock extension wired together.
    fn setup() -> (Arc<InMemoryMessageBus>, Arc<WebEid>, MockExtension) {
        let bus = Arc::new(InMemoryMessageBus::new());
        let extension = MockExtension::install(bus.clone());
        let web_eid = Arc::new(WebEid::with_defaults(bus.clone()));
        (bus, web_eid, extension)
    }

    fn status_body(extension: &str, native_app: &str) -> serde_json::Value {
        json!({ "extension": extension, "nativeApp": native_app })
    }

    fn signing_certificate_body() -> serde_json::Value {
        json!({
            "certificate": "MIIFozCCA4ugAwIBAgIQHFpdK",
            "supportedSignatureAlgorithms": [
                { "cryptoAlgorithm": "ECC", "hashFunction": "SHA-384", "paddingScheme": "NONE" },
                { "cryptoAlgorithm": "RSA", "hashFunction": "SHA-256", "paddingScheme": "PSS" }
            ]
        })
    }

    /// Let the grace period run out so later timings start from zero.
    async fn skip_grace_period(config: &WebEidConfig) {
        tokio::time::sleep(config.max_extension_load_delay).await;
    }

    /// Give spawned tasks a chance to drain the bus.
    async fn settle_bus() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    // =============================================================================
    // STATUS
    // =============================================================================

    /// Status returns all three versions when every major matches.
    #[tokio::test(start_paused = true)]
    async fn test_status_reports_versions() {
        let (_bus, web_eid, extension) = setup();
        extension.answer(Action::Status, status_body(VERSION, VERSION));

        let versions = web_eid.status().await.unwrap();

        assert_eq!(
            versions,
            Versions {
                library: VERSION.into(),
                extension: VERSION.into(),
                native_app: VERSION.into(),
            }
        );

        let requests = extension.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].body(),
            &json!({ "action": "web-eid:status", "libraryVersion": VERSION })
        );
    }

    /// An older native app major fails status with both flags and versions.
    #[tokio::test(start_paused = true)]
    async fn test_status_native_app_requires_update() {
        let (_bus, web_eid, extension) = setup();
        extension.answer(Action::Status, status_body(VERSION, "1.0.0"));

        let err = web_eid.status().await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::VersionMismatch);
        assert_eq!(err.library(), Some(VERSION));
        assert_eq!(
            err.kind(),
            &ErrorKind::VersionMismatch {
                requires_update: RequiresUpdate {
                    extension: false,
                    native_app: true,
                },
                extension: Some(VERSION.into()),
                native_app: Some("1.0.0".into()),
            }
        );
    }

    /// An unparseable extension version is a version error, not a mismatch.
    #[tokio::test(start_paused = true)]
    async fn test_status_invalid_version_string() {
        let (_bus, web_eid, extension) = setup();
        extension.answer(Action::Status, status_body("2.x", VERSION));

        let err = web_eid.status().await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::VersionInvalid);
        assert!(err.message().contains("2.x"));
    }

    /// A status failure from the extension keeps its code and gains the
    /// library version.
    #[tokio::test(start_paused = true)]
    async fn test_status_failure_is_stamped_with_library() {
        let (_bus, web_eid, extension) = setup();
        extension.script(
            Action::Status,
            vec![
                Reply::Ack,
                Reply::fail(&WebEidError::new(ErrorKind::NativeUnavailable)),
            ],
        );

        let err = web_eid.status().await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::NativeUnavailable);
        assert_eq!(err.library(), Some(VERSION));
    }

    // =============================================================================
    // HANDSHAKE
    // =============================================================================

    /// Without an extension, status fails exactly one handshake window after
    /// the grace period ends.
    #[tokio::test(start_paused = true)]
    async fn test_missing_extension_times_out_handshake() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let web_eid = WebEid::with_defaults(bus.clone());
        let config = web_eid.config().clone();
        skip_grace_period(&config).await;

        let mut status = web_eid.status();
        let just_before = config.extension_handshake_timeout - Duration::from_millis(1);
        assert!(timeout(just_before, &mut status).await.is_err());

        let err = status.await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ExtensionUnavailable);
        assert_eq!(err.library(), Some(VERSION));
        assert_eq!(web_eid.extension().pending_count(), 0);
    }

    /// The first call waits out the grace period before posting anything.
    #[tokio::test(start_paused = true)]
    async fn test_first_call_waits_for_extension_load() {
        let (bus, web_eid, extension) = setup();
        extension.answer(Action::Status, status_body(VERSION, VERSION));

        let start = Instant::now();
        let status = tokio::spawn({
            let web_eid = Arc::clone(&web_eid);
            async move { web_eid.status().await }
        });

        settle_bus().await;
        assert_eq!(bus.messages_posted(), 0);

        status.await.unwrap().unwrap();
        assert!(start.elapsed() >= web_eid.config().max_extension_load_delay);
    }

    /// Once acknowledged, only the reply budget applies: both handshakes plus
    /// one user interaction for an authenticate call.
    #[tokio::test(start_paused = true)]
    async fn test_acknowledged_operation_times_out() {
        let (_bus, web_eid, extension) = setup();
        extension.script(Action::Authenticate, vec![Reply::Ack]);
        skip_grace_period(web_eid.config()).await;

        let config = web_eid.config().clone();
        let user = Duration::from_secs(3);
        let budget =
            config.extension_handshake_timeout + config.native_app_handshake_timeout + user;

        let options = ActionOptions::default().with_user_interaction_timeout(user);
        let mut authenticate = web_eid.authenticate("nonce", options);

        let just_before = budget - Duration::from_millis(1);
        assert!(timeout(just_before, &mut authenticate)
            .await
            .is_err());
        let err = authenticate.await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ActionTimeout);
        assert_eq!(web_eid.extension().stats().total_timeouts.load(Ordering::Relaxed), 1);
    }

    /// A success arriving after the timeout is ignored, and the action kind
    /// is free again.
    #[tokio::test(start_paused = true)]
    async fn test_late_reply_after_timeout_is_ignored() {
        let (bus, web_eid, extension) = setup();
        extension.script(Action::Status, vec![Reply::Ack]);

        let err = web_eid.status().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ActionTimeout);

        bus.post_message(BusMessage::new(json!({
            "action": "web-eid:status-success",
            "extension": VERSION,
            "nativeApp": VERSION,
        })));
        settle_bus().await;
        assert_eq!(web_eid.extension().pending_count(), 0);

        extension.answer(Action::Status, status_body(VERSION, VERSION));
        assert!(web_eid.status().await.is_ok());
    }

    // =============================================================================
    // INTERACTIVE OPERATIONS
    // =============================================================================

    /// Authenticate forwards the nonce and options and returns the token.
    #[tokio::test(start_paused = true)]
    async fn test_authenticate_returns_token() {
        let (_bus, web_eid, extension) = setup();
        extension.answer(
            Action::Authenticate,
            json!({
                "unverifiedCertificate": "MIIFozCCA4ugAwIBAgIQHFpdK",
                "algorithm": "ES384",
                "signature": "xsjXsQvVYXWcdV0YPhxLthJxtf0",
                "format": "web-eid:1.0",
                "appVersion": "https://web-eid.eu/web-eid-app/releases/2.0.0",
            }),
        );

        let options = ActionOptions::default()
            .with_user_interaction_timeout(Duration::from_secs(30))
            .with_lang("et");
        let token = web_eid.authenticate("12345678", options).await.unwrap();

        assert_eq!(token.algorithm, "ES384");
        assert_eq!(token.format, "web-eid:1.0");

        let request = &extension.requests()[0];
        assert_eq!(
            request.body(),
            &json!({
                "action": "web-eid:authenticate",
                "libraryVersion": VERSION,
                "challengeNonce": "12345678",
                "options": { "userInteractionTimeout": 30000, "lang": "et" },
            })
        );
    }

    /// The signing certificate comes back with its algorithm list.
    #[tokio::test(start_paused = true)]
    async fn test_get_signing_certificate() {
        let (_bus, web_eid, extension) = setup();
        extension.answer(Action::GetSigningCertificate, signing_certificate_body());

        let response = web_eid
            .get_signing_certificate(ActionOptions::default())
            .await
            .unwrap();

        assert_eq!(response.certificate, "MIIFozCCA4ugAwIBAgIQHFpdK");
        assert_eq!(response.supported_signature_algorithms.len(), 2);
        assert_eq!(response.supported_signature_algorithms[1].padding_scheme, "PSS");
        assert_eq!(
            extension.requests()[0].action(),
            Some("web-eid:get-signing-certificate")
        );
    }

    /// Sign forwards certificate, hash and hash function.
    #[tokio::test(start_paused = true)]
    async fn test_sign_returns_signature() {
        let (_bus, web_eid, extension) = setup();
        extension.answer(
            Action::Sign,
            json!({
                "signature": "c2lnbmF0dXJl",
                "signatureAlgorithm": {
                    "cryptoAlgorithm": "ECC",
                    "hashFunction": "SHA-256",
                    "paddingScheme": "NONE"
                }
            }),
        );

        let response = web_eid
            .sign("Y2VydA==", "aGFzaA==", "SHA-256", ActionOptions::default())
            .await
            .unwrap();

        assert_eq!(response.signature, "c2lnbmF0dXJl");
        assert_eq!(response.signature_algorithm.crypto_algorithm, "ECC");

        let body = extension.requests()[0].body().clone();
        assert_eq!(body["certificate"], "Y2VydA==");
        assert_eq!(body["hash"], "aGFzaA==");
        assert_eq!(body["hashFunction"], "SHA-256");
    }

    /// Missing arguments fail without touching the bus or the grace period.
    #[tokio::test(start_paused = true)]
    async fn test_missing_parameter_posts_nothing() {
        let (bus, web_eid, extension) = setup();

        let err = web_eid
            .sign("Y2VydA==", "", "SHA-256", ActionOptions::default())
            .now_or_never()
            .expect("validation must not wait")
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::MissingParameter);
        assert_eq!(err.message(), "sign function requires a hash");
        settle_bus().await;
        assert_eq!(bus.messages_posted(), 0);
        assert!(extension.requests().is_empty());
    }

    /// A success body missing required fields surfaces as an unknown error.
    #[tokio::test(start_paused = true)]
    async fn test_malformed_success_body() {
        let (_bus, web_eid, extension) = setup();
        extension.answer(Action::Sign, json!({ "signature": "c2lnbmF0dXJl" }));

        let err = web_eid
            .sign("Y2VydA==", "aGFzaA==", "SHA-256", ActionOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::UnknownError);
        assert!(err.message().contains("web-eid:sign-success"));
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    /// A second call of a kind already in flight fails at once; the first
    /// call is unaffected.
    #[tokio::test(start_paused = true)]
    async fn test_duplicate_action_is_rejected() {
        let (_bus, web_eid, extension) = setup();
        extension.script(
            Action::GetSigningCertificate,
            vec![
                Reply::Ack,
                Reply::Delay(Duration::from_secs(5)),
                Reply::Success(signing_certificate_body()),
            ],
        );
        skip_grace_period(web_eid.config()).await;

        let first = tokio::spawn({
            let web_eid = Arc::clone(&web_eid);
            async move { web_eid.get_signing_certificate(ActionOptions::default()).await }
        });
        while !web_eid.extension().is_pending(Action::GetSigningCertificate) {
            tokio::task::yield_now().await;
        }

        let err = web_eid
            .get_signing_certificate(ActionOptions::default())
            .now_or_never()
            .expect("duplicate must fail immediately")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ActionPending);

        assert!(first.await.unwrap().is_ok());
        assert_eq!(extension.request_count(Action::GetSigningCertificate), 1);
    }

    /// Different kinds run side by side and settle independently.
    #[tokio::test(start_paused = true)]
    async fn test_different_actions_are_independent() {
        let (_bus, web_eid, extension) = setup();
        extension.script(
            Action::Status,
            vec![
                Reply::Ack,
                Reply::Delay(Duration::from_secs(3)),
                Reply::Success(status_body(VERSION, VERSION)),
            ],
        );
        extension.script(
            Action::GetSigningCertificate,
            vec![
                Reply::Ack,
                Reply::Delay(Duration::from_secs(1)),
                Reply::fail(&WebEidError::new(ErrorKind::UserCancelled)),
            ],
        );

        let status = tokio::spawn({
            let web_eid = Arc::clone(&web_eid);
            async move { web_eid.status().await }
        });
        let certificate = tokio::spawn({
            let web_eid = Arc::clone(&web_eid);
            async move { web_eid.get_signing_certificate(ActionOptions::default()).await }
        });

        let err = certificate.await.unwrap().unwrap_err();
        assert_eq!(err.code(), ErrorCode::UserCancelled);
        assert!(web_eid.extension().is_pending(Action::Status));

        assert!(status.await.unwrap().is_ok());
        assert_eq!(web_eid.extension().pending_count(), 0);
    }

    // =============================================================================
    // FAILURES
    // =============================================================================

    /// Extension failures come back typed, with their payload intact.
    #[tokio::test(start_paused = true)]
    async fn test_version_mismatch_failure_round_trips() {
        let (_bus, web_eid, extension) = setup();
        let versions = Versions {
            library: VERSION.into(),
            extension: "1.4.0".into(),
            native_app: VERSION.into(),
        };
        let sent = WebEidError::version_mismatch(
            Some(&versions),
            RequiresUpdate {
                extension: true,
                native_app: false,
            },
        );
        extension.script(Action::Sign, vec![Reply::Ack, Reply::fail(&sent)]);

        let err = web_eid
            .sign("Y2VydA==", "aGFzaA==", "SHA-256", ActionOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), sent.kind());
        assert_eq!(err.message(), sent.message());
        assert_eq!(err.library(), Some(VERSION));
    }

    /// An error code this library does not know degrades to unknown.
    #[tokio::test(start_paused = true)]
    async fn test_unknown_failure_code() {
        let (_bus, web_eid, extension) = setup();
        extension.script(
            Action::Authenticate,
            vec![
                Reply::Ack,
                Reply::Failure(json!({
                    "code": "ERR_WEBEID_FROM_THE_FUTURE",
                    "message": "something new",
                })),
            ],
        );

        let err = web_eid
            .authenticate("nonce", ActionOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::UnknownError);
        assert_eq!(err.message(), "something new");
    }

    /// A failure without an `error` field is decoded from the whole body.
    #[tokio::test(start_paused = true)]
    async fn test_failure_without_error_field() {
        let (_bus, web_eid, extension) = setup();
        extension.script(
            Action::Authenticate,
            vec![
                Reply::Ack,
                Reply::Raw(json!({
                    "action": "web-eid:authenticate-failure",
                    "code": "ERR_WEBEID_USER_TIMEOUT",
                    "message": "PIN entry timed out",
                })),
            ],
        );

        let err = web_eid
            .authenticate("nonce", ActionOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::UserTimeout);
        assert_eq!(err.message(), "PIN entry timed out");
    }

    /// An insecure page never reaches the extension.
    #[tokio::test(start_paused = true)]
    async fn test_insecure_context() {
        let bus = Arc::new(InMemoryMessageBus::new().with_secure_context(false));
        let extension = MockExtension::install(bus.clone());
        extension.answer(Action::Status, status_body(VERSION, VERSION));
        let web_eid = WebEid::with_defaults(bus.clone());

        let err = web_eid.status().await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::ContextInsecure);
        assert_eq!(err.library(), Some(VERSION));
        assert!(extension.requests().is_empty());
    }

    // =============================================================================
    // WARNINGS
    // =============================================================================

    /// Each distinct warning is logged once, however often it arrives.
    #[tokio::test(start_paused = true)]
    async fn test_warnings_are_deduplicated() {
        let (bus, web_eid, _extension) = setup();

        for _ in 0..3 {
            bus.post_message(BusMessage::new(json!({
                "action": "web-eid:warning",
                "warnings": ["Card reader\r\nnot found", "Update available"],
            })));
        }
        bus.post_message(BusMessage::new(json!({
            "action": "web-eid:warning",
            "warnings": ["Update available", "Third warning"],
        })));
        settle_bus().await;

        assert_eq!(web_eid.extension().warnings_logged(), 3);
    }
}
