//! Web extension service - the page side of the extension protocol.
//!
//! Posts requests onto the page bus, listens for the extension's replies and
//! routes each one to the pending operation of the same kind.

use crate::domain::config::WebEidConfig;
use crate::domain::error_codec::deserialize_error;
use crate::ipc::pending::{PendingRegistry, PendingState, PendingStats};
use crate::ipc::warnings::WarningLog;
use futures::future::{self, BoxFuture, FutureExt};
use futures::StreamExt;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use webeid_bus::{BusMessage, MessageFilter, MessageStream, PageBus};
use webeid_types::{Action, BusAction, ExtensionRequest, Phase, WebEidError, WebEidResult};

/// Client for the Web eID extension over a shared page bus.
///
/// One instance per page. It subscribes once, at spawn, and stops listening
/// when dropped.
pub struct WebExtensionService {
    bus: Arc<dyn PageBus>,
    registry: Arc<PendingRegistry>,
    warnings: WarningLog,
    extension_handshake_timeout: Duration,
    receive_loop: Mutex<Option<JoinHandle<()>>>,
}

impl WebExtensionService {
    /// Subscribe to `bus` and start routing replies.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(bus: Arc<dyn PageBus>, config: &WebEidConfig) -> Arc<Self> {
        let mut messages = MessageStream::new(bus.subscribe(MessageFilter::web_eid()));

        let service = Arc::new(Self {
            bus,
            registry: Arc::new(PendingRegistry::new()),
            warnings: WarningLog::new(),
            extension_handshake_timeout: config.extension_handshake_timeout,
            receive_loop: Mutex::new(None),
        });

        let weak: Weak<Self> = Arc::downgrade(&service);
        let handle = tokio::spawn(async move {
            while let Some(message) = messages.next().await {
                let Some(service) = weak.upgrade() else {
                    break;
                };
                service.handle_message(&message);
            }
            debug!("Web eID receive loop stopped");
        });
        *service.receive_loop.lock() = Some(handle);

        service
    }

    /// Send `request` and wait up to `timeout` for the final reply.
    ///
    /// Checks, registration, timers and the bus post all happen before this
    /// returns; the future only waits for settlement. A second request of a
    /// kind already in flight fails with `ActionPending`, an insecure page
    /// with `ContextInsecure`.
    pub fn send<T>(
        &self,
        request: ExtensionRequest,
        timeout: Duration,
    ) -> BoxFuture<'static, WebEidResult<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let action = request.action();

        if self.registry.is_pending(action) {
            return future::ready(Err(WebEidError::action_pending())).boxed();
        }
        if !self.bus.is_secure_context() {
            return future::ready(Err(WebEidError::context_insecure())).boxed();
        }

        let message = match BusMessage::from_payload(&request) {
            Ok(message) => message,
            Err(e) => {
                let error = WebEidError::unknown(format!("failed to encode {action}: {e}"));
                return future::ready(Err(error)).boxed();
            }
        };

        let (id, receiver) = match self.registry.register(action) {
            Ok(registered) => registered,
            Err(e) => return future::ready(Err(e)).boxed(),
        };

        let ack_timer = {
            let registry = Arc::clone(&self.registry);
            let wait = self.extension_handshake_timeout;
            tokio::spawn(async move {
                tokio::time::sleep(wait).await;
                registry.expire_handshake(action, id);
            })
        };
        let reply_timer = {
            let registry = Arc::clone(&self.registry);
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                registry.expire_reply(action, id);
            })
        };
        self.registry.attach_timers(action, id, ack_timer, reply_timer);

        let receivers = self.bus.post_message(message);
        debug!(
            action = %action,
            correlation_id = %id,
            timeout_ms = timeout.as_millis(),
            receivers,
            "Posted request to extension"
        );

        async move {
            let body = receiver
                .await
                .map_err(|_| WebEidError::unknown(format!("{action} was dropped unsettled")))??;

            serde_json::from_value::<T>(body).map_err(|e| {
                let reply = action.with_phase(Phase::Success);
                WebEidError::unknown(format!("malformed {reply} body: {e}"))
            })
        }
        .boxed()
    }

    /// Route one inbound bus message.
    ///
    /// Our own request echoes, foreign actions and replies nobody is
    /// waiting for are dropped silently.
    pub fn handle_message(&self, message: &BusMessage) {
        let Some(bus_action) = message.bus_action() else {
            trace!(action = ?message.action(), "Ignoring unrecognized bus message");
            return;
        };

        match bus_action {
            BusAction::Warning => {
                // Non-string entries are skipped one by one.
                let warnings = message
                    .body()
                    .get("warnings")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(Value::as_str);
                self.warnings.emit_all(warnings);
            }
            BusAction::Operation { action, phase } => match phase {
                Phase::Request => {}
                Phase::Ack => {
                    self.registry.acknowledge(action);
                }
                Phase::Success => {
                    self.registry.settle(action, Ok(message.body().clone()));
                }
                Phase::Failure => {
                    let body = message.body();
                    let error = deserialize_error(body.get("error").unwrap_or(body));
                    self.registry.settle(action, Err(error));
                }
            },
        }
    }

    pub fn pending_count(&self) -> usize {
        self.registry.pending_count()
    }

    pub fn is_pending(&self, action: Action) -> bool {
        self.registry.is_pending(action)
    }

    pub fn pending_state(&self, action: Action) -> Option<PendingState> {
        self.registry.state(action)
    }

    pub fn stats(&self) -> &PendingStats {
        self.registry.stats()
    }

    /// Distinct extension warnings logged so far.
    pub fn warnings_logged(&self) -> usize {
        self.warnings.len()
    }
}

impl Drop for WebExtensionService {
    fn drop(&mut self) {
        if let Some(handle) = self.receive_loop.lock().take() {
            handle.abort();
        }
    }
}
