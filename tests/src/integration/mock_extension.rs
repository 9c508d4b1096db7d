//! # Mock Extension
//!
//! Stands in for the extension's content script. It listens for page
//! requests on the bus and answers each with a scripted sequence of replies.
//! Actions without a script get no answer at all, which looks to the page
//! like a missing extension.

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use web_eid::serialize_error;
use webeid_bus::{
    BusMessage, InMemoryMessageBus, MessageFilter, MessagePublisher, MessageSubscriber,
};
use webeid_types::{Action, BusAction, Phase, WebEidError};

/// One step of a scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Post `<action>-ack`.
    Ack,
    /// Post `<action>-success` with the fields of this object.
    Success(Value),
    /// Post `<action>-failure` with this value under `error`.
    Failure(Value),
    /// Post this value as-is.
    Raw(Value),
    /// Pause before the next step.
    Delay(Duration),
}

impl Reply {
    /// Failure reply carrying a serialized Web eID error.
    pub fn fail(error: &WebEidError) -> Self {
        let serialized = serialize_error(error);
        Reply::Failure(serde_json::to_value(serialized).unwrap_or(Value::Null))
    }
}

/// Scripted extension attached to an in-memory page bus.
pub struct MockExtension {
    scripts: Arc<Mutex<HashMap<Action, Vec<Reply>>>>,
    requests: Arc<Mutex<Vec<BusMessage>>>,
    listener: JoinHandle<()>,
}

impl MockExtension {
    /// Subscribe to `bus` and start answering requests.
    pub fn install(bus: Arc<InMemoryMessageBus>) -> Self {
        let scripts: Arc<Mutex<HashMap<Action, Vec<Reply>>>> = Arc::default();
        let requests: Arc<Mutex<Vec<BusMessage>>> = Arc::default();
        let mut subscription = bus.subscribe(MessageFilter::web_eid());

        let listener = {
            let scripts = Arc::clone(&scripts);
            let requests = Arc::clone(&requests);
            tokio::spawn(async move {
                while let Some(message) = subscription.recv().await {
                    let Some(BusAction::Operation {
                        action,
                        phase: Phase::Request,
                    }) = message.bus_action()
                    else {
                        continue;
                    };

                    requests.lock().push(message);
                    let script = scripts.lock().get(&action).cloned().unwrap_or_default();
                    tokio::spawn(play(Arc::clone(&bus), action, script));
                }
            })
        };

        Self {
            scripts,
            requests,
            listener,
        }
    }

    /// Answer every future `action` request with `replies`.
    pub fn script(&self, action: Action, replies: Vec<Reply>) {
        self.scripts.lock().insert(action, replies);
    }

    /// Acknowledge `action` requests and answer with `body` straight away.
    pub fn answer(&self, action: Action, body: Value) {
        self.script(action, vec![Reply::Ack, Reply::Success(body)]);
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<BusMessage> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self, action: Action) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|m| m.action() == Some(action.as_str()))
            .count()
    }
}

impl Drop for MockExtension {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn play(bus: Arc<InMemoryMessageBus>, action: Action, script: Vec<Reply>) {
    for reply in script {
        let body = match reply {
            Reply::Delay(wait) => {
                tokio::time::sleep(wait).await;
                continue;
            }
            Reply::Ack => json!({ "action": action.with_phase(Phase::Ack) }),
            Reply::Success(fields) => {
                let mut body = match fields {
                    Value::Object(map) => map,
                    _ => serde_json::Map::new(),
                };
                body.insert("action".into(), action.with_phase(Phase::Success).into());
                Value::Object(body)
            }
            Reply::Failure(error) => json!({
                "action": action.with_phase(Phase::Failure),
                "error": error,
            }),
            Reply::Raw(value) => value,
        };
        bus.post_message(BusMessage::new(body));
    }
}
