//! # Bus Messages
//!
//! The wire unit of the page bus. A message is any JSON value; Web eID
//! messages are objects with an `action` string in the `web-eid:` namespace.

use serde::Serialize;
use serde_json::Value;
use webeid_types::{BusAction, ACTION_PREFIX};

/// One message on the page bus.
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage(Value);

impl BusMessage {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Serialize a typed payload into a bus message.
    pub fn from_payload<T: Serialize>(payload: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(payload).map(Self)
    }

    /// The `action` field, if the message is an object carrying a string one.
    pub fn action(&self) -> Option<&str> {
        self.0.get("action").and_then(Value::as_str)
    }

    /// The parsed action, if it belongs to the Web eID vocabulary.
    pub fn bus_action(&self) -> Option<BusAction> {
        self.action().and_then(BusAction::parse)
    }

    pub fn body(&self) -> &Value {
        &self.0
    }

    pub fn into_body(self) -> Value {
        self.0
    }
}

impl From<Value> for BusMessage {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Filter applied by a subscription before handing messages out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    /// Required prefix of the `action` field. `None` accepts everything,
    /// including messages without an action.
    pub action_prefix: Option<String>,
}

impl MessageFilter {
    /// Accept every message.
    pub fn all() -> Self {
        Self::default()
    }

    /// Accept only messages whose action starts with `prefix`.
    pub fn action_prefix(prefix: impl Into<String>) -> Self {
        Self {
            action_prefix: Some(prefix.into()),
        }
    }

    /// Accept only the Web eID namespace.
    pub fn web_eid() -> Self {
        Self::action_prefix(ACTION_PREFIX)
    }

    pub fn matches(&self, message: &BusMessage) -> bool {
        match &self.action_prefix {
            None => true,
            Some(prefix) => message
                .action()
                .is_some_and(|action| action.starts_with(prefix.as_str())),
        }
    }
}
