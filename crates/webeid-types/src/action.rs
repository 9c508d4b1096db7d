//! # Action Kinds
//!
//! Every bus message is tagged by an `action` string in the `web-eid:`
//! namespace. An operation kind (`Action`) combined with a phase (`Phase`)
//! yields the wire name, e.g. `web-eid:sign` + `Ack` = `web-eid:sign-ack`.

use std::fmt;

/// Namespace prefix shared by every Web eID bus message.
pub const ACTION_PREFIX: &str = "web-eid:";

/// Wire name of the extension's warning broadcast.
const WARNING: &str = "web-eid:warning";

/// The four operations a page can request from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Status,
    Authenticate,
    GetSigningCertificate,
    Sign,
}

impl Action {
    /// All operation kinds, in declaration order.
    pub const ALL: [Action; 4] = [
        Action::Status,
        Action::Authenticate,
        Action::GetSigningCertificate,
        Action::Sign,
    ];

    /// Wire name of the request message.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Status => "web-eid:status",
            Action::Authenticate => "web-eid:authenticate",
            Action::GetSigningCertificate => "web-eid:get-signing-certificate",
            Action::Sign => "web-eid:sign",
        }
    }

    /// Wire name of this action in the given phase.
    pub fn with_phase(&self, phase: Phase) -> String {
        format!("{}{}", self.as_str(), phase.suffix())
    }

    fn from_initial(name: &str) -> Option<Action> {
        Action::ALL.into_iter().find(|a| a.as_str() == name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of an operation as seen on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Outbound request from the page.
    Request,
    /// Extension received the request.
    Ack,
    /// Final successful result.
    Success,
    /// Final failure carrying a serialized error.
    Failure,
}

impl Phase {
    pub fn suffix(&self) -> &'static str {
        match self {
            Phase::Request => "",
            Phase::Ack => "-ack",
            Phase::Success => "-success",
            Phase::Failure => "-failure",
        }
    }
}

/// A parsed `action` field of an inbound or outbound bus message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusAction {
    /// `web-eid:warning`, independent of any operation.
    Warning,
    /// One phase of one operation.
    Operation { action: Action, phase: Phase },
}

impl BusAction {
    /// Parse a wire action name.
    ///
    /// Returns `None` for names outside the `web-eid:` namespace and for
    /// unknown kinds.
    pub fn parse(name: &str) -> Option<BusAction> {
        if !name.starts_with(ACTION_PREFIX) {
            return None;
        }
        if name == WARNING {
            return Some(BusAction::Warning);
        }

        let initial = initial_action(name);
        let action = Action::from_initial(initial)?;
        let phase = match &name[initial.len()..] {
            "" => Phase::Request,
            "-ack" => Phase::Ack,
            "-success" => Phase::Success,
            "-failure" => Phase::Failure,
            _ => return None,
        };

        Some(BusAction::Operation { action, phase })
    }
}

impl fmt::Display for BusAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusAction::Warning => f.write_str(WARNING),
            BusAction::Operation { action, phase } => {
                write!(f, "{}{}", action.as_str(), phase.suffix())
            }
        }
    }
}

/// Strip one trailing `-ack`, `-success` or `-failure` suffix.
pub fn initial_action(name: &str) -> &str {
    ["-success", "-failure", "-ack"]
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name)
}
