//! Per-operation timeout budgets.
//!
//! The reply window of an operation is the sum of everything that has to
//! happen before the extension can answer: its own handshake, reaching the
//! native app, then each server round trip and user interaction the
//! operation implies.

use crate::domain::config::WebEidConfig;
use std::time::Duration;
use webeid_types::{Action, ActionOptions};

/// Slow steps implied by one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationProfile {
    pub server_round_trips: u32,
    pub user_interactions: u32,
}

impl OperationProfile {
    pub fn for_action(action: Action) -> Self {
        match action {
            Action::Status => Self {
                server_round_trips: 0,
                user_interactions: 0,
            },
            // PIN entry or certificate selection, once.
            Action::Authenticate | Action::GetSigningCertificate | Action::Sign => Self {
                server_round_trips: 0,
                user_interactions: 1,
            },
        }
    }
}

/// Total reply budget for `action`, honoring per-call overrides.
pub fn timeout_budget(config: &WebEidConfig, action: Action, options: &ActionOptions) -> Duration {
    let profile = OperationProfile::for_action(action);

    // A zero override means "not set".
    let server = options
        .server_request_timeout
        .filter(|d| !d.is_zero())
        .unwrap_or(config.default_server_request_timeout);
    let user = options
        .user_interaction_timeout
        .filter(|d| !d.is_zero())
        .unwrap_or(config.default_user_interaction_timeout);

    config
        .extension_handshake_timeout
        .saturating_add(config.native_app_handshake_timeout)
        .saturating_add(server.saturating_mul(profile.server_round_trips))
        .saturating_add(user.saturating_mul(profile.user_interactions))
}
