//! Pending Operation Registry - one in-flight operation per action kind.
//!
//! Each entry owns the settlement channel of its caller plus the two timers
//! racing the extension: the handshake timer (cancelled by an ack) and the
//! reply timer (cancelled by success or failure).
//!
//! ```text
//! SENT ──ack──► AWAITING_REPLY ──success|failure──► SETTLED
//!   │                  │
//!   └─handshake timer──┴─reply timer──────────────► SETTLED (error)
//! ```
//!
//! Every path into SETTLED removes the entry, so a late message or timer
//! finds nothing to act on. Timers carry the correlation id of the operation
//! that armed them and never touch a newer entry of the same kind.

use crate::domain::correlation::CorrelationId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};
use webeid_types::{Action, WebEidError, WebEidResult};

/// What a caller eventually receives: the raw success body or a typed error.
pub type Settlement = WebEidResult<Value>;

/// Where an operation is in its handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingState {
    /// Posted, no ack seen yet.
    Sent,
    /// Ack seen; only the reply timer is still running.
    AwaitingReply,
}

struct PendingOperation {
    id: CorrelationId,
    sender: oneshot::Sender<Settlement>,
    ack_timer: Option<JoinHandle<()>>,
    reply_timer: Option<JoinHandle<()>>,
    state: PendingState,
    created_at: Instant,
}

impl PendingOperation {
    fn cancel_timers(&mut self) {
        if let Some(timer) = self.ack_timer.take() {
            timer.abort();
        }
        if let Some(timer) = self.reply_timer.take() {
            timer.abort();
        }
    }
}

/// Counters for the registry.
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Operations registered
    pub total_registered: AtomicU64,
    /// Operations settled with a success body
    pub total_completed: AtomicU64,
    /// Operations settled with a failure from the extension
    pub total_failed: AtomicU64,
    /// Operations settled by either timer
    pub total_timeouts: AtomicU64,
    /// Settlements nobody was waiting for any more
    pub total_cancelled: AtomicU64,
}

/// Registry of pending operations, keyed by action kind.
#[derive(Default)]
pub struct PendingRegistry {
    pending: DashMap<Action, PendingOperation>,
    stats: PendingStats,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new operation for `action`.
    ///
    /// Fails with `ActionPending` if one is already in flight; the existing
    /// operation is left untouched.
    pub fn register(
        &self,
        action: Action,
    ) -> WebEidResult<(CorrelationId, oneshot::Receiver<Settlement>)> {
        let Entry::Vacant(slot) = self.pending.entry(action) else {
            return Err(WebEidError::action_pending());
        };

        let id = CorrelationId::new();
        let (sender, receiver) = oneshot::channel();
        slot.insert(PendingOperation {
            id,
            sender,
            ack_timer: None,
            reply_timer: None,
            state: PendingState::Sent,
            created_at: Instant::now(),
        });
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(action = %action, correlation_id = %id, "Registered pending operation");
        Ok((id, receiver))
    }

    /// Attach the timers armed for operation `id`. If the operation is
    /// already gone the timers are aborted instead.
    pub fn attach_timers(
        &self,
        action: Action,
        id: CorrelationId,
        ack_timer: JoinHandle<()>,
        reply_timer: JoinHandle<()>,
    ) {
        match self.pending.get_mut(&action) {
            Some(mut op) if op.id == id => {
                op.ack_timer = Some(ack_timer);
                op.reply_timer = Some(reply_timer);
            }
            _ => {
                ack_timer.abort();
                reply_timer.abort();
            }
        }
    }

    /// Record an ack: stop the handshake timer, keep the reply timer.
    ///
    /// Returns false when nothing is pending or the ack is a duplicate.
    pub fn acknowledge(&self, action: Action) -> bool {
        let Some(mut op) = self.pending.get_mut(&action) else {
            return false;
        };
        if op.state != PendingState::Sent {
            return false;
        }

        if let Some(timer) = op.ack_timer.take() {
            timer.abort();
        }
        op.state = PendingState::AwaitingReply;

        debug!(
            action = %action,
            correlation_id = %op.id,
            ack_ms = op.created_at.elapsed().as_millis(),
            "Extension acknowledged"
        );
        true
    }

    /// Settle the pending operation for `action` with a reply from the
    /// extension. Returns false if nothing was pending.
    pub fn settle(&self, action: Action, settlement: Settlement) -> bool {
        let Some((_, mut op)) = self.pending.remove(&action) else {
            return false;
        };
        op.cancel_timers();

        let counter = match settlement {
            Ok(_) => &self.stats.total_completed,
            Err(_) => &self.stats.total_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        debug!(
            action = %action,
            correlation_id = %op.id,
            success = settlement.is_ok(),
            response_time_ms = op.created_at.elapsed().as_millis(),
            "Settled pending operation"
        );
        self.deliver(action, op, settlement);
        true
    }

    /// Handshake timer fired. Settles with `ExtensionUnavailable` only if
    /// operation `id` is still waiting for its ack.
    pub fn expire_handshake(&self, action: Action, id: CorrelationId) -> bool {
        let removed = self
            .pending
            .remove_if(&action, |_, op| op.id == id && op.state == PendingState::Sent);
        let Some((_, mut op)) = removed else {
            return false;
        };
        op.cancel_timers();
        self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);

        warn!(action = %action, correlation_id = %id, "No ack from extension, giving up");
        self.deliver(action, op, Err(WebEidError::extension_unavailable()));
        true
    }

    /// Reply timer fired. Settles with `ActionTimeout` if operation `id`
    /// is still pending.
    pub fn expire_reply(&self, action: Action, id: CorrelationId) -> bool {
        let Some((_, mut op)) = self.pending.remove_if(&action, |_, op| op.id == id) else {
            return false;
        };
        op.cancel_timers();
        self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);

        warn!(
            action = %action,
            correlation_id = %id,
            elapsed_ms = op.created_at.elapsed().as_millis(),
            "Extension reply timed out"
        );
        self.deliver(action, op, Err(WebEidError::action_timeout()));
        true
    }

    fn deliver(&self, action: Action, op: PendingOperation, settlement: Settlement) {
        if op.sender.send(settlement).is_err() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            debug!(action = %action, correlation_id = %op.id, "Caller stopped waiting");
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, action: Action) -> bool {
        self.pending.contains_key(&action)
    }

    pub fn state(&self, action: Action) -> Option<PendingState> {
        self.pending.get(&action).map(|op| op.state)
    }

    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}
