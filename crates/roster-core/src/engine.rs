//! Presence reconciliation engine.
//!
//! Wraps the membership table in a state machine over the connection
//! lifecycle and records chat messages delivered as custom events.
//!
//! # Architecture: Action-Based State Machine
//!
//! - Methods accept already-received events; nothing here performs I/O
//! - Methods return `Vec<PresenceAction>` describing what changed
//! - The caller delivers those actions to whoever renders them
//!
//! # State Machine
//!
//! ```text
//! ┌───────────────┐  full state   ┌────────┐
//! │ Uninitialized │──────────────>│ Synced │──┐ diff / full state
//! └───────────────┘               └────────┘<─┘
//!         ↑                           │
//!         └───────────────────────────┘
//!               connection lost
//! ```
//!
//! A diff received while `Uninitialized` has no baseline to apply to and is
//! rejected with [`PresenceError::OutOfOrderDiff`].

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    decode::{RawDiff, RawPresences, decode_chat_message, decode_diff, decode_presences},
    diff::{apply_diff, apply_snapshot},
    error::PresenceError,
    message::{ChatMessage, MessageLog},
    table::MembershipTable,
};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Custom event name carrying chat messages.
    pub message_event: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { message_event: "new:msg".to_string() }
    }
}

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No full state since construction or the last connection loss
    Uninitialized,
    /// Membership reflects a full state plus every diff since
    Synced,
}

/// Raw events delivered by the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceEvent {
    /// Authoritative full membership listing.
    FullState(Value),
    /// Incremental joins and leaves.
    Diff(Value),
    /// Any other named channel event.
    Custom {
        /// Event name.
        event: String,
        /// Event payload.
        payload: Value,
    },
    /// The underlying connection went away.
    ConnectionLost,
}

/// Actions returned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceAction {
    /// Membership changed.
    MembershipChanged {
        /// Identities with at least one device.
        count: usize,
        /// New membership snapshot.
        table: MembershipTable,
    },
    /// A message was appended to the log.
    RecordAppended(ChatMessage),
}

/// Presence reconciliation engine.
#[derive(Debug, Clone)]
pub struct PresenceEngine {
    config: EngineConfig,
    state: EngineState,
    table: MembershipTable,
    messages: MessageLog,
}

impl PresenceEngine {
    /// Create an engine with an empty table.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: EngineState::Uninitialized,
            table: MembershipTable::new(),
            messages: MessageLog::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Snapshot of current membership.
    ///
    /// The returned table is immutable; later updates do not affect it.
    pub fn current_membership(&self) -> MembershipTable {
        self.table.clone()
    }

    /// Identities with at least one present device.
    pub fn present_identity_count(&self) -> usize {
        self.table.present_identity_count()
    }

    /// Received chat messages.
    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// Process a raw channel event.
    ///
    /// # Errors
    ///
    /// - `MalformedBatch` if a full state or diff payload is structurally
    ///   invalid
    /// - `OutOfOrderDiff` if a diff arrives before any full state
    ///
    /// State is unchanged on error.
    pub fn handle(&mut self, event: PresenceEvent) -> Result<Vec<PresenceAction>, PresenceError> {
        match event {
            PresenceEvent::FullState(payload) => {
                let snapshot = decode_presences(&payload).inspect_err(|e| {
                    warn!(error = %e, "discarding presence state");
                })?;
                Ok(self.on_full_state(&snapshot))
            },
            PresenceEvent::Diff(payload) => {
                self.ensure_synced()?;
                let diff = decode_diff(&payload).inspect_err(|e| {
                    warn!(error = %e, "discarding presence diff");
                })?;
                self.on_diff(&diff)
            },
            PresenceEvent::Custom { event, payload } => Ok(self.on_custom_event(&event, &payload)),
            PresenceEvent::ConnectionLost => Ok(self.on_connection_lost()),
        }
    }

    /// Replace membership with a full snapshot.
    pub fn on_full_state(&mut self, snapshot: &RawPresences) -> Vec<PresenceAction> {
        self.table = apply_snapshot(snapshot);
        self.state = EngineState::Synced;

        info!(count = self.table.present_identity_count(), "presence state applied");

        vec![self.membership_changed()]
    }

    /// Apply joins, then leaves.
    ///
    /// # Errors
    ///
    /// `OutOfOrderDiff` if no full state was applied yet. Nothing changes.
    pub fn on_diff(&mut self, diff: &RawDiff) -> Result<Vec<PresenceAction>, PresenceError> {
        self.ensure_synced()?;

        self.table = apply_diff(&self.table, diff);

        debug!(
            joins = diff.joins.len(),
            leaves = diff.leaves.len(),
            count = self.table.present_identity_count(),
            "presence diff applied"
        );

        Ok(vec![self.membership_changed()])
    }

    /// Handle a named custom event.
    ///
    /// Chat messages are decoded and appended to the log. A payload that
    /// fails to decode is logged and dropped; it never reaches the caller.
    pub fn on_custom_event(&mut self, event: &str, payload: &Value) -> Vec<PresenceAction> {
        if event != self.config.message_event {
            debug!(event, "ignoring custom event");
            return Vec::new();
        }

        match decode_chat_message(payload) {
            Ok(message) => {
                self.messages.push(message.clone());
                vec![PresenceAction::RecordAppended(message)]
            },
            Err(e) => {
                warn!(event, error = %e, "dropping malformed message");
                Vec::new()
            },
        }
    }

    /// Drop membership and wait for the next full state.
    ///
    /// The message log is kept.
    pub fn on_connection_lost(&mut self) -> Vec<PresenceAction> {
        let was_synced = self.state == EngineState::Synced;
        let had_members = !self.table.is_empty();

        self.state = EngineState::Uninitialized;
        self.table = MembershipTable::new();

        if was_synced || had_members {
            info!("connection lost, membership cleared");
            vec![self.membership_changed()]
        } else {
            Vec::new()
        }
    }

    fn ensure_synced(&self) -> Result<(), PresenceError> {
        match self.state {
            EngineState::Synced => Ok(()),
            EngineState::Uninitialized => {
                warn!("discarding presence diff received before presence state");
                Err(PresenceError::OutOfOrderDiff)
            },
        }
    }

    fn membership_changed(&self) -> PresenceAction {
        PresenceAction::MembershipChanged {
            count: self.table.present_identity_count(),
            table: self.table.clone(),
        }
    }
}

impl Default for PresenceEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
