//! Room events
//!
//! Inputs to the [`crate::Room`], from the transport and from the user.

use roster_core::SendRef;
use serde_json::Value;

/// Events processed by the room, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// Socket connected and the topic was joined.
    Connected,

    /// Socket disconnected. Membership is dropped until the next full state.
    Disconnected,

    /// Full presence state.
    PresenceState(Value),

    /// Incremental presence diff.
    PresenceDiff(Value),

    /// Named custom event.
    Message {
        /// Event name.
        event: String,
        /// Event payload.
        payload: Value,
    },

    /// Transport callback for a pushed message.
    SendAcked {
        /// The send being resolved.
        send_ref: SendRef,
        /// `Err` carries the transport's failure reason.
        outcome: Result<(), String>,
    },

    /// The user edited the composed text.
    TextChanged(String),

    /// The user pressed send.
    SendRequested,
}
