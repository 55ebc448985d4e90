//! Notifications delivered to observers.

use roster_core::{ChatMessage, MembershipTable, SendRef};

/// Outputs of the room, delivered synchronously after each change.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomNotification {
    /// Membership changed.
    MembershipChanged {
        /// Identities with at least one present device.
        count: usize,
        /// New membership snapshot.
        table: MembershipTable,
    },

    /// A chat message was appended to the log.
    RecordAppended(ChatMessage),

    /// Whether the send control should be enabled changed.
    SendStateChanged {
        /// New send-ability.
        can_send: bool,
    },

    /// A send was acknowledged and the composed text cleared.
    SendDelivered {
        /// The delivered send.
        send_ref: SendRef,
    },

    /// A send failed. The composed text is kept for retry.
    SendFailed {
        /// The failed send.
        send_ref: SendRef,
        /// Failure reported by the transport.
        reason: String,
    },
}
