//! Channel trait for abstracting the transport.
//!
//! The [`Channel`] trait decouples the room from the socket library that
//! multiplexes topics and handles reconnects. The handle is injected into
//! [`crate::Room::new`]; the room never reaches for a global connection.

use roster_core::OutboundMessage;
use thiserror::Error;

/// Transport handle for one room topic.
pub trait Channel {
    /// Hand a message to the transport without waiting for delivery.
    ///
    /// Accepting a message obliges the transport to report its fate exactly
    /// once, later, as [`crate::RoomEvent::SendAcked`] carrying the message's
    /// `send_ref`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be handed over at all. No
    /// acknowledgment follows in that case.
    fn push(&mut self, message: &OutboundMessage) -> Result<(), ChannelError>;
}

/// Transport failures reported synchronously by [`Channel::push`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The topic has not been joined yet.
    #[error("channel {topic} is not joined")]
    NotJoined {
        /// Topic the message was addressed to.
        topic: String,
    },

    /// The underlying connection is gone.
    #[error("channel closed: {reason}")]
    Closed {
        /// Why the channel closed.
        reason: String,
    },
}
