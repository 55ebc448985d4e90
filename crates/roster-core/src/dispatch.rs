//! Outbound message dispatch.
//!
//! Serializes user messages one at a time. At most one send is in flight;
//! a send attempted while another is outstanding is rejected, never queued.
//!
//! # Lifecycle
//!
//! ```text
//! ┌──────┐  send()   ┌──────────┐  resolve(Ok)   ┌──────┐ (text cleared)
//! │ Idle │──────────>│ InFlight │───────────────>│ Idle │
//! └──────┘           └──────────┘                └──────┘
//!                         │ resolve(Err)
//!                         ↓
//!                     ┌──────┐ (text kept for retry)
//!                     │ Idle │
//!                     └──────┘
//! ```
//!
//! Every send carries a [`SendRef`]. Resolution must name the in-flight
//! reference, so a duplicated or late callback from the transport is
//! rejected instead of resolving the send twice.

use std::fmt;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::DispatchError;

/// Dispatch configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Channel topic messages are pushed to.
    pub topic: String,
    /// Event name of outbound chat messages.
    pub message_event: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { topic: "chat:lobby".to_string(), message_event: "new:msg".to_string() }
    }
}

/// Identifies one send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SendRef(u64);

impl SendRef {
    /// Wrap a raw reference.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw reference value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SendRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Message handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Reference the acknowledgment must carry.
    pub send_ref: SendRef,
    /// Channel topic.
    pub topic: String,
    /// Event name.
    pub event: String,
    /// Event payload.
    pub payload: Value,
}

/// How an in-flight send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendResolution {
    /// Acknowledged. The composed text was cleared.
    Delivered {
        /// The resolved send.
        send_ref: SendRef,
    },
    /// Failed. The composed text was kept.
    Failed {
        /// The resolved send.
        send_ref: SendRef,
        /// Failure reported by the transport.
        reason: String,
    },
}

impl SendResolution {
    /// The resolved send.
    pub fn send_ref(&self) -> SendRef {
        match self {
            Self::Delivered { send_ref } | Self::Failed { send_ref, .. } => *send_ref,
        }
    }

    /// Convert a failure into [`DispatchError::SendFailed`].
    pub fn into_result(self) -> Result<SendRef, DispatchError> {
        match self {
            Self::Delivered { send_ref } => Ok(send_ref),
            Self::Failed { send_ref, reason } => Err(DispatchError::SendFailed { send_ref, reason }),
        }
    }
}

/// Whether `text` may be sent given the in-flight state.
pub fn can_send(text: &str, in_flight: bool) -> bool {
    !text.is_empty() && !in_flight
}

/// Single-flight message dispatcher.
#[derive(Debug, Clone)]
pub struct MessageDispatch {
    config: DispatchConfig,
    text: String,
    in_flight: Option<SendRef>,
    next_ref: u64,
}

impl MessageDispatch {
    /// Idle dispatcher with an empty buffer.
    pub fn new(config: DispatchConfig) -> Self {
        Self { config, text: String::new(), in_flight: None, next_ref: 1 }
    }

    /// Composed text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the composed text. Allowed while a send is in flight.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Outstanding send, if any.
    pub fn in_flight(&self) -> Option<SendRef> {
        self.in_flight
    }

    /// True while a send awaits its callback.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the composed text may be sent now.
    pub fn can_send(&self) -> bool {
        can_send(&self.text, self.is_in_flight())
    }

    /// Send the composed text.
    ///
    /// # Errors
    ///
    /// - `SendInFlight` if another send is outstanding
    /// - `EmptyMessage` if the buffer is empty
    pub fn send(&mut self) -> Result<OutboundMessage, DispatchError> {
        if let Some(in_flight) = self.in_flight {
            return Err(DispatchError::SendInFlight { in_flight });
        }
        if self.text.is_empty() {
            return Err(DispatchError::EmptyMessage);
        }

        let send_ref = SendRef(self.next_ref);
        self.next_ref += 1;
        self.in_flight = Some(send_ref);

        debug!(%send_ref, "send in flight");

        Ok(OutboundMessage {
            send_ref,
            topic: self.config.topic.clone(),
            event: self.config.message_event.clone(),
            payload: json!({ "body": self.text }),
        })
    }

    /// Replace the composed text with `text` and send it.
    ///
    /// Rejected before touching the buffer if a send is outstanding.
    pub fn send_text(&mut self, text: impl Into<String>) -> Result<OutboundMessage, DispatchError> {
        if let Some(in_flight) = self.in_flight {
            return Err(DispatchError::SendInFlight { in_flight });
        }
        self.set_text(text);
        self.send()
    }

    /// Resolve the in-flight send with the transport's outcome.
    ///
    /// # Errors
    ///
    /// `UnknownSend` if `send_ref` is not the outstanding send. State is
    /// unchanged in that case, so a second callback for the same send has no
    /// effect.
    pub fn resolve(
        &mut self,
        send_ref: SendRef,
        outcome: Result<(), String>,
    ) -> Result<SendResolution, DispatchError> {
        if self.in_flight != Some(send_ref) {
            warn!(%send_ref, "ignoring callback for unknown send");
            return Err(DispatchError::UnknownSend { send_ref });
        }

        self.in_flight = None;

        match outcome {
            Ok(()) => {
                self.text.clear();
                debug!(%send_ref, "send acknowledged");
                Ok(SendResolution::Delivered { send_ref })
            },
            Err(reason) => {
                warn!(%send_ref, reason = %reason, "send failed");
                Ok(SendResolution::Failed { send_ref, reason })
            },
        }
    }

    /// Forget the outstanding send and the composed text.
    pub fn reset(&mut self) {
        self.in_flight = None;
        self.text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch() -> MessageDispatch {
        MessageDispatch::new(DispatchConfig::default())
    }

    #[test]
    fn can_send_requires_text_and_idle() {
        assert!(can_send("hi", false));
        assert!(!can_send("", false));
        assert!(!can_send("hi", true));
    }

    #[test]
    fn send_builds_outbound_message() {
        let mut dispatch = dispatch();
        let message = dispatch.send_text("hi").unwrap();

        assert_eq!(message.topic, "chat:lobby");
        assert_eq!(message.event, "new:msg");
        assert_eq!(message.payload, json!({ "body": "hi" }));
        assert_eq!(dispatch.in_flight(), Some(message.send_ref));
    }

    #[test]
    fn second_send_rejected_while_in_flight() {
        let mut dispatch = dispatch();
        let first = dispatch.send_text("hi").unwrap();

        let result = dispatch.send_text("there");

        assert_eq!(result, Err(DispatchError::SendInFlight { in_flight: first.send_ref }));
        assert_eq!(dispatch.text(), "hi");
        assert!(!dispatch.can_send());
    }

    #[test]
    fn success_clears_text() {
        let mut dispatch = dispatch();
        let message = dispatch.send_text("hi").unwrap();

        let resolution = dispatch.resolve(message.send_ref, Ok(())).unwrap();

        assert_eq!(resolution, SendResolution::Delivered { send_ref: message.send_ref });
        assert_eq!(dispatch.text(), "");
        assert!(!dispatch.is_in_flight());
    }

    #[test]
    fn failure_keeps_text_for_retry() {
        let mut dispatch = dispatch();
        let message = dispatch.send_text("hi").unwrap();

        let resolution = dispatch.resolve(message.send_ref, Err("timeout".into())).unwrap();

        assert!(matches!(resolution, SendResolution::Failed { .. }));
        assert_eq!(dispatch.text(), "hi");
        assert!(dispatch.can_send());
        insta::assert_snapshot!(
            resolution.into_result().unwrap_err().to_string(),
            @"send #1 failed: timeout"
        );
    }

    #[test]
    fn duplicate_callback_is_rejected() {
        let mut dispatch = dispatch();
        let message = dispatch.send_text("hi").unwrap();

        dispatch.resolve(message.send_ref, Err("timeout".into())).unwrap();
        let second = dispatch.resolve(message.send_ref, Ok(()));

        assert_eq!(second, Err(DispatchError::UnknownSend { send_ref: message.send_ref }));
        // the late success must not clear the text kept for retry
        assert_eq!(dispatch.text(), "hi");
    }

    #[test]
    fn empty_text_is_rejected() {
        let mut dispatch = dispatch();
        assert_eq!(dispatch.send(), Err(DispatchError::EmptyMessage));
        assert!(!dispatch.is_in_flight());
    }

    #[test]
    fn refs_are_fresh_per_send() {
        let mut dispatch = dispatch();
        let first = dispatch.send_text("a").unwrap();
        dispatch.resolve(first.send_ref, Ok(())).unwrap();
        let second = dispatch.send_text("b").unwrap();

        assert_ne!(first.send_ref, second.send_ref);
        assert_eq!((first.send_ref.value(), second.send_ref.value()), (1, 2));
        assert_eq!(
            dispatch.resolve(first.send_ref, Ok(())),
            Err(DispatchError::UnknownSend { send_ref: first.send_ref })
        );
    }

    #[test]
    fn callback_for_foreign_ref_changes_nothing() {
        let mut dispatch = dispatch();
        let message = dispatch.send_text("hi").unwrap();
        let foreign = SendRef::new(99);

        let result = dispatch.resolve(foreign, Ok(()));

        assert_eq!(result, Err(DispatchError::UnknownSend { send_ref: foreign }));
        assert_eq!(dispatch.in_flight(), Some(message.send_ref));
        assert_eq!(dispatch.text(), "hi");
    }
}
