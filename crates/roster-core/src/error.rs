//! Error types for presence reconciliation and message dispatch.
//!
//! None of these errors are fatal. Each one describes a rejected input or
//! operation while the last-known-good membership view stays in place.

use thiserror::Error;

use crate::dispatch::SendRef;

/// A device fingerprint could not be constructed from external input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FingerprintError {
    /// The input is not a UUID.
    #[error("invalid device fingerprint {input:?}: {source}")]
    Invalid {
        /// The rejected input.
        input: String,
        /// Parser failure.
        source: uuid::Error,
    },
}

/// A single record in a batch failed to decode.
///
/// Recovered locally: the record is skipped and the rest of the batch is
/// applied.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Missing field or wrong field type.
    #[error("malformed record: {0}")]
    Shape(#[from] serde_json::Error),

    /// The device token is not a valid fingerprint.
    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),

    /// The join timestamp does not map to a point in time.
    #[error("invalid join timestamp {0}")]
    Timestamp(f64),
}

/// Presence reconciliation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceError {
    /// The payload as a whole is structurally invalid. State is unchanged.
    #[error("malformed presence batch: {reason}")]
    MalformedBatch {
        /// What was wrong with the payload.
        reason: String,
    },

    /// A diff arrived before any full state. The diff is discarded.
    #[error("presence diff received before initial presence state")]
    OutOfOrderDiff,
}

/// Outbound message dispatch errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Nothing to send.
    #[error("message is empty")]
    EmptyMessage,

    /// Another send has not been acknowledged yet.
    #[error("send {in_flight} is still in flight")]
    SendInFlight {
        /// The outstanding send.
        in_flight: SendRef,
    },

    /// The transport reported a failure. The composed text is kept for retry.
    #[error("send {send_ref} failed: {reason}")]
    SendFailed {
        /// The failed send.
        send_ref: SendRef,
        /// Failure reported by the transport.
        reason: String,
    },

    /// A callback referenced a send that is not in flight, either stale or
    /// already resolved.
    #[error("no in-flight send matches {send_ref}")]
    UnknownSend {
        /// The unmatched reference.
        send_ref: SendRef,
    },
}
