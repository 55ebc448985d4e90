//! Roster core logic
//!
//! Pure state machines that track which devices are present in a room, and
//! which user each device belongs to, from an eventually-consistent presence
//! feed. Nothing in this crate performs I/O.
//!
//! # Architecture
//!
//! The channel delivers an authoritative full state followed by incremental
//! diffs. The engine rebuilds the membership table from the full state and
//! applies each diff on top, joins before leaves. Devices are deduplicated
//! per identity by their fingerprint, so a device that rejoins under a new
//! session does not appear twice.
//!
//! State transitions return declarative actions rather than calling back
//! into the caller. Tables are immutable once published, so a snapshot
//! handed to a reader never changes underneath it.
//!
//! # Components
//!
//! - [`device`]: Device identity and fingerprint
//! - [`table`]: Membership table
//! - [`diff`]: Pure table transitions (snapshot, join, leave, diff)
//! - [`decode`]: Raw payload decoding with per-record failure isolation
//! - [`engine`]: Reconciliation state machine
//! - [`dispatch`]: Single-flight outbound message dispatch
//! - [`message`]: Chat message record and log
//! - [`error`]: Error types

pub mod decode;
pub mod device;
pub mod diff;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod message;
pub mod table;

pub use decode::{RawDiff, RawPresences};
pub use device::{DeviceFingerprint, DeviceIdentity};
pub use dispatch::{DispatchConfig, MessageDispatch, OutboundMessage, SendRef, SendResolution};
pub use engine::{EngineConfig, EngineState, PresenceAction, PresenceEngine, PresenceEvent};
pub use error::{DecodeError, DispatchError, FingerprintError, PresenceError};
pub use message::{ChatMessage, MessageLog};
pub use table::{DeviceSet, IdentityKey, MembershipTable};
