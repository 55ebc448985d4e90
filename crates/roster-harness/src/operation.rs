//! Operations for model-based testing.
//!
//! Identities and devices are small integers folded into a tiny space so
//! that random sequences keep hitting the same users and devices.

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use roster_app::RoomEvent;
use roster_core::DeviceFingerprint;
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Model identity number.
pub type ModelIdentity = u8;

/// Model device number.
pub type ModelDevice = u8;

/// Number of distinct identities operations can name.
pub const IDENTITY_SPACE: u8 = 4;

/// Number of distinct devices operations can name.
pub const DEVICE_SPACE: u8 = 8;

/// One device record in a generated payload.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum ModelRecord {
    /// A well-formed record.
    Valid {
        /// Device number.
        device: ModelDevice,
        /// Session number, varied to exercise fingerprint-only equality.
        session: u8,
    },
    /// A record with an invalid device token.
    Malformed,
}

/// Presence entries by identity, as generated.
pub type ModelEntries = Vec<(ModelIdentity, Vec<ModelRecord>)>;

/// Operations applied to both the model and the real room.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Deliver a full presence state.
    FullState {
        /// Records by identity.
        entries: ModelEntries,
    },
    /// Deliver a presence diff.
    Diff {
        /// Joined records by identity.
        joins: ModelEntries,
        /// Left records by identity.
        leaves: ModelEntries,
    },
    /// Deliver a full state that is not an object.
    MalformedBatch,
    /// Drop the connection.
    ConnectionLost,
    /// Deliver a chat message.
    ChatMessage {
        /// Sender identity.
        sender: ModelIdentity,
        /// Body seed.
        body: u8,
    },
}

impl Operation {
    /// The room event carrying this operation.
    pub fn to_event(&self) -> RoomEvent {
        match self {
            Self::FullState { entries } => RoomEvent::PresenceState(presences_payload(entries)),
            Self::Diff { joins, leaves } => RoomEvent::PresenceDiff(json!({
                "joins": presences_payload(joins),
                "leaves": presences_payload(leaves),
            })),
            Self::MalformedBatch => RoomEvent::PresenceState(json!(["not", "a", "presence", "map"])),
            Self::ConnectionLost => RoomEvent::Disconnected,
            Self::ChatMessage { sender, body } => RoomEvent::Message {
                event: "new:msg".to_string(),
                payload: json!({ "user_id": identity_key(*sender), "body": body_text(*body) }),
            },
        }
    }
}

/// Identity key for a model identity.
pub fn identity_key(identity: ModelIdentity) -> String {
    format!("user-{}", identity % IDENTITY_SPACE)
}

/// Fingerprint for a model device.
pub fn model_fingerprint(device: ModelDevice) -> DeviceFingerprint {
    DeviceFingerprint::from_uuid(device_uuid(device))
}

/// Message body for a body seed.
pub fn body_text(body: u8) -> String {
    format!("message {body}")
}

/// Entries keyed by identity key. A later entry for the same key replaces an
/// earlier one, matching how a JSON object keeps the last duplicate key.
pub fn normalize(entries: &ModelEntries) -> BTreeMap<String, Vec<ModelRecord>> {
    let mut normalized = BTreeMap::new();
    for (identity, records) in entries {
        normalized.insert(identity_key(*identity), records.clone());
    }
    normalized
}

fn device_uuid(device: ModelDevice) -> Uuid {
    Uuid::from_u128(u128::from(device % DEVICE_SPACE) + 1)
}

fn record_payload(record: &ModelRecord) -> Value {
    match record {
        ModelRecord::Valid { device, session } => json!({
            "phx_ref": format!("ref-{session}"),
            "online_at": u64::from(*session) * 10,
            "device_token": device_uuid(*device).to_string(),
        }),
        ModelRecord::Malformed => json!({
            "phx_ref": "broken",
            "online_at": 0,
            "device_token": "not-a-uuid",
        }),
    }
}

fn presences_payload(entries: &ModelEntries) -> Value {
    let mut presences = Map::new();
    for (identity, records) in normalize(entries) {
        let metas: Vec<Value> = records.iter().map(record_payload).collect();
        presences.insert(identity, json!({ "metas": metas }));
    }
    Value::Object(presences)
}
